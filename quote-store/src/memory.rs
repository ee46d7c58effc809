//! In-memory swap store

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use common::error::{Error, Result};
use common::model::{
    ExecutionLeg, ExecutionLog, LegState, MarketSnapshot, Pair, Quote, QuoteDefaults,
};

use crate::repository::{ExecutionLogStore, QuoteStore};

/// In-memory store for quotes and execution records
pub struct InMemorySwapStore {
    /// Quotes by id
    pub quotes: DashMap<Uuid, Quote>,
    /// Snapshots by pair, oldest first
    pub snapshots: DashMap<Pair, Vec<MarketSnapshot>>,
    /// Execution logs by quote id
    pub logs: DashMap<Uuid, ExecutionLog>,
    /// Legs by quote id and sequence
    pub legs: DashMap<(Uuid, u8), ExecutionLeg>,
    defaults: RwLock<Option<QuoteDefaults>>,
}

impl Default for InMemorySwapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySwapStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            quotes: DashMap::new(),
            snapshots: DashMap::new(),
            logs: DashMap::new(),
            legs: DashMap::new(),
            defaults: RwLock::new(None),
        }
    }

    fn ensure_quote(&self, swap_id: Uuid) -> Result<()> {
        if self.quotes.contains_key(&swap_id) {
            Ok(())
        } else {
            Err(Error::QuoteNotFound(swap_id.to_string()))
        }
    }
}

#[async_trait]
impl QuoteStore for InMemorySwapStore {
    async fn create_quote(&self, quote: &Quote) -> Result<()> {
        self.quotes.insert(quote.id, quote.clone());
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> Result<Option<Quote>> {
        Ok(self.quotes.get(&id).map(|q| q.clone()))
    }

    async fn save_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()> {
        self.snapshots
            .entry(snapshot.pair.clone())
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn latest_snapshot(&self, pair: &Pair) -> Result<Option<MarketSnapshot>> {
        Ok(self
            .snapshots
            .get(pair)
            .and_then(|history| history.last().cloned()))
    }

    async fn load_defaults(&self) -> Result<QuoteDefaults> {
        let mut defaults = self.defaults.write().await;
        Ok(*defaults.get_or_insert_with(QuoteDefaults::default))
    }

    async fn save_defaults(&self, defaults: &QuoteDefaults) -> Result<()> {
        *self.defaults.write().await = Some(*defaults);
        Ok(())
    }
}

#[async_trait]
impl ExecutionLogStore for InMemorySwapStore {
    async fn insert_log(&self, log: &ExecutionLog) -> Result<()> {
        self.ensure_quote(log.swap_id)?;
        match self.logs.entry(log.swap_id) {
            Entry::Occupied(_) => Err(Error::AlreadyExecuted(log.swap_id.to_string())),
            Entry::Vacant(slot) => {
                debug!(quote_id = %log.swap_id, order_id = %log.order_id, "Execution log inserted");
                slot.insert(log.clone());
                Ok(())
            }
        }
    }

    async fn update_fill(&self, log: &ExecutionLog) -> Result<()> {
        let mut stored = self
            .logs
            .get_mut(&log.swap_id)
            .ok_or_else(|| Error::OrderNotFound(log.order_id.clone()))?;
        stored.filled_price = log.filled_price;
        stored.filled_volume = log.filled_volume;
        stored.status = log.status;
        stored.fee_price = log.fee_price;
        stored.updated_at = log.updated_at;
        Ok(())
    }

    async fn get_by_swap_id(&self, swap_id: Uuid) -> Result<Option<ExecutionLog>> {
        Ok(self.logs.get(&swap_id).map(|l| l.clone()))
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<ExecutionLog>> {
        Ok(self
            .logs
            .iter()
            .find(|entry| entry.order_id == order_id)
            .map(|entry| entry.value().clone()))
    }

    async fn record_leg(&self, leg: &ExecutionLeg) -> Result<()> {
        self.ensure_quote(leg.swap_id)?;
        match self.legs.entry((leg.swap_id, leg.sequence)) {
            Entry::Occupied(_) => Err(Error::AlreadyExecuted(format!(
                "{} leg {}",
                leg.swap_id, leg.sequence
            ))),
            Entry::Vacant(slot) => {
                slot.insert(leg.clone());
                Ok(())
            }
        }
    }

    async fn update_leg_state(
        &self,
        swap_id: Uuid,
        sequence: u8,
        state: LegState,
        detail: Option<String>,
    ) -> Result<()> {
        let mut leg = self
            .legs
            .get_mut(&(swap_id, sequence))
            .ok_or_else(|| Error::Internal(format!("no leg {} for quote {}", sequence, swap_id)))?;
        leg.state = state;
        if detail.is_some() {
            leg.detail = detail;
        }
        leg.recorded_at = Utc::now();
        Ok(())
    }

    async fn legs_for(&self, swap_id: Uuid) -> Result<Vec<ExecutionLeg>> {
        let mut legs: Vec<ExecutionLeg> = self
            .legs
            .iter()
            .filter(|entry| entry.key().0 == swap_id)
            .map(|entry| entry.value().clone())
            .collect();
        legs.sort_by_key(|leg| leg.sequence);
        Ok(legs)
    }

    async fn dangling_legs(&self) -> Result<Vec<ExecutionLeg>> {
        let mut legs: Vec<ExecutionLeg> = self
            .legs
            .iter()
            .filter(|entry| !self.logs.contains_key(&entry.key().0))
            .map(|entry| entry.value().clone())
            .collect();
        legs.sort_by(|a, b| {
            a.recorded_at
                .cmp(&b.recorded_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_seeded_once() {
        let store = InMemorySwapStore::new();
        assert_eq!(store.load_defaults().await.unwrap(), QuoteDefaults::default());

        let custom = QuoteDefaults {
            fee: rust_decimal_macros::dec!(0.01),
            spread: rust_decimal_macros::dec!(0.02),
        };
        store.save_defaults(&custom).await.unwrap();
        assert_eq!(store.load_defaults().await.unwrap(), custom);
    }
}
