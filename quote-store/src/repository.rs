//! Store contracts

use async_trait::async_trait;
use uuid::Uuid;

use common::error::Result;
use common::model::{
    ExecutionLeg, ExecutionLog, LegState, MarketSnapshot, Pair, Quote, QuoteDefaults,
};

/// Quotes, market snapshots and quote defaults
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist a newly created quote
    async fn create_quote(&self, quote: &Quote) -> Result<()>;

    /// Get a quote by id
    async fn get_quote(&self, id: Uuid) -> Result<Option<Quote>>;

    /// Record the prices computed for a pair
    async fn save_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()>;

    /// Most recent snapshot of a pair
    async fn latest_snapshot(&self, pair: &Pair) -> Result<Option<MarketSnapshot>>;

    /// Current quote defaults, seeding them when none are stored
    async fn load_defaults(&self) -> Result<QuoteDefaults>;

    /// Replace the quote defaults
    async fn save_defaults(&self, defaults: &QuoteDefaults) -> Result<()>;
}

/// Execution logs and the legs placed to produce them
#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    /// Insert the log of a quote; a second log for the same quote fails with `AlreadyExecuted`
    async fn insert_log(&self, log: &ExecutionLog) -> Result<()>;

    /// Persist refreshed fill fields (price, volume, status, fee price, update time)
    async fn update_fill(&self, log: &ExecutionLog) -> Result<()>;

    /// Get the log of a quote
    async fn get_by_swap_id(&self, swap_id: Uuid) -> Result<Option<ExecutionLog>>;

    /// Get the log reporting a venue order
    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<ExecutionLog>>;

    /// Record a leg; a second leg with the same sequence fails with `AlreadyExecuted`
    async fn record_leg(&self, leg: &ExecutionLeg) -> Result<()>;

    /// Move a leg to a new state
    async fn update_leg_state(
        &self,
        swap_id: Uuid,
        sequence: u8,
        state: LegState,
        detail: Option<String>,
    ) -> Result<()>;

    /// Legs of a quote ordered by sequence
    async fn legs_for(&self, swap_id: Uuid) -> Result<Vec<ExecutionLeg>>;

    /// Legs whose quote has no execution log
    async fn dangling_legs(&self) -> Result<Vec<ExecutionLeg>>;
}

/// A store implementing both contracts
pub trait SwapStore: QuoteStore + ExecutionLogStore {}

impl<T: QuoteStore + ExecutionLogStore> SwapStore for T {}
