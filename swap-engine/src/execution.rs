//! Quote execution against the venue
//!
//! A direct pair is executed with a single limit order. A synthetic pair
//! needs two sequential legs; every leg is recorded as soon as the venue
//! answers so a failed second leg leaves a dangling first leg on record
//! for operators. Legs are never unwound automatically.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use common::decimal::{Quantity, Rate};
use common::error::{Error, Result};
use common::model::{
    ExecutionLeg, ExecutionLog, ExecutionState, LegState, OrderFill, OrderRequest, OrderStatus,
    Pair, Quote, Side,
};
use quote_store::SwapStore;
use venue_gateway::OrderGateway;
#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::config::SwapEngineConfig;
use crate::routing::{RoutingTable, SwapRoute};

/// Outcome of a successful execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct ExecutionReceipt {
    /// Venue order whose fill is reported for the quote
    pub order_id: String,
}

/// Key for an execution status query
#[derive(Debug, Clone)]
pub enum StatusLookup {
    Quote(Uuid),
    Order(String),
}

/// Releases a per-quote execution claim when dropped
struct ClaimGuard<'a> {
    claims: &'a DashMap<Uuid, ()>,
    quote_id: Uuid,
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.claims.remove(&self.quote_id);
    }
}

/// The order whose fill is reported in the execution log
struct ReportedOrder {
    order_id: String,
    venue_pair: Pair,
    fill: OrderFill,
    bridge_rate: Option<Rate>,
}

/// Executes quotes and reconciles their fills
pub struct SwapExecutionService {
    routing: Arc<RoutingTable>,
    orders: Arc<dyn OrderGateway>,
    store: Arc<dyn SwapStore>,
    config: SwapEngineConfig,
    claims: DashMap<Uuid, ()>,
}

impl SwapExecutionService {
    pub fn new(
        routing: Arc<RoutingTable>,
        orders: Arc<dyn OrderGateway>,
        store: Arc<dyn SwapStore>,
        config: SwapEngineConfig,
    ) -> Self {
        Self {
            routing,
            orders,
            store,
            config,
            claims: DashMap::new(),
        }
    }

    /// Execute a quote on the given side
    #[instrument(skip(self), fields(quote_id = %quote_id, side = %side))]
    pub async fn execute_quote(&self, quote_id: Uuid, side: Side) -> Result<ExecutionReceipt> {
        let quote = self
            .store
            .get_quote(quote_id)
            .await?
            .ok_or_else(|| Error::QuoteNotFound(quote_id.to_string()))?;

        let _claim = self.claim(quote_id)?;
        if self.store.get_by_swap_id(quote_id).await?.is_some()
            || !self.store.legs_for(quote_id).await?.is_empty()
        {
            warn!("Execution refused, quote already executed");
            return Err(Error::AlreadyExecuted(quote_id.to_string()));
        }

        if quote.is_expired(Utc::now()) {
            warn!(expire_at = %quote.expire_at, "Execution refused, quote expired");
            return Err(Error::QuoteExpired(quote_id.to_string()));
        }

        let route = self.routing.resolve(&quote.pair)?.clone();
        let reported = match (&route, side) {
            (SwapRoute::Direct { pair }, _) => self.execute_direct(&quote, pair, side).await?,
            (SwapRoute::Synthetic { bridge, venue_symbol, .. }, Side::Buy) => {
                self.execute_synthetic_buy(&quote, bridge, venue_symbol).await?
            }
            (SwapRoute::Synthetic { bridge, venue_symbol, .. }, Side::Sell) => {
                self.execute_synthetic_sell(&quote, bridge, venue_symbol).await?
            }
        };

        let now = Utc::now();
        let mut log = ExecutionLog {
            swap_id: quote.id,
            pair: quote.pair.clone(),
            venue_pair: reported.venue_pair,
            side,
            order_id: reported.order_id.clone(),
            order_price: quote.unit_price(side),
            filled_price: Quantity::ZERO,
            volume: order_volume(&quote, side),
            filled_volume: Quantity::ZERO,
            spread: quote.spread,
            fee: quote.fee,
            fee_volume: match side {
                Side::Buy => quote.fee_volume,
                Side::Sell => Quantity::ZERO,
            },
            fee_price: Quantity::ZERO,
            status: reported.fill.status,
            bridge_rate: reported.bridge_rate,
            created_at: now,
            updated_at: now,
        };
        log.apply_fill(&reported.fill, now);

        self.store.insert_log(&log).await?;
        info!(
            order_id = %log.order_id,
            filled_price = %log.filled_price,
            filled_volume = %log.filled_volume,
            status = %log.status,
            "Execution completed"
        );

        Ok(ExecutionReceipt {
            order_id: reported.order_id,
        })
    }

    /// Current execution log, refreshed from the venue while its order is open
    #[instrument(skip(self))]
    pub async fn execution_status(&self, lookup: StatusLookup) -> Result<ExecutionLog> {
        let found = match &lookup {
            StatusLookup::Quote(quote_id) => {
                let log = self.store.get_by_swap_id(*quote_id).await?;
                if log.is_none() && self.store.get_quote(*quote_id).await?.is_none() {
                    return Err(Error::QuoteNotFound(quote_id.to_string()));
                }
                log
            }
            StatusLookup::Order(order_id) => self.store.get_by_order_id(order_id).await?,
        };

        let mut log = found.ok_or_else(|| {
            Error::OrderNotFound(match &lookup {
                StatusLookup::Quote(quote_id) => format!("no execution for quote {}", quote_id),
                StatusLookup::Order(order_id) => order_id.clone(),
            })
        })?;

        if log.needs_refresh() {
            debug!(order_id = %log.order_id, status = %log.status, "Refreshing open order");
            let fill = self.orders.get_order(&log.order_id, &log.venue_pair).await?;
            log.apply_fill(&fill, Utc::now());
            self.store.update_fill(&log).await?;
            if log.status.is_terminal() {
                self.settle_leg(&log).await?;
            }
        }

        Ok(log)
    }

    /// Move the still-placed leg behind a log's order to its final state
    async fn settle_leg(&self, log: &ExecutionLog) -> Result<()> {
        let legs = self.store.legs_for(log.swap_id).await?;
        let Some(leg) = legs.iter().find(|leg| {
            leg.state == LegState::Placed && leg.order_id.as_deref() == Some(log.order_id.as_str())
        }) else {
            return Ok(());
        };

        let (state, detail) = match log.status {
            OrderStatus::Canceled => (LegState::Rejected, Some("canceled by venue".to_string())),
            _ => (LegState::Filled, None),
        };
        debug!(quote_id = %log.swap_id, sequence = leg.sequence, state = ?state, "Settling leg");
        self.store
            .update_leg_state(log.swap_id, leg.sequence, state, detail)
            .await
    }

    /// Position of a quote in the execution state machine
    pub async fn execution_state(&self, quote_id: Uuid) -> Result<ExecutionState> {
        let quote = self
            .store
            .get_quote(quote_id)
            .await?
            .ok_or_else(|| Error::QuoteNotFound(quote_id.to_string()))?;

        if self.store.get_by_swap_id(quote_id).await?.is_some() {
            return Ok(ExecutionState::Completed);
        }
        if self.claims.contains_key(&quote_id) {
            return Ok(ExecutionState::Executing);
        }
        if !self.store.legs_for(quote_id).await?.is_empty() {
            return Ok(ExecutionState::Failed);
        }
        if quote.is_expired(Utc::now()) {
            return Ok(ExecutionState::Expired);
        }
        Ok(ExecutionState::Created)
    }

    /// Legs placed for quotes that never produced an execution log
    pub async fn dangling_legs(&self) -> Result<Vec<ExecutionLeg>> {
        self.store.dangling_legs().await
    }

    fn claim(&self, quote_id: Uuid) -> Result<ClaimGuard<'_>> {
        match self.claims.entry(quote_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                warn!(quote_id = %quote_id, "Execution refused, quote is being executed");
                Err(Error::AlreadyExecuted(quote_id.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                Ok(ClaimGuard {
                    claims: &self.claims,
                    quote_id,
                })
            }
        }
    }

    async fn execute_direct(&self, quote: &Quote, pair: &Pair, side: Side) -> Result<ReportedOrder> {
        let (asset, required) = match side {
            Side::Buy => (&pair.quote, quote.spread_bid * quote.trade_volume),
            Side::Sell => (&pair.base, quote.volume),
        };
        self.check_balance(asset, required).await?;

        let request = OrderRequest::limit(
            pair.clone(),
            side,
            order_volume(quote, side),
            quote.unit_price(side),
        );
        let placed = self.place_leg(quote.id, 1, &request).await?;

        let fill = self.orders.get_order(&placed, pair).await?;
        if fill.status == OrderStatus::Filled {
            self.store
                .update_leg_state(quote.id, 1, LegState::Filled, None)
                .await?;
        }

        Ok(ReportedOrder {
            order_id: placed,
            venue_pair: pair.clone(),
            fill,
            bridge_rate: None,
        })
    }

    /// Convert the quote asset through the bridge, then buy on the venue symbol
    async fn execute_synthetic_buy(&self, quote: &Quote, bridge: &Pair, venue_symbol: &Pair) -> Result<ReportedOrder> {
        let bridge_rate = self.bridge_rate(bridge).await?;
        let bridge_size = quote.spread_bid * quote.trade_volume;
        self.check_balance(&bridge.base, bridge_size).await?;

        let first = OrderRequest::market(bridge.clone(), Side::Sell, bridge_size);
        let first_id = self.place_leg(quote.id, 1, &first).await?;
        self.confirm_fill(quote.id, 1, &first_id, bridge).await?;

        let second = OrderRequest::limit(
            venue_symbol.clone(),
            Side::Buy,
            quote.trade_volume,
            quote.spread_bid * bridge_rate,
        );
        let second_id = self
            .place_dependent_leg(quote.id, &second, &first_id, bridge)
            .await?;

        let fill = self.orders.get_order(&second_id, venue_symbol).await?;
        if fill.status == OrderStatus::Filled {
            self.store
                .update_leg_state(quote.id, 2, LegState::Filled, None)
                .await?;
        }

        Ok(ReportedOrder {
            order_id: second_id,
            venue_pair: venue_symbol.clone(),
            fill,
            bridge_rate: Some(bridge_rate),
        })
    }

    /// Sell the base on the venue symbol, then buy back the quote asset through the bridge
    async fn execute_synthetic_sell(&self, quote: &Quote, bridge: &Pair, venue_symbol: &Pair) -> Result<ReportedOrder> {
        let bridge_rate = self.bridge_rate(bridge).await?;
        self.check_balance(&venue_symbol.base, quote.volume).await?;

        let first = OrderRequest::market(venue_symbol.clone(), Side::Sell, quote.volume);
        let first_id = self.place_leg(quote.id, 1, &first).await?;
        let fill = self.confirm_fill(quote.id, 1, &first_id, venue_symbol).await?;

        // market buys are sized in the bridge pair's quote asset
        let second = OrderRequest::market(bridge.clone(), Side::Buy, fill.proceeds());
        let second_id = self
            .place_dependent_leg(quote.id, &second, &first_id, venue_symbol)
            .await?;
        self.confirm_fill(quote.id, 2, &second_id, bridge)
            .await
            .map_err(|e| dangling_first_leg(quote.id, &first_id, venue_symbol, e))?;

        Ok(ReportedOrder {
            order_id: first_id,
            venue_pair: venue_symbol.clone(),
            fill,
            bridge_rate: Some(bridge_rate),
        })
    }

    /// Bridge rate recorded when the quote was priced
    async fn bridge_rate(&self, bridge: &Pair) -> Result<Rate> {
        let snapshot = self
            .store
            .latest_snapshot(bridge)
            .await?
            .ok_or_else(|| Error::Internal(format!("no market snapshot for bridge {}", bridge)))?;
        if snapshot.last_traded_price <= Rate::ZERO {
            return Err(Error::Internal(format!(
                "bridge {} snapshot has non-positive price",
                bridge
            )));
        }
        Ok(snapshot.last_traded_price)
    }

    async fn check_balance(&self, asset: &str, required: Quantity) -> Result<()> {
        let balance = self.orders.get_balance(asset).await?;
        if !balance.covers(required) {
            warn!(asset, available = %balance.available, required = %required, "Insufficient balance");
            return Err(Error::InsufficientBalance(format!(
                "{} available {}, required {}",
                asset, balance.available, required
            )));
        }
        Ok(())
    }

    /// Place an order and record it as a leg, returning the venue order id
    async fn place_leg(&self, quote_id: Uuid, sequence: u8, request: &OrderRequest) -> Result<String> {
        let mut leg = ExecutionLeg {
            swap_id: quote_id,
            sequence,
            pair: request.pair.clone(),
            side: request.side,
            order_type: request.order_type,
            size: request.size,
            price: request.price,
            order_id: None,
            state: LegState::Placed,
            detail: None,
            recorded_at: Utc::now(),
        };

        match self.orders.place_order(request).await {
            Ok(placed) => {
                info!(
                    quote_id = %quote_id,
                    sequence,
                    order_id = %placed.order_id,
                    pair = %request.pair,
                    "Leg placed"
                );
                leg.order_id = Some(placed.order_id.clone());
                self.store.record_leg(&leg).await?;
                Ok(placed.order_id)
            }
            Err(e) => {
                warn!(quote_id = %quote_id, sequence, error = %e, "Leg refused");
                if let Error::VenueRejected { order_id, .. } = &e {
                    if !order_id.is_empty() {
                        leg.order_id = Some(order_id.clone());
                    }
                }
                leg.state = LegState::Rejected;
                leg.detail = Some(e.to_string());
                self.store.record_leg(&leg).await?;
                Err(e)
            }
        }
    }

    /// Place leg 2; a refusal names the filled first leg left behind
    async fn place_dependent_leg(
        &self,
        quote_id: Uuid,
        request: &OrderRequest,
        first_order_id: &str,
        first_pair: &Pair,
    ) -> Result<String> {
        self.place_leg(quote_id, 2, request)
            .await
            .map_err(|e| dangling_first_leg(quote_id, first_order_id, first_pair, e))
    }

    /// Poll a leg until the venue reports it filled
    async fn confirm_fill(&self, quote_id: Uuid, sequence: u8, order_id: &str, pair: &Pair) -> Result<OrderFill> {
        for attempt in 0..self.config.fill_poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.fill_poll_interval).await;
            }
            let fill = self.orders.get_order(order_id, pair).await?;
            match fill.status {
                OrderStatus::Filled => {
                    self.store
                        .update_leg_state(quote_id, sequence, LegState::Filled, None)
                        .await?;
                    return Ok(fill);
                }
                OrderStatus::Canceled => {
                    return Err(self
                        .abandon_leg(quote_id, sequence, order_id, "canceled by venue")
                        .await);
                }
                OrderStatus::Live | OrderStatus::PartiallyFilled => {
                    debug!(order_id, attempt, status = %fill.status, "Leg not filled yet");
                }
            }
        }

        let reason = format!("not filled after {} checks", self.config.fill_poll_attempts);
        Err(self.abandon_leg(quote_id, sequence, order_id, &reason).await)
    }

    async fn abandon_leg(&self, quote_id: Uuid, sequence: u8, order_id: &str, reason: &str) -> Error {
        error!(quote_id = %quote_id, sequence, order_id, reason, "Leg incomplete");
        if let Err(e) = self
            .store
            .update_leg_state(quote_id, sequence, LegState::Rejected, Some(reason.to_string()))
            .await
        {
            return e;
        }
        Error::LegIncomplete(format!("leg {} order {} {}", sequence, order_id, reason))
    }
}

/// Name the filled first leg left behind by a failed second leg
fn dangling_first_leg(quote_id: Uuid, first_order_id: &str, first_pair: &Pair, e: Error) -> Error {
    let notice = format!(
        "leg 1 order {} on {} is filled and was not reversed",
        first_order_id, first_pair
    );
    error!(quote_id = %quote_id, order_id = %first_order_id, "Dangling leg: {}", notice);
    match e {
        Error::VenueRejected { code, message, s_code, s_msg, order_id } => Error::VenueRejected {
            code,
            message: format!("{}; {}", message, notice),
            s_code,
            s_msg,
            order_id,
        },
        Error::GatewayUnavailable(msg) => Error::GatewayUnavailable(format!("{}; {}", msg, notice)),
        Error::LegIncomplete(msg) => Error::LegIncomplete(format!("{}; {}", msg, notice)),
        other => other,
    }
}

/// Base volume ordered for a side: net of fee for buys, as quoted for sells
fn order_volume(quote: &Quote, side: Side) -> Quantity {
    match side {
        Side::Buy => quote.trade_volume,
        Side::Sell => quote.volume,
    }
}
