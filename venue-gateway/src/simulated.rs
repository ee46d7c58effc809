//! In-process simulated venue
//!
//! Prices and balances are set by the caller. Orders fill immediately at the
//! limit price (or the current price for market orders) unless the venue is in
//! [`FillMode::Deferred`], in which case they stay `live` until
//! [`SimulatedVenue::fill_order`] or [`SimulatedVenue::set_order_state`] is called.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use common::decimal::{Price, Quantity};
use common::error::{Error, Result};
use common::model::{
    Balance, OrderFill, OrderRequest, OrderStatus, OrderType, Pair, PlacedOrder, Side, Ticker,
};

use crate::gateway::{MarketDataGateway, OrderGateway};

/// How placed orders are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Orders are filled in full as soon as they are placed
    Immediate,
    /// Orders rest as `live` until filled explicitly
    Deferred,
}

#[derive(Debug, Clone)]
struct SimulatedOrder {
    sequence: u64,
    request: OrderRequest,
    fill: OrderFill,
}

/// Simulated spot venue
#[derive(Debug)]
pub struct SimulatedVenue {
    prices: DashMap<Pair, Price>,
    balances: DashMap<String, Quantity>,
    orders: DashMap<String, SimulatedOrder>,
    /// Placement attempt number -> (sCode, sMsg) to refuse it with
    rejections: DashMap<u64, (String, String)>,
    /// Placement attempt number -> fill to report instead of executing
    scripted: DashMap<u64, OrderFill>,
    attempts: AtomicU64,
    deferred: AtomicBool,
    unavailable: AtomicBool,
}

impl Default for SimulatedVenue {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVenue {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
            balances: DashMap::new(),
            orders: DashMap::new(),
            rejections: DashMap::new(),
            scripted: DashMap::new(),
            attempts: AtomicU64::new(0),
            deferred: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
        }
    }

    /// A venue listing the default instruments with demo prices and balances
    pub fn with_demo_market() -> Self {
        let venue = Self::new();
        venue.set_price(Pair::new("BTC", "USDT"), Decimal::new(27_000, 0));
        venue.set_price(Pair::new("ETH", "USDT"), Decimal::new(1_650, 0));
        venue.set_price(Pair::new("USDC", "USDT"), Decimal::new(1_0001, 4));
        venue.set_price(Pair::new("AAVE", "USDT"), Decimal::new(60, 0));
        venue.set_price(Pair::new("BTC", "USDC"), Decimal::new(27_000, 0));
        for (asset, amount) in [("BTC", 10), ("ETH", 100), ("AAVE", 1_000), ("USDT", 1_000_000), ("USDC", 1_000_000)] {
            venue.set_balance(asset, Decimal::from(amount));
        }
        venue
    }

    /// Set the last traded price of an instrument, listing it if needed
    pub fn set_price(&self, pair: Pair, price: Price) {
        self.prices.insert(pair, price);
    }

    /// Delist an instrument
    pub fn remove_price(&self, pair: &Pair) {
        self.prices.remove(pair);
    }

    /// Set the available balance of an asset
    pub fn set_balance(&self, asset: &str, amount: Quantity) {
        self.balances.insert(asset.to_string(), amount);
    }

    pub fn set_fill_mode(&self, mode: FillMode) {
        self.deferred.store(mode == FillMode::Deferred, Ordering::SeqCst);
    }

    /// Make every call fail as a transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Refuse the `attempt`-th placement (1-based, counted across all pairs)
    pub fn reject_order_attempt(&self, attempt: u64, s_code: &str, s_msg: &str) {
        self.rejections.insert(attempt, (s_code.to_string(), s_msg.to_string()));
    }

    /// Accept the `attempt`-th placement but report `fill` for it without settling balances
    pub fn script_order_attempt(&self, attempt: u64, fill: OrderFill) {
        self.scripted.insert(attempt, fill);
    }

    /// Number of placement attempts seen, including refused ones
    pub fn placement_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Accepted orders in placement order
    pub fn placed_orders(&self) -> Vec<OrderRequest> {
        let mut orders: Vec<_> = self
            .orders
            .iter()
            .map(|entry| (entry.sequence, entry.request.clone()))
            .collect();
        orders.sort_by_key(|(sequence, _)| *sequence);
        orders.into_iter().map(|(_, request)| request).collect()
    }

    /// Overwrite the reported fill of an order
    pub fn set_order_state(&self, order_id: &str, fill: OrderFill) -> Result<()> {
        let mut order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;
        order.fill = fill;
        Ok(())
    }

    /// Fill a resting order in full and settle balances
    pub fn fill_order(&self, order_id: &str) -> Result<OrderFill> {
        let request = self
            .orders
            .get(order_id)
            .map(|order| order.request.clone())
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;

        let fill = self.execute(&request)?;
        self.set_order_state(order_id, fill.clone())?;
        Ok(fill)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::GatewayUnavailable("simulated venue offline".to_string()));
        }
        Ok(())
    }

    fn price_of(&self, pair: &Pair) -> Result<Price> {
        self.prices
            .get(pair)
            .map(|p| *p)
            .ok_or_else(|| Error::PairNotListed(pair.symbol()))
    }

    /// Compute a full fill for the request and move balances accordingly
    fn execute(&self, request: &OrderRequest) -> Result<OrderFill> {
        let price = match (request.order_type, request.price) {
            (OrderType::Limit, Some(price)) => price,
            _ => self.price_of(&request.pair)?,
        };

        // market buys are sized in the quote asset
        let base_volume = match (request.order_type, request.side) {
            (OrderType::Market, Side::Buy) if !price.is_zero() => request.size / price,
            _ => request.size,
        };
        let quote_amount = base_volume * price;

        match request.side {
            Side::Buy => {
                self.adjust(&request.pair.base, base_volume);
                self.adjust(&request.pair.quote, -quote_amount);
            }
            Side::Sell => {
                self.adjust(&request.pair.base, -base_volume);
                self.adjust(&request.pair.quote, quote_amount);
            }
        }

        Ok(OrderFill {
            filled_price: price,
            filled_volume: base_volume,
            status: OrderStatus::Filled,
            avg_price: price,
            accumulated_fill_size: base_volume,
        })
    }

    fn adjust(&self, asset: &str, delta: Quantity) {
        *self.balances.entry(asset.to_string()).or_insert(Decimal::ZERO) += delta;
    }
}

#[async_trait]
impl MarketDataGateway for SimulatedVenue {
    async fn get_ticker(&self, pair: &Pair) -> Result<Ticker> {
        self.check_available()?;
        Ok(Ticker {
            pair: pair.clone(),
            last_price: self.price_of(pair)?,
        })
    }
}

#[async_trait]
impl OrderGateway for SimulatedVenue {
    async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        self.check_available()?;
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some((_, (s_code, s_msg))) = self.rejections.remove(&attempt) {
            return Err(Error::VenueRejected {
                code: "1".to_string(),
                message: "Operation failed.".to_string(),
                s_code,
                s_msg,
                order_id: String::new(),
            });
        }
        self.price_of(&request.pair)?;

        let order_id = format!("sim-{}", attempt);
        let fill = if let Some((_, fill)) = self.scripted.remove(&attempt) {
            fill
        } else if self.deferred.load(Ordering::SeqCst) {
            OrderFill {
                filled_price: Decimal::ZERO,
                filled_volume: Decimal::ZERO,
                status: OrderStatus::Live,
                avg_price: Decimal::ZERO,
                accumulated_fill_size: Decimal::ZERO,
            }
        } else {
            self.execute(request)?
        };

        debug!(order_id = %order_id, pair = %request.pair, side = %request.side, "Simulated order placed");
        self.orders.insert(
            order_id.clone(),
            SimulatedOrder {
                sequence: attempt,
                request: request.clone(),
                fill,
            },
        );

        Ok(PlacedOrder { order_id })
    }

    async fn get_order(&self, order_id: &str, _pair: &Pair) -> Result<OrderFill> {
        self.check_available()?;
        self.orders
            .get(order_id)
            .map(|order| order.fill.clone())
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))
    }

    async fn get_balance(&self, asset: &str) -> Result<Balance> {
        self.check_available()?;
        let available = self.balances.get(asset).map(|b| *b).unwrap_or(Decimal::ZERO);
        Ok(Balance::new(asset, available))
    }
}
