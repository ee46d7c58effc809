//! PostgreSQL swap store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use common::db::{self, is_unique_violation};
use common::error::{Error, Result};
use common::model::{
    ExecutionLeg, ExecutionLog, LegState, MarketSnapshot, Pair, Quote, QuoteDefaults,
};

use crate::config::SwapStoreConfig;
use crate::repository::{ExecutionLogStore, QuoteStore};

const QUOTE_COLUMNS: &str = "id, pair, last_traded_price, spread, fee, spread_bid, spread_ask, \
     total_spread_bid, total_spread_ask, volume, trade_volume, fee_volume, expire_at, created_at";

const LOG_COLUMNS: &str = "swap_id, pair, venue_pair, side, order_id, order_price, filled_price, \
     volume, filled_volume, spread, fee, fee_volume, fee_price, status, bridge_rate, created_at, updated_at";

const LEG_COLUMNS: &str =
    "swap_id, sequence, pair, side, order_type, size, price, order_id, state, detail, recorded_at";

/// PostgreSQL store for quotes and execution records
pub struct PostgresSwapStore {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresSwapStore {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the given configuration
    pub async fn with_config(config: &SwapStoreConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);
        let pool = db::connect(&config.database_url, config.db_pool_size).await?;
        info!("Connected to PostgreSQL database");
        Ok(Self { pool })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        db::run_migrations(&self.pool).await
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn pair_column(row: &PgRow, column: &str) -> Result<Pair> {
    let raw: String = row.try_get(column)?;
    raw.parse()
}

fn quote_from_row(row: &PgRow) -> Result<Quote> {
    Ok(Quote {
        id: row.try_get("id")?,
        pair: pair_column(row, "pair")?,
        last_traded_price: row.try_get("last_traded_price")?,
        spread: row.try_get("spread")?,
        fee: row.try_get("fee")?,
        spread_bid: row.try_get("spread_bid")?,
        spread_ask: row.try_get("spread_ask")?,
        total_spread_bid: row.try_get("total_spread_bid")?,
        total_spread_ask: row.try_get("total_spread_ask")?,
        volume: row.try_get("volume")?,
        trade_volume: row.try_get("trade_volume")?,
        fee_volume: row.try_get("fee_volume")?,
        expire_at: row.try_get("expire_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn log_from_row(row: &PgRow) -> Result<ExecutionLog> {
    let side: String = row.try_get("side")?;
    let status: String = row.try_get("status")?;
    Ok(ExecutionLog {
        swap_id: row.try_get("swap_id")?,
        pair: pair_column(row, "pair")?,
        venue_pair: pair_column(row, "venue_pair")?,
        side: side.parse()?,
        order_id: row.try_get("order_id")?,
        order_price: row.try_get("order_price")?,
        filled_price: row.try_get("filled_price")?,
        volume: row.try_get("volume")?,
        filled_volume: row.try_get("filled_volume")?,
        spread: row.try_get("spread")?,
        fee: row.try_get("fee")?,
        fee_volume: row.try_get("fee_volume")?,
        fee_price: row.try_get("fee_price")?,
        status: status.parse()?,
        bridge_rate: row.try_get("bridge_rate")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn leg_from_row(row: &PgRow) -> Result<ExecutionLeg> {
    let sequence: i16 = row.try_get("sequence")?;
    let side: String = row.try_get("side")?;
    let order_type: String = row.try_get("order_type")?;
    let state: String = row.try_get("state")?;
    Ok(ExecutionLeg {
        swap_id: row.try_get("swap_id")?,
        sequence: u8::try_from(sequence)
            .map_err(|_| Error::Internal(format!("invalid leg sequence {}", sequence)))?,
        pair: pair_column(row, "pair")?,
        side: side.parse()?,
        order_type: order_type.parse()?,
        size: row.try_get("size")?,
        price: row.try_get("price")?,
        order_id: row.try_get("order_id")?,
        state: state.parse()?,
        detail: row.try_get("detail")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

#[async_trait]
impl QuoteStore for PostgresSwapStore {
    async fn create_quote(&self, quote: &Quote) -> Result<()> {
        debug!(quote_id = %quote.id, pair = %quote.pair, "Inserting quote");
        sqlx::query(
            "INSERT INTO swap_quotes (id, pair, last_traded_price, spread, fee, spread_bid, spread_ask,
                total_spread_bid, total_spread_ask, volume, trade_volume, fee_volume, expire_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(quote.id)
        .bind(quote.pair.symbol())
        .bind(quote.last_traded_price)
        .bind(quote.spread)
        .bind(quote.fee)
        .bind(quote.spread_bid)
        .bind(quote.spread_ask)
        .bind(quote.total_spread_bid)
        .bind(quote.total_spread_ask)
        .bind(quote.volume)
        .bind(quote.trade_volume)
        .bind(quote.fee_volume)
        .bind(quote.expire_at)
        .bind(quote.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_quote(&self, id: Uuid) -> Result<Option<Quote>> {
        let row = sqlx::query(&format!("SELECT {} FROM swap_quotes WHERE id = $1", QUOTE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(quote_from_row).transpose()
    }

    async fn save_snapshot(&self, snapshot: &MarketSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO market_snapshots (pair, last_traded_price, spread_bid, spread_ask, spread, taken_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(snapshot.pair.symbol())
        .bind(snapshot.last_traded_price)
        .bind(snapshot.spread_bid)
        .bind(snapshot.spread_ask)
        .bind(snapshot.spread)
        .bind(snapshot.taken_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_snapshot(&self, pair: &Pair) -> Result<Option<MarketSnapshot>> {
        let row = sqlx::query(
            "SELECT pair, last_traded_price, spread_bid, spread_ask, spread, taken_at
             FROM market_snapshots
             WHERE pair = $1
             ORDER BY taken_at DESC, id DESC
             LIMIT 1",
        )
        .bind(pair.symbol())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(MarketSnapshot {
                pair: pair_column(&row, "pair")?,
                last_traded_price: row.try_get("last_traded_price")?,
                spread_bid: row.try_get("spread_bid")?,
                spread_ask: row.try_get("spread_ask")?,
                spread: row.try_get("spread")?,
                taken_at: row.try_get("taken_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn load_defaults(&self) -> Result<QuoteDefaults> {
        let seed = QuoteDefaults::default();
        sqlx::query("INSERT INTO swap_config (id, fee, spread) VALUES (1, $1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(seed.fee)
            .bind(seed.spread)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT fee, spread FROM swap_config WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(QuoteDefaults {
            fee: row.try_get("fee")?,
            spread: row.try_get("spread")?,
        })
    }

    async fn save_defaults(&self, defaults: &QuoteDefaults) -> Result<()> {
        sqlx::query(
            "INSERT INTO swap_config (id, fee, spread, updated_at) VALUES (1, $1, $2, NOW())
             ON CONFLICT (id) DO UPDATE SET fee = $1, spread = $2, updated_at = NOW()",
        )
        .bind(defaults.fee)
        .bind(defaults.spread)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ExecutionLogStore for PostgresSwapStore {
    async fn insert_log(&self, log: &ExecutionLog) -> Result<()> {
        debug!(quote_id = %log.swap_id, order_id = %log.order_id, "Inserting execution log");
        let result = sqlx::query(
            "INSERT INTO execution_logs (swap_id, pair, venue_pair, side, order_id, order_price, filled_price,
                volume, filled_volume, spread, fee, fee_volume, fee_price, status, bridge_rate, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(log.swap_id)
        .bind(log.pair.symbol())
        .bind(log.venue_pair.symbol())
        .bind(log.side.as_str())
        .bind(&log.order_id)
        .bind(log.order_price)
        .bind(log.filled_price)
        .bind(log.volume)
        .bind(log.filled_volume)
        .bind(log.spread)
        .bind(log.fee)
        .bind(log.fee_volume)
        .bind(log.fee_price)
        .bind(log.status.as_str())
        .bind(log.bridge_rate)
        .bind(log.created_at)
        .bind(log.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyExecuted(log.swap_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_fill(&self, log: &ExecutionLog) -> Result<()> {
        let result = sqlx::query(
            "UPDATE execution_logs
             SET filled_price = $2, filled_volume = $3, status = $4, fee_price = $5, updated_at = $6
             WHERE swap_id = $1",
        )
        .bind(log.swap_id)
        .bind(log.filled_price)
        .bind(log.filled_volume)
        .bind(log.status.as_str())
        .bind(log.fee_price)
        .bind(log.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::OrderNotFound(log.order_id.clone()));
        }
        Ok(())
    }

    async fn get_by_swap_id(&self, swap_id: Uuid) -> Result<Option<ExecutionLog>> {
        let row = sqlx::query(&format!("SELECT {} FROM execution_logs WHERE swap_id = $1", LOG_COLUMNS))
            .bind(swap_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(log_from_row).transpose()
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<ExecutionLog>> {
        let row = sqlx::query(&format!("SELECT {} FROM execution_logs WHERE order_id = $1", LOG_COLUMNS))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(log_from_row).transpose()
    }

    async fn record_leg(&self, leg: &ExecutionLeg) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO execution_legs (swap_id, sequence, pair, side, order_type, size, price, order_id, state, detail, recorded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(leg.swap_id)
        .bind(i16::from(leg.sequence))
        .bind(leg.pair.symbol())
        .bind(leg.side.as_str())
        .bind(leg.order_type.as_str())
        .bind(leg.size)
        .bind(leg.price)
        .bind(&leg.order_id)
        .bind(leg.state.as_str())
        .bind(&leg.detail)
        .bind(leg.recorded_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyExecuted(format!(
                "{} leg {}",
                leg.swap_id, leg.sequence
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_leg_state(
        &self,
        swap_id: Uuid,
        sequence: u8,
        state: LegState,
        detail: Option<String>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE execution_legs
             SET state = $3, detail = COALESCE($4, detail), recorded_at = $5
             WHERE swap_id = $1 AND sequence = $2",
        )
        .bind(swap_id)
        .bind(i16::from(sequence))
        .bind(state.as_str())
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!("no leg {} for quote {}", sequence, swap_id)));
        }
        Ok(())
    }

    async fn legs_for(&self, swap_id: Uuid) -> Result<Vec<ExecutionLeg>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM execution_legs WHERE swap_id = $1 ORDER BY sequence",
            LEG_COLUMNS
        ))
        .bind(swap_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leg_from_row).collect()
    }

    async fn dangling_legs(&self) -> Result<Vec<ExecutionLeg>> {
        let rows = sqlx::query(
            "SELECT l.swap_id, l.sequence, l.pair, l.side, l.order_type, l.size, l.price, l.order_id,
                    l.state, l.detail, l.recorded_at
             FROM execution_legs l
             LEFT JOIN execution_logs e ON e.swap_id = l.swap_id
             WHERE e.swap_id IS NULL
             ORDER BY l.recorded_at, l.sequence",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(leg_from_row).collect()
    }
}
