//! Persistence for quotes, market snapshots and execution records

pub mod config;
pub mod memory;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use common::error::Result;
use tracing::info;

pub use config::SwapStoreConfig;
pub use memory::InMemorySwapStore;
pub use postgres::PostgresSwapStore;
pub use repository::{ExecutionLogStore, QuoteStore, SwapStore};

/// Store backend selection
pub enum StoreType {
    /// In-memory store
    InMemory,
    /// PostgreSQL store
    Postgres(SwapStoreConfig),
}

/// Open a store, running migrations for PostgreSQL
pub async fn open_store(store_type: StoreType) -> Result<Arc<dyn SwapStore>> {
    match store_type {
        StoreType::InMemory => {
            info!("Using in-memory swap store");
            Ok(Arc::new(InMemorySwapStore::new()))
        }
        StoreType::Postgres(config) => {
            let store = PostgresSwapStore::with_config(&config).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}
