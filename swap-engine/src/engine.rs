//! Wiring of the quoting and execution services

use std::sync::Arc;

use common::error::Result;
use quote_store::SwapStore;
use venue_gateway::{MarketDataGateway, OrderGateway};

use crate::config::SwapEngineConfig;
use crate::defaults::DefaultsHandle;
use crate::execution::SwapExecutionService;
use crate::quote::SwapQuoteService;
use crate::routing::RoutingTable;

/// Quote and execution services sharing one store, routing table and defaults cache
#[derive(Clone)]
pub struct SwapEngine {
    pub quotes: Arc<SwapQuoteService>,
    pub executions: Arc<SwapExecutionService>,
    pub defaults: Arc<DefaultsHandle>,
}

impl SwapEngine {
    /// Build the services, loading quote defaults from the store
    pub async fn build(
        market_data: Arc<dyn MarketDataGateway>,
        orders: Arc<dyn OrderGateway>,
        store: Arc<dyn SwapStore>,
        routing: RoutingTable,
        config: SwapEngineConfig,
    ) -> Result<Self> {
        let routing = Arc::new(routing);
        let defaults = Arc::new(DefaultsHandle::load(store.clone()).await?);

        let quotes = SwapQuoteService::new(
            routing.clone(),
            market_data,
            store.clone(),
            defaults.clone(),
            config.clone(),
        );
        let executions = SwapExecutionService::new(routing, orders, store, config);

        Ok(Self {
            quotes: Arc::new(quotes),
            executions: Arc::new(executions),
            defaults,
        })
    }
}
