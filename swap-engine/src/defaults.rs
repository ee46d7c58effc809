//! Quote defaults cache

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use common::error::Result;
use common::model::QuoteDefaults;
use quote_store::SwapStore;

/// Fee and spread defaults loaded from the store
///
/// Read once per quote request and replaced only by [`DefaultsHandle::reload`].
pub struct DefaultsHandle {
    current: RwLock<QuoteDefaults>,
    store: Arc<dyn SwapStore>,
}

impl DefaultsHandle {
    /// Load the defaults from the store, seeding them if absent
    pub async fn load(store: Arc<dyn SwapStore>) -> Result<Self> {
        let defaults = store.load_defaults().await?;
        info!(fee = %defaults.fee, spread = %defaults.spread, "Quote defaults loaded");
        Ok(Self {
            current: RwLock::new(defaults),
            store,
        })
    }

    /// Defaults currently in effect
    pub async fn current(&self) -> QuoteDefaults {
        *self.current.read().await
    }

    /// Re-read the defaults from the store
    pub async fn reload(&self) -> Result<QuoteDefaults> {
        let defaults = self.store.load_defaults().await?;
        *self.current.write().await = defaults;
        info!(fee = %defaults.fee, spread = %defaults.spread, "Quote defaults reloaded");
        Ok(defaults)
    }
}
