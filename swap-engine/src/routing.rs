//! Pair allow-list and synthetic routing

use std::collections::BTreeMap;

use common::error::{Error, Result};
use common::model::Pair;

/// How a listed pair reaches the venue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapRoute {
    /// Traded on the venue under its own symbol
    Direct { pair: Pair },
    /// `BASE-Q` traded as `venue_symbol` (`BASE-X`) and converted through `bridge` (`Q-X`)
    Synthetic {
        pair: Pair,
        bridge: Pair,
        venue_symbol: Pair,
    },
}

impl SwapRoute {
    /// Pair as quoted to callers
    pub fn pair(&self) -> &Pair {
        match self {
            SwapRoute::Direct { pair } | SwapRoute::Synthetic { pair, .. } => pair,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, SwapRoute::Synthetic { .. })
    }
}

/// Allow-list of quotable pairs and their routes
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<Pair, SwapRoute>,
}

impl RoutingTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The pairs offered by default
    pub fn default_listing() -> Self {
        let mut table = Self::new();
        for (base, quote) in [
            ("BTC", "USDT"),
            ("ETH", "USDT"),
            ("USDC", "USDT"),
            ("AAVE", "USDT"),
            ("BTC", "USDC"),
        ] {
            table.add_direct(Pair::new(base, quote));
        }
        // venue only lists AAVE against USDT
        let aave_usdc = Pair::new("AAVE", "USDC");
        table.routes.insert(
            aave_usdc.clone(),
            SwapRoute::Synthetic {
                pair: aave_usdc,
                bridge: Pair::new("USDC", "USDT"),
                venue_symbol: Pair::new("AAVE", "USDT"),
            },
        );
        table
    }

    /// List a directly tradeable pair
    pub fn add_direct(&mut self, pair: Pair) {
        self.routes.insert(pair.clone(), SwapRoute::Direct { pair });
    }

    /// List a synthetic pair `BASE-Q` via bridge `Q-X` and venue symbol `BASE-X`
    pub fn add_synthetic(&mut self, pair: Pair, bridge: Pair, venue_symbol: Pair) -> Result<()> {
        if bridge.base != pair.quote || venue_symbol.base != pair.base || venue_symbol.quote != bridge.quote {
            return Err(Error::ConfigurationError(format!(
                "{} cannot be routed as {} through {}",
                pair, venue_symbol, bridge
            )));
        }
        self.routes.insert(
            pair.clone(),
            SwapRoute::Synthetic {
                pair,
                bridge,
                venue_symbol,
            },
        );
        Ok(())
    }

    /// Route of a listed pair
    pub fn resolve(&self, pair: &Pair) -> Result<&SwapRoute> {
        self.routes
            .get(pair)
            .ok_or_else(|| Error::ValidationError(format!("Pair {} is not offered", pair)))
    }

    /// Listed pairs in symbol order
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.routes.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listing() {
        let table = RoutingTable::default_listing();
        assert_eq!(table.pairs().count(), 6);

        let route = table.resolve(&Pair::new("AAVE", "USDC")).unwrap();
        assert_eq!(
            route,
            &SwapRoute::Synthetic {
                pair: Pair::new("AAVE", "USDC"),
                bridge: Pair::new("USDC", "USDT"),
                venue_symbol: Pair::new("AAVE", "USDT"),
            }
        );
        assert!(!table.resolve(&Pair::new("BTC", "USDC")).unwrap().is_synthetic());
    }

    #[test]
    fn test_unlisted_pair_is_a_validation_error() {
        let table = RoutingTable::default_listing();
        assert!(matches!(
            table.resolve(&Pair::new("DOGE", "USDT")),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn test_inconsistent_synthetic_route_rejected() {
        let mut table = RoutingTable::new();
        let result = table.add_synthetic(
            Pair::new("ETH", "USDC"),
            Pair::new("USDT", "USDC"),
            Pair::new("ETH", "USDT"),
        );
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
