// PostgreSQL store tests, enabled with the db_tests feature

#[cfg(feature = "db_tests")]
mod db_persistence_tests {
    use std::env;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use common::error::Error;
    use common::model::{ExecutionLeg, LegState, OrderType, Pair, Side};
    use quote_store::{ExecutionLogStore, PostgresSwapStore, QuoteStore};
    use rust_decimal_macros::dec;
    use sqlx::postgres::PgPoolOptions;
    use swap_engine::{QuoteRequest, RoutingTable, SwapEngine, SwapEngineConfig};
    use tokio::runtime::Runtime;
    use venue_gateway::SimulatedVenue;

    // Helper function to run async tests
    fn run_db_test<F>(test: F)
    where
        F: FnOnce(Arc<PostgresSwapStore>) -> futures::future::BoxFuture<'static, ()> + Send + 'static,
    {
        // Skip test if TEST_DATABASE_URL is not set
        let db_url = match env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping database test: TEST_DATABASE_URL not set");
                return;
            }
        };

        let rt = Runtime::new().unwrap();

        rt.block_on(async {
            let pool = match PgPoolOptions::new()
                .max_connections(5)
                .connect(&db_url)
                .await
            {
                Ok(pool) => pool,
                Err(err) => {
                    println!("Skipping database test: could not connect to database: {}", err);
                    return;
                }
            };

            let store = PostgresSwapStore::new(pool);
            store.migrate().await.expect("Failed to run migrations");

            test(Arc::new(store)).await;
        });
    }

    async fn engine_over(store: Arc<PostgresSwapStore>) -> (Arc<SimulatedVenue>, SwapEngine) {
        let venue = Arc::new(SimulatedVenue::with_demo_market());
        let engine = SwapEngine::build(
            venue.clone(),
            venue.clone(),
            store,
            RoutingTable::default_listing(),
            SwapEngineConfig::new(60, 3, Duration::from_millis(1)),
        )
        .await
        .expect("Failed to build engine");
        (venue, engine)
    }

    fn request(pair: &str) -> QuoteRequest {
        QuoteRequest {
            pair: pair.to_string(),
            volume: dec!(0.5),
            spread: Some(dec!(0.002)),
            fee: Some(dec!(0.1)),
        }
    }

    #[test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test --features db_tests -- --ignored"]
    fn test_quote_round_trip() {
        run_db_test(|store| {
            Box::pin(async move {
                let (_, engine) = engine_over(store.clone()).await;
                let created = engine.quotes.create_quote(request("ETH-USDT")).await.unwrap();

                let stored = store.get_quote(created.id).await.unwrap().unwrap();
                assert_eq!(stored.pair, Pair::new("ETH", "USDT"));
                assert_eq!(stored.volume, dec!(0.5));
                assert_eq!(stored.spread_bid, created.buy.max_unit_price);
                assert_eq!(stored.expire_at.timestamp(), created.expire_at.timestamp());

                let snapshot = store
                    .latest_snapshot(&Pair::new("ETH", "USDT"))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(snapshot.last_traded_price, created.last_traded_price);
            })
        });
    }

    #[test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test --features db_tests -- --ignored"]
    fn test_execution_log_is_unique_per_quote() {
        run_db_test(|store| {
            Box::pin(async move {
                let (_, engine) = engine_over(store.clone()).await;
                let quote = engine.quotes.create_quote(request("BTC-USDT")).await.unwrap();
                let receipt = engine
                    .executions
                    .execute_quote(quote.id, Side::Sell)
                    .await
                    .unwrap();

                let log = store.get_by_swap_id(quote.id).await.unwrap().unwrap();
                assert_eq!(log.order_id, receipt.order_id);
                assert_eq!(
                    store.get_by_order_id(&receipt.order_id).await.unwrap(),
                    Some(log.clone())
                );

                let duplicate = store.insert_log(&log).await;
                assert!(matches!(duplicate, Err(Error::AlreadyExecuted(_))));
            })
        });
    }

    #[test]
    #[ignore = "Requires test database, run with RUST_TEST_THREADS=1 cargo test --features db_tests -- --ignored"]
    fn test_dangling_leg_reported_until_logged() {
        run_db_test(|store| {
            Box::pin(async move {
                let (_, engine) = engine_over(store.clone()).await;
                let quote = engine.quotes.create_quote(request("BTC-USDT")).await.unwrap();

                let leg = ExecutionLeg {
                    swap_id: quote.id,
                    sequence: 1,
                    pair: Pair::new("BTC", "USDT"),
                    side: Side::Sell,
                    order_type: OrderType::Market,
                    size: dec!(0.5),
                    price: None,
                    order_id: Some("sim-db-1".to_string()),
                    state: LegState::Placed,
                    detail: None,
                    recorded_at: Utc::now(),
                };
                store.record_leg(&leg).await.unwrap();
                assert!(matches!(
                    store.record_leg(&leg).await,
                    Err(Error::AlreadyExecuted(_))
                ));

                store
                    .update_leg_state(quote.id, 1, LegState::Filled, None)
                    .await
                    .unwrap();

                let legs = store.legs_for(quote.id).await.unwrap();
                assert_eq!(legs.len(), 1);
                assert_eq!(legs[0].state, LegState::Filled);

                let dangling = store.dangling_legs().await.unwrap();
                assert!(dangling.iter().any(|l| l.swap_id == quote.id));
            })
        });
    }
}
