//! End-to-end trading passes against the in-memory exchange.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;

use surge::config::StrategyConfig;
use surge::engine::cycle::{run_cycle, RunOutcome};
use surge::engine::executor::BuyOutcome;
use surge::engine::seller::SellOutcome;
use surge::error::SkipReason;
use surge::exchange::dry_run::DryRunExchange;
use surge::types::OrderSide;

use crate::mock_exchange::{product, MockExchange, STABLE_ACCOUNT};

fn strategy() -> StrategyConfig {
    StrategyConfig::default().without_delays()
}

fn mixed_catalog() -> Vec<surge::types::Product> {
    vec![
        product("SOL-USDC", dec!(100), "7.2"),
        product("BTC-USDC", dec!(60000), "2.9"),
        product("DOGE-USD", dec!(0.1), "50"),
        product("XRP-USDC", dec!(0.5), "n/a"),
        product("ETH-USDC", dec!(3000), "4.1"),
    ]
}

#[tokio::test]
async fn test_two_candidates_bought_and_queued_for_profit() {
    let exchange = MockExchange::new(mixed_catalog(), dec!(50));

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Executed);
    assert_eq!(report.candidates, 2);
    let plan = report.plan.as_ref().unwrap();
    assert_eq!(plan.funded_count, 2);
    assert_eq!(plan.spend_per_product, dec!(24.5));

    // One read for allocation, then one before each buy.
    assert_eq!(exchange.balance_reads(), 3);

    let buys = exchange.orders_on(OrderSide::Buy);
    assert_eq!(buys.len(), 2);
    assert_eq!(buys[0].product_id, "SOL-USDC");
    assert_eq!(buys[1].product_id, "ETH-USDC");
    assert!(buys.iter().all(|b| b.size == dec!(24.51)));

    let sells = exchange.orders_on(OrderSide::Sell);
    assert_eq!(sells.len(), 2);
    assert_eq!(sells[0].product_id, "SOL-USDC");
    assert_eq!(sells[0].limit_price, Some(dec!(106)));
    assert_eq!(sells[0].size, dec!(0.2451));
    assert_eq!(sells[1].product_id, "ETH-USDC");
    assert_eq!(sells[1].limit_price, Some(dec!(3180)));
    // 24.51 / 3000 = 0.00817 held, truncated to 4dp.
    assert_eq!(sells[1].size, dec!(0.0081));

    assert_eq!(exchange.balance_of("USDC"), dec!(0.98));
    assert_eq!(report.buys.sells_placed(), 2);
}

#[tokio::test]
async fn test_sell_size_never_exceeds_held_balance() {
    let catalog = vec![product("ETH-USDC", dec!(3000), "4.1")];
    let exchange = MockExchange::new(catalog, dec!(25));

    run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    let held = exchange.balance_of("ETH");
    assert_eq!(held, dec!(0.00817));
    let sells = exchange.orders_on(OrderSide::Sell);
    assert_eq!(sells.len(), 1);
    assert!(sells[0].size <= held, "sell {} exceeds held {}", sells[0].size, held);
    assert_eq!(sells[0].size, dec!(0.0081));
}

#[tokio::test]
async fn test_every_order_has_its_own_token() {
    let exchange = MockExchange::new(mixed_catalog(), dec!(50));
    run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    let orders = exchange.orders();
    assert_eq!(orders.len(), 4);
    let tokens: HashSet<&str> = orders.iter().map(|o| o.client_order_id.as_str()).collect();
    assert_eq!(tokens.len(), orders.len());
}

#[tokio::test]
async fn test_product_in_open_sell_is_not_bought_again() {
    let exchange = MockExchange::new(mixed_catalog(), dec!(50)).with_open_sells(&["SOL-USDC"]);

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(report.candidates, 1);
    let buys = exchange.orders_on(OrderSide::Buy);
    assert_eq!(buys.len(), 1);
    assert_eq!(buys[0].product_id, "ETH-USDC");
    // 50 * 0.98 + 0.01
    assert_eq!(buys[0].size, dec!(49.01));
}

#[tokio::test]
async fn test_small_balance_funds_fewer_products() {
    let catalog = vec![
        product("AAA-USDC", dec!(1), "5"),
        product("BBB-USDC", dec!(1), "5"),
        product("CCC-USDC", dec!(1), "5"),
        product("DDD-USDC", dec!(1), "5"),
    ];
    let exchange = MockExchange::new(catalog, dec!(3));

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    let plan = report.plan.as_ref().unwrap();
    assert_eq!(plan.funded_count, 2);
    assert_eq!(plan.spend_per_product, dec!(1.5));

    // The increment pushes the second order (1.51) past the remaining 1.49.
    assert_eq!(report.buys.outcomes.len(), 2);
    assert_eq!(report.buys.buys_placed(), 1);
    match &report.buys.outcomes[1] {
        BuyOutcome::Skipped { product_id, reason } => {
            assert_eq!(product_id, "BBB-USDC");
            assert_eq!(
                *reason,
                SkipReason::InsufficientBalance {
                    quote_size: dec!(1.51),
                    available: dec!(1.49),
                }
            );
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(exchange
        .orders()
        .iter()
        .all(|o| o.product_id != "CCC-USDC" && o.product_id != "DDD-USDC"));
}

#[tokio::test]
async fn test_nothing_qualifies() {
    let catalog = vec![
        product("BTC-USDC", dec!(60000), "1.2"),
        product("SOL-EUR", dec!(90), "12"),
    ];
    let exchange = MockExchange::new(catalog, dec!(50));

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoCandidates);
    assert_eq!(exchange.balance_reads(), 0);
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn test_insufficient_balance_places_nothing() {
    let exchange = MockExchange::new(mixed_catalog(), dec!(0.5));

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::InsufficientBalance);
    assert!(report.plan.is_none());
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn test_buy_error_ends_run_and_keeps_earlier_orders() {
    let exchange =
        MockExchange::new(mixed_catalog(), dec!(50)).failing_buy(2, "503 Service Unavailable");

    let err = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("503"));

    let orders = exchange.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_eq!(orders[1].side, OrderSide::Sell);
    assert_eq!(orders[1].product_id, "SOL-USDC");
}

#[tokio::test]
async fn test_sell_covers_pre_existing_holdings() {
    let catalog = vec![product("SOL-USDC", dec!(100), "7.2")];
    let exchange = MockExchange::new(catalog, dec!(50)).with_holding("SOL", dec!(1));

    run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    // 49.01 / 100 bought on top of the 1 SOL already held.
    let sells = exchange.orders_on(OrderSide::Sell);
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].size, dec!(1.4901));
}

#[tokio::test]
async fn test_missing_wallet_skips_sell_only() {
    let catalog = vec![product("SOL-USDC", dec!(100), "7.2")];
    let exchange = MockExchange::new(catalog, dec!(50)).without_fills();

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(exchange.orders_on(OrderSide::Buy).len(), 1);
    assert!(exchange.orders_on(OrderSide::Sell).is_empty());
    match &report.buys.outcomes[0] {
        BuyOutcome::Bought { sell: SellOutcome::Skipped(reason), .. } => {
            assert_eq!(*reason, SkipReason::MissingWallet { currency: "SOL".into() });
        }
        other => panic!("expected bought with skipped sell, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dry_run_submits_nothing() {
    let exchange = DryRunExchange::new(MockExchange::new(mixed_catalog(), dec!(50)));

    let report = run_cycle(&exchange, &strategy(), STABLE_ACCOUNT).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Executed);
    assert_eq!(report.buys.buys_placed(), 2);
    // No fills in a dry run, so there is nothing to sell.
    assert_eq!(report.buys.sells_placed(), 0);

    let inner = exchange.into_inner();
    assert!(inner.orders().is_empty());
    assert_eq!(inner.balance_of("USDC"), dec!(50));
    assert_eq!(inner.balance_of("SOL"), Decimal::ZERO);
}
