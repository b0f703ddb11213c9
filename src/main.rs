//! SURGE: single-pass spot momentum trader
//!
//! Entry point. Loads configuration and credentials, initialises
//! structured logging, runs one scan→allocate→buy→sell pass and exits.
//! Any exchange error propagates out of `main` and yields a non-zero exit.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use surge::config::AppConfig;
use surge::engine::cycle::{run_cycle, RunReport};
use surge::engine::executor::BuyOutcome;
use surge::engine::seller::SellOutcome;
use surge::exchange::coinbase::CoinbaseClient;
use surge::exchange::dry_run::DryRunExchange;
use surge::exchange::Exchange;
use surge::logging::init_logging;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;
    init_logging(&cfg.logging);
    if !Path::new(CONFIG_PATH).exists() {
        info!(path = CONFIG_PATH, "No config file found, using defaults");
    }

    let credentials = cfg.credentials()?;
    let stablecoin_account = cfg.stablecoin_account()?;

    info!(
        quote = %cfg.strategy.quote_currency,
        min_change_pct = %cfg.strategy.min_price_change_pct,
        target_profit_pct = %cfg.strategy.target_profit_pct,
        dry_run = cfg.strategy.dry_run,
        "SURGE starting up"
    );

    let client = CoinbaseClient::new(credentials, &cfg.exchange)?;
    let exchange: Box<dyn Exchange> = if cfg.strategy.dry_run {
        Box::new(DryRunExchange::new(client))
    } else {
        Box::new(client)
    };

    let report = run_cycle(exchange.as_ref(), &cfg.strategy, &stablecoin_account).await?;
    log_run_report(&report);

    Ok(())
}

/// Log a human-readable run summary.
fn log_run_report(report: &RunReport) {
    for outcome in &report.buys.outcomes {
        match outcome {
            BuyOutcome::Bought { product_id, quote_size, receipt, sell } => match sell {
                SellOutcome::Placed { quantity, limit_price, .. } => info!(
                    product_id = %product_id,
                    spent = %quote_size,
                    buy = %receipt,
                    %quantity,
                    %limit_price,
                    "Bought and queued take-profit"
                ),
                SellOutcome::Skipped(reason) => info!(
                    product_id = %product_id,
                    spent = %quote_size,
                    buy = %receipt,
                    sell_skipped = %reason,
                    "Bought without take-profit"
                ),
            },
            BuyOutcome::Skipped { product_id, reason } => info!(
                product_id = %product_id,
                buy_skipped = %reason,
                "Not bought"
            ),
        }
    }

    info!(
        outcome = %report.outcome,
        candidates = report.candidates,
        funded = report.plan.as_ref().map(|p| p.funded_count).unwrap_or(0),
        bought = report.buys.buys_placed(),
        skipped = report.buys.buys_skipped(),
        sells = report.buys.sells_placed(),
        spent = %report.buys.total_spent(),
        "Run complete"
    );
}
