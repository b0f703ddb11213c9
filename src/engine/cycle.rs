//! One allocate → buy → sell pass.
//!
//! Scan the catalog, size the spend, buy the funded candidates and queue
//! their take-profit sells. The pass ends cleanly when nothing qualifies
//! or the balance cannot fund a viable order.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use tracing::info;

use super::allocator::{allocate, AllocationPolicy};
use super::executor::{BuyExecutor, BuyPolicy, BuyReport};
use super::scanner::{select_candidates, selling_set, ScanCriteria};
use super::seller::{SellPlanner, SellPolicy};
use crate::config::StrategyConfig;
use crate::exchange::Exchange;
use crate::types::AllocationPlan;

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// How a pass ended. Every variant is a normal completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No product met the buying criteria.
    NoCandidates,
    /// The balance could not fund a single product.
    InsufficientBalance,
    /// Buys were attempted for the funded candidates.
    Executed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NoCandidates => write!(f, "no action"),
            RunOutcome::InsufficientBalance => write!(f, "insufficient balance"),
            RunOutcome::Executed => write!(f, "executed"),
        }
    }
}

/// Summary of a complete pass.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub open_sell_orders: usize,
    pub catalog_size: usize,
    pub candidates: usize,
    pub balance: Option<Decimal>,
    pub plan: Option<AllocationPlan>,
    pub buys: BuyReport,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            open_sell_orders: 0,
            catalog_size: 0,
            candidates: 0,
            balance: None,
            plan: None,
            buys: BuyReport::default(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Run a single scan → allocate → buy → sell pass.
pub async fn run_cycle(
    exchange: &dyn Exchange,
    strategy: &StrategyConfig,
    stablecoin_account: &str,
) -> Result<RunReport> {
    info!(exchange = exchange.name(), "Starting trading pass");

    // 1. Products already being sold are off limits
    let open_orders = exchange
        .list_open_sell_orders()
        .await
        .context("Failed to list open sell orders")?;
    let selling = selling_set(&open_orders);

    // 2. Scan the catalog
    let catalog = exchange
        .list_spot_products()
        .await
        .context("Failed to list spot products")?;
    let candidates = select_candidates(&catalog, &selling, &ScanCriteria::from(strategy));

    let mut report = RunReport::new(RunOutcome::NoCandidates);
    report.open_sell_orders = selling.len();
    report.catalog_size = catalog.len();
    report.candidates = candidates.len();

    info!(
        catalog = catalog.len(),
        open_sells = selling.len(),
        candidates = candidates.len(),
        "Market scan complete"
    );

    if candidates.is_empty() {
        info!("No products meet the buying criteria");
        return Ok(report);
    }

    // 3. Size the spend
    let balance = exchange
        .get_account_balance(stablecoin_account)
        .await
        .context("Failed to read stablecoin balance")?;
    report.balance = Some(balance);

    let Some(plan) = allocate(balance, candidates.len(), &AllocationPolicy::from(strategy)) else {
        info!(%balance, candidates = candidates.len(), "Insufficient balance to distribute among products");
        report.outcome = RunOutcome::InsufficientBalance;
        return Ok(report);
    };

    info!(plan = %plan, "Allocation computed");

    // 4-5. Buy, then queue take-profit sells
    let seller = SellPlanner::new(exchange, SellPolicy::from(strategy));
    let executor = BuyExecutor::new(exchange, stablecoin_account, BuyPolicy::from(strategy), seller);
    report.buys = executor.execute(&candidates, &plan).await?;
    report.plan = Some(plan);
    report.outcome = RunOutcome::Executed;

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
