//! Buy executor.
//!
//! Walks the funded candidates one at a time: re-reads the stablecoin
//! balance, places a market buy sized from the allocation plan, waits for
//! settlement, then hands off to the sell planner.
//!
//! Exchange errors are not caught here. They end the run and leave any
//! orders already placed in this run untouched.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::seller::{SellOutcome, SellPlanner};
use crate::config::StrategyConfig;
use crate::error::SkipReason;
use crate::exchange::Exchange;
use crate::types::{AllocationPlan, OrderReceipt, Product};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BuyPolicy {
    pub quote_decimals: u32,
    /// Unconditional pause after each buy. Not a fill confirmation.
    pub settle_delay: Duration,
    /// Pause after each product's buy/sell pair.
    pub pacing_delay: Duration,
}

impl From<&StrategyConfig> for BuyPolicy {
    fn from(cfg: &StrategyConfig) -> Self {
        Self {
            quote_decimals: cfg.quote_decimals,
            settle_delay: cfg.settle_delay(),
            pacing_delay: cfg.pacing_delay(),
        }
    }
}

impl BuyPolicy {
    /// Quote amount to submit: the spend plus one quote increment, rounded.
    pub fn quote_size(&self, spend: Decimal, quote_increment: Decimal) -> Decimal {
        (spend + quote_increment).round_dp(self.quote_decimals)
    }
}

// ---------------------------------------------------------------------------
// Execution result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum BuyOutcome {
    Bought {
        product_id: String,
        quote_size: Decimal,
        receipt: OrderReceipt,
        sell: SellOutcome,
    },
    Skipped {
        product_id: String,
        reason: SkipReason,
    },
}

impl BuyOutcome {
    pub fn product_id(&self) -> &str {
        match self {
            BuyOutcome::Bought { product_id, .. } | BuyOutcome::Skipped { product_id, .. } => {
                product_id
            }
        }
    }
}

/// Result of executing the funded candidates.
#[derive(Debug, Clone, Default)]
pub struct BuyReport {
    pub outcomes: Vec<BuyOutcome>,
}

impl BuyReport {
    pub fn buys_placed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BuyOutcome::Bought { .. }))
            .count()
    }

    pub fn buys_skipped(&self) -> usize {
        self.outcomes.len() - self.buys_placed()
    }

    pub fn sells_placed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BuyOutcome::Bought { sell, .. } if sell.is_placed()))
            .count()
    }

    pub fn total_spent(&self) -> Decimal {
        self.outcomes
            .iter()
            .map(|o| match o {
                BuyOutcome::Bought { quote_size, .. } => *quote_size,
                BuyOutcome::Skipped { .. } => Decimal::ZERO,
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct BuyExecutor<'a> {
    exchange: &'a dyn Exchange,
    stablecoin_account: String,
    policy: BuyPolicy,
    seller: SellPlanner<'a>,
}

impl<'a> BuyExecutor<'a> {
    pub fn new(
        exchange: &'a dyn Exchange,
        stablecoin_account: impl Into<String>,
        policy: BuyPolicy,
        seller: SellPlanner<'a>,
    ) -> Self {
        Self {
            exchange,
            stablecoin_account: stablecoin_account.into(),
            policy,
            seller,
        }
    }

    /// Buy the first `plan.funded_count` candidates in order.
    pub async fn execute(&self, candidates: &[Product], plan: &AllocationPlan) -> Result<BuyReport> {
        let mut report = BuyReport::default();
        let funded = &candidates[..plan.funded_count.min(candidates.len())];

        info!(
            funded = funded.len(),
            spend = %plan.spend_per_product,
            "Executing buys"
        );

        for product in funded {
            let product_id = product.product_id.as_str();

            let balance = self
                .exchange
                .get_account_balance(&self.stablecoin_account)
                .await
                .context("Failed to read stablecoin balance")?;

            let quote_size = self
                .policy
                .quote_size(plan.spend_per_product, product.quote_increment);

            if quote_size > balance {
                let reason = SkipReason::InsufficientBalance {
                    quote_size,
                    available: balance,
                };
                warn!(product_id, reason = %reason, "Skipping buy");
                report.outcomes.push(BuyOutcome::Skipped {
                    product_id: product_id.to_string(),
                    reason,
                });
                continue;
            }

            let client_order_id = Uuid::new_v4().to_string();
            let receipt = self
                .exchange
                .place_market_buy(&client_order_id, product_id, quote_size)
                .await?;

            info!(
                product_id,
                %quote_size,
                %balance,
                order_id = %receipt.order_id,
                "Market buy placed"
            );

            pause(self.policy.settle_delay).await;

            // Scan-time price stands in for the fill price.
            let sell = self
                .seller
                .place_take_profit(product_id, product.price)
                .await?;

            report.outcomes.push(BuyOutcome::Bought {
                product_id: product_id.to_string(),
                quote_size,
                receipt,
                sell,
            });

            pause(self.policy.pacing_delay).await;
        }

        info!(
            bought = report.buys_placed(),
            skipped = report.buys_skipped(),
            sells = report.sells_placed(),
            spent = %report.total_spent(),
            "Buy execution complete"
        );

        Ok(report)
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!(secs = delay.as_secs_f64(), "Waiting");
    tokio::time::sleep(delay).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
