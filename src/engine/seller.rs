//! Take-profit sell planner.
//!
//! After a buy, queues a GTC limit sell for the whole available balance of
//! the base asset at a fixed mark-up over the reference price.
//!
//! Two approximations:
//! - the reference price is the scan-time quote, not the fill price;
//! - the sell size is the entire wallet balance, including any holdings
//!   that predate this run.

use anyhow::{Context, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::StrategyConfig;
use crate::error::SkipReason;
use crate::exchange::Exchange;
use crate::types::{base_currency_of, AccountBalance, OrderReceipt};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SellPolicy {
    /// Mark-up over the reference price (0.06 = +6%).
    pub target_profit_pct: Decimal,
    pub price_decimals: u32,
    pub base_decimals: u32,
}

impl From<&StrategyConfig> for SellPolicy {
    fn from(cfg: &StrategyConfig) -> Self {
        Self {
            target_profit_pct: cfg.target_profit_pct,
            price_decimals: cfg.price_decimals,
            base_decimals: cfg.base_decimals,
        }
    }
}

impl SellPolicy {
    /// Limit price for a take-profit on `buy_price`.
    pub fn target_price(&self, buy_price: Decimal) -> Decimal {
        (buy_price * (Decimal::ONE + self.target_profit_pct)).round_dp(self.price_decimals)
    }

    /// Sell size for an available wallet balance. Truncated, so it never
    /// exceeds what the wallet holds.
    pub fn quantity(&self, available: Decimal) -> Decimal {
        available.round_dp_with_strategy(self.base_decimals, RoundingStrategy::ToZero)
    }
}

// ---------------------------------------------------------------------------
// Account lookup
// ---------------------------------------------------------------------------

/// Available balance per currency, built from one account listing.
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    balances: HashMap<String, Decimal>,
}

impl AccountBook {
    /// The first account listed for a currency wins.
    pub fn from_accounts(accounts: &[AccountBalance]) -> Self {
        let mut balances = HashMap::with_capacity(accounts.len());
        for account in accounts {
            balances
                .entry(account.currency.clone())
                .or_insert(account.available);
        }
        Self { balances }
    }

    pub fn available(&self, currency: &str) -> Option<Decimal> {
        self.balances.get(currency).copied()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// What happened to the take-profit for one product.
#[derive(Debug, Clone)]
pub enum SellOutcome {
    Placed {
        receipt: OrderReceipt,
        quantity: Decimal,
        limit_price: Decimal,
    },
    Skipped(SkipReason),
}

impl SellOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, SellOutcome::Placed { .. })
    }
}

pub struct SellPlanner<'a> {
    exchange: &'a dyn Exchange,
    policy: SellPolicy,
}

impl<'a> SellPlanner<'a> {
    pub fn new(exchange: &'a dyn Exchange, policy: SellPolicy) -> Self {
        Self { exchange, policy }
    }

    /// Queue the take-profit sell for `product_id`.
    ///
    /// Missing wallets and dust balances are reported as skips. Exchange
    /// failures propagate.
    pub async fn place_take_profit(
        &self,
        product_id: &str,
        buy_price: Decimal,
    ) -> Result<SellOutcome> {
        let base_currency = base_currency_of(product_id);

        let product = self
            .exchange
            .get_product(product_id)
            .await
            .with_context(|| format!("Failed to fetch product details for {product_id}"))?;
        let min_base_size = product.base_min_size;

        let accounts = self
            .exchange
            .list_accounts()
            .await
            .context("Failed to list accounts")?;
        let book = AccountBook::from_accounts(&accounts);

        let Some(available) = book.available(base_currency) else {
            let reason = SkipReason::MissingWallet {
                currency: base_currency.to_string(),
            };
            warn!(product_id, reason = %reason, "Skipping take-profit sell");
            return Ok(SellOutcome::Skipped(reason));
        };

        let quantity = self.policy.quantity(available);
        let limit_price = self.policy.target_price(buy_price);

        if quantity < min_base_size {
            let reason = SkipReason::InsufficientAsset {
                quantity,
                min_size: min_base_size,
            };
            warn!(product_id, reason = %reason, "Skipping take-profit sell");
            return Ok(SellOutcome::Skipped(reason));
        }

        let client_order_id = Uuid::new_v4().to_string();
        let receipt = self
            .exchange
            .place_limit_sell_gtc(&client_order_id, product_id, quantity, limit_price)
            .await?;

        info!(
            product_id,
            %quantity,
            %limit_price,
            %buy_price,
            order_id = %receipt.order_id,
            "Take-profit sell placed"
        );

        Ok(SellOutcome::Placed {
            receipt,
            quantity,
            limit_price,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
