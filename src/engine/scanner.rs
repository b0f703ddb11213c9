//! Momentum scanner.
//!
//! Filters the spot catalog down to buy candidates: quoted in the
//! stablecoin, up more than the threshold over 24h, and not already
//! sitting in an open sell order. Pure and network-free.

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::config::StrategyConfig;
use crate::types::{OpenOrder, Product};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScanCriteria {
    /// A product id must end with this (e.g. "USDC").
    pub quote_suffix: String,
    /// 24h change in percent must be strictly greater than this.
    pub min_price_change_pct: Decimal,
}

impl From<&StrategyConfig> for ScanCriteria {
    fn from(cfg: &StrategyConfig) -> Self {
        Self {
            quote_suffix: cfg.quote_currency.clone(),
            min_price_change_pct: cfg.min_price_change_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Product ids currently held in open sell orders.
pub fn selling_set(orders: &[OpenOrder]) -> HashSet<String> {
    orders.iter().map(|o| o.product_id.clone()).collect()
}

/// Select buy candidates, preserving catalog order.
///
/// Entries whose 24h change is missing or non-numeric are dropped silently.
/// No ranking is applied: earlier catalog entries win when the allocator
/// later truncates the list.
pub fn select_candidates(
    catalog: &[Product],
    selling: &HashSet<String>,
    criteria: &ScanCriteria,
) -> Vec<Product> {
    let candidates: Vec<Product> = catalog
        .iter()
        .filter(|p| {
            let Some(change) = p.price_change_pct() else {
                return false;
            };
            p.product_id.ends_with(&criteria.quote_suffix)
                && change > criteria.min_price_change_pct
                && !selling.contains(&p.product_id)
        })
        .cloned()
        .collect();

    for product in &candidates {
        debug!(candidate = %product, "Candidate selected");
    }

    debug!(
        catalog = catalog.len(),
        excluded_selling = selling.len(),
        candidates = candidates.len(),
        "Catalog scanned"
    );

    candidates
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
