//! Spend allocation.
//!
//! Splits the stablecoin balance evenly over the candidates, keeping a
//! buffer for fees and slippage. When the share is too small to be a
//! viable order, the funded set shrinks from the back until it is, or
//! until nothing is left to fund.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::StrategyConfig;
use crate::types::AllocationPlan;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// Multiplier on the first even split (0.98 keeps 2% back).
    pub spend_buffer: Decimal,
    /// Spend per product must be strictly greater than this.
    pub min_spend: Decimal,
}

impl From<&StrategyConfig> for AllocationPolicy {
    fn from(cfg: &StrategyConfig) -> Self {
        Self {
            spend_buffer: cfg.spend_buffer,
            min_spend: cfg.min_spend,
        }
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Compute the allocation plan, or `None` when the balance cannot fund even
/// a single product.
///
/// The buffer only applies to the first split over all candidates. Every
/// recomputation after dropping a candidate divides the raw balance.
pub fn allocate(
    total_balance: Decimal,
    candidates: usize,
    policy: &AllocationPolicy,
) -> Option<AllocationPlan> {
    if candidates == 0 {
        return None;
    }

    let mut funded = candidates;
    let mut spend = total_balance / Decimal::from(funded) * policy.spend_buffer;

    while spend <= policy.min_spend {
        funded -= 1;
        if funded == 0 {
            debug!(%total_balance, candidates, "Balance too small for any product");
            return None;
        }
        spend = total_balance / Decimal::from(funded);
        debug!(funded, %spend, "Shrinking funded set");
    }

    Some(AllocationPlan {
        total_balance,
        candidates_considered: candidates,
        funded_count: funded,
        spend_per_product: spend,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
