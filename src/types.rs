//! Shared types for the SURGE trader.
//!
//! Everything here is a transient snapshot scoped to a single run.
//! Nothing is persisted between invocations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A spot trading pair as listed in the exchange catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Pair identifier, `BASE-QUOTE` (e.g. "SOL-USDC").
    pub product_id: String,
    /// Last quoted price in quote currency.
    pub price: Decimal,
    /// Smallest step for an order's quote-currency amount.
    pub quote_increment: Decimal,
    pub quote_min_size: Decimal,
    pub base_min_size: Decimal,
    /// 24h price change in percent, exactly as the exchange reported it.
    /// May be absent, empty, or non-numeric.
    pub price_change_24h: Option<String>,
}

impl Product {
    /// Base asset symbol: the part of the id before the first `-`.
    pub fn base_currency(&self) -> &str {
        base_currency_of(&self.product_id)
    }

    /// Parse the 24h change field. `None` when it is missing or not a number.
    pub fn price_change_pct(&self) -> Option<Decimal> {
        let raw = self.price_change_24h.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }

    /// Helper to build a test product with sensible defaults.
    #[cfg(test)]
    pub fn sample(product_id: &str, price: Decimal, change: &str) -> Self {
        Product {
            product_id: product_id.to_string(),
            price,
            quote_increment: rust_decimal_macros::dec!(0.01),
            quote_min_size: rust_decimal_macros::dec!(1),
            base_min_size: rust_decimal_macros::dec!(0.001),
            price_change_24h: Some(change.to_string()),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} (24h: {}%)",
            self.product_id,
            self.price,
            self.price_change_24h.as_deref().unwrap_or("n/a"),
        )
    }
}

/// Base asset symbol of a `BASE-QUOTE` product id.
pub fn base_currency_of(product_id: &str) -> &str {
    product_id.split('-').next().unwrap_or(product_id)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// An order currently resting on the sell side of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub product_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Acknowledgement of an accepted order submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Exchange-assigned order id.
    pub order_id: String,
    /// Client-generated idempotency token sent with the order.
    pub client_order_id: String,
    pub product_id: String,
    pub side: OrderSide,
    pub submitted_at: DateTime<Utc>,
}

impl fmt::Display for OrderReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} order {} (client {})",
            self.side, self.product_id, self.order_id, self.client_order_id,
        )
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// One wallet on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub uuid: String,
    pub name: String,
    pub currency: String,
    pub available: Decimal,
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.currency, self.uuid, self.available)
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// How the stablecoin balance is split across the funded candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub total_balance: Decimal,
    pub candidates_considered: usize,
    /// Number of leading candidates that receive funds.
    pub funded_count: usize,
    pub spend_per_product: Decimal,
}

impl fmt::Display for AllocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} products funded at {} each (balance {})",
            self.funded_count,
            self.candidates_considered,
            self.spend_per_product,
            self.total_balance,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
