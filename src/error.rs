//! Typed error conditions.
//!
//! `SkipReason` covers the non-fatal outcomes that drop a single buy or
//! sell while the run carries on. `ExchangeError` covers failures at the
//! exchange boundary; those are wrapped into `anyhow::Error` and end the run.

use rust_decimal::Decimal;
use thiserror::Error;

/// Why a candidate buy or a take-profit sell was not submitted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("quote size {quote_size} exceeds available balance {available}")]
    InsufficientBalance { quote_size: Decimal, available: Decimal },

    #[error("no wallet found for currency {currency}")]
    MissingWallet { currency: String },

    #[error("available quantity {quantity} is below minimum base size {min_size}")]
    InsufficientAsset { quantity: Decimal, min_size: Decimal },
}

/// Failures talking to the exchange.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Coinbase API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("order for {product_id} rejected: {reason}")]
    Rejected { product_id: String, reason: String },

    #[error("malformed {field} value {value:?}")]
    MalformedNumber { field: &'static str, value: String },
}
