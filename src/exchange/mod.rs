//! Exchange integrations.
//!
//! Defines the `Exchange` trait consumed by the engine and provides:
//! - Coinbase Advanced Trade REST client (real-money execution)
//! - Dry-run decorator that forwards reads and only logs writes

pub mod coinbase;
pub mod dry_run;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{AccountBalance, OpenOrder, OrderReceipt, Product};

/// Abstraction over a spot exchange.
///
/// Read operations return fresh snapshots on every call; nothing is cached.
/// Order placement carries a caller-generated idempotency token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Orders currently open on the sell side.
    async fn list_open_sell_orders(&self) -> Result<Vec<OpenOrder>>;

    /// The full spot product catalog.
    async fn list_spot_products(&self) -> Result<Vec<Product>>;

    /// Available balance of a single account, by account reference.
    async fn get_account_balance(&self, account_ref: &str) -> Result<Decimal>;

    /// Every account held by the API key.
    async fn list_accounts(&self) -> Result<Vec<AccountBalance>>;

    /// A single product by id.
    async fn get_product(&self, product_id: &str) -> Result<Product>;

    /// Market buy spending `quote_size` of the quote currency.
    async fn place_market_buy(
        &self,
        client_order_id: &str,
        product_id: &str,
        quote_size: Decimal,
    ) -> Result<OrderReceipt>;

    /// Good-till-canceled limit sell of `base_size` at `limit_price`.
    async fn place_limit_sell_gtc(
        &self,
        client_order_id: &str,
        product_id: &str,
        base_size: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderReceipt>;

    /// Exchange name for logging.
    fn name(&self) -> &'static str;
}
