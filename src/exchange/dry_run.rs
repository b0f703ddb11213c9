//! Dry-run decorator.
//!
//! Wraps a real exchange: reads pass through untouched, order placement is
//! logged and answered with a synthetic receipt. Balances therefore never
//! move, so take-profit sells in a dry run usually report a skip.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::Exchange;
use crate::types::{AccountBalance, OpenOrder, OrderReceipt, OrderSide, Product};

pub struct DryRunExchange<E> {
    inner: E,
}

impl<E: Exchange> DryRunExchange<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl OrderReceipt {
    /// Create a dry-run receipt (no real execution).
    pub fn dry_run(client_order_id: &str, product_id: &str, side: OrderSide) -> Self {
        Self {
            order_id: format!("dry-run-{}", uuid::Uuid::new_v4()),
            client_order_id: client_order_id.to_string(),
            product_id: product_id.to_string(),
            side,
            submitted_at: Utc::now(),
        }
    }
}

#[async_trait]
impl<E: Exchange> Exchange for DryRunExchange<E> {
    async fn list_open_sell_orders(&self) -> Result<Vec<OpenOrder>> {
        self.inner.list_open_sell_orders().await
    }

    async fn list_spot_products(&self) -> Result<Vec<Product>> {
        self.inner.list_spot_products().await
    }

    async fn get_account_balance(&self, account_ref: &str) -> Result<Decimal> {
        self.inner.get_account_balance(account_ref).await
    }

    async fn list_accounts(&self) -> Result<Vec<AccountBalance>> {
        self.inner.list_accounts().await
    }

    async fn get_product(&self, product_id: &str) -> Result<Product> {
        self.inner.get_product(product_id).await
    }

    async fn place_market_buy(
        &self,
        client_order_id: &str,
        product_id: &str,
        quote_size: Decimal,
    ) -> Result<OrderReceipt> {
        info!(
            product_id,
            %quote_size,
            client_order_id,
            "[DRY RUN] Would place market buy"
        );
        Ok(OrderReceipt::dry_run(client_order_id, product_id, OrderSide::Buy))
    }

    async fn place_limit_sell_gtc(
        &self,
        client_order_id: &str,
        product_id: &str,
        base_size: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderReceipt> {
        info!(
            product_id,
            %base_size,
            %limit_price,
            client_order_id,
            "[DRY RUN] Would place GTC limit sell"
        );
        Ok(OrderReceipt::dry_run(client_order_id, product_id, OrderSide::Sell))
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}
