//! Coinbase Advanced Trade integration.
//!
//! API docs: https://docs.cdp.coinbase.com/advanced-trade/reference
//! Base URL: https://api.coinbase.com/api/v3/brokerage
//! Auth: CDP API keys. Every request carries `Authorization: Bearer <jwt>`,
//! a fresh ES256 token signed with the key's EC private key. The token's
//! `uri` claim binds it to one method and path (query string excluded) and
//! it expires after two minutes.
//!
//! All amounts travel as decimal strings in both directions.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use p256::SecretKey;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::Exchange;
use crate::config::{Credentials, ExchangeConfig};
use crate::error::ExchangeError;
use crate::types::{AccountBalance, OpenOrder, OrderReceipt, OrderSide, Product};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const API_PREFIX: &str = "/api/v3/brokerage";
const EXCHANGE_NAME: &str = "coinbase";

/// Page size for account listing (API max is 250).
const ACCOUNTS_PAGE_LIMIT: u32 = 250;

/// Lifetime of a request token.
const JWT_TTL_SECS: i64 = 120;
const JWT_ISSUER: &str = "cdp";

// ---------------------------------------------------------------------------
// API response types (Coinbase JSON → Rust)
// ---------------------------------------------------------------------------

/// One page of `/orders/historical/batch`.
#[derive(Debug, Deserialize)]
struct CbOrdersPage {
    #[serde(default)]
    orders: Vec<CbOrder>,
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    cursor: String,
}

#[derive(Debug, Deserialize)]
struct CbOrder {
    product_id: String,
}

#[derive(Debug, Deserialize)]
struct CbProductsPage {
    #[serde(default)]
    products: Vec<CbProduct>,
}

/// Product as returned by `/products` and `/products/{id}`.
/// We only deserialize the fields we need.
#[derive(Debug, Deserialize)]
struct CbProduct {
    product_id: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    quote_increment: String,
    #[serde(default)]
    quote_min_size: String,
    #[serde(default)]
    base_min_size: String,
    /// Usually a string, occasionally a bare number or absent.
    #[serde(default)]
    price_percentage_change_24h: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CbAccountEnvelope {
    account: CbAccount,
}

#[derive(Debug, Deserialize)]
struct CbAccountsPage {
    #[serde(default)]
    accounts: Vec<CbAccount>,
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    cursor: String,
}

#[derive(Debug, Deserialize)]
struct CbAccount {
    #[serde(default)]
    uuid: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    currency: String,
    available_balance: CbAmount,
}

#[derive(Debug, Deserialize)]
struct CbAmount {
    value: String,
}

/// Response from `POST /orders`.
#[derive(Debug, Deserialize)]
struct CbCreateOrderResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    success_response: Option<CbOrderSuccess>,
    #[serde(default)]
    error_response: Option<CbOrderError>,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CbOrderSuccess {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct CbOrderError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

// ---------------------------------------------------------------------------
// Request tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    kid: &'a str,
    nonce: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    iss: String,
    nbf: i64,
    exp: i64,
    uri: String,
}

/// Parse the CDP private key into a signing key.
///
/// Coinbase hands out SEC1 (`BEGIN EC PRIVATE KEY`) PEMs; PKCS#8 is accepted
/// too. `.env` files often hold the PEM on one line with literal `\n`.
fn load_signing_key(pem: &str) -> Result<EncodingKey> {
    let pem = pem.trim().replace("\\n", "\n");
    let secret = SecretKey::from_sec1_pem(&pem)
        .or_else(|_| SecretKey::from_pkcs8_pem(&pem))
        .map_err(|_| anyhow!("API secret is not a P-256 EC private key in PEM format"))?;
    let der = secret
        .to_pkcs8_der()
        .map_err(|e| anyhow!("Failed to re-encode API secret: {e}"))?;
    Ok(EncodingKey::from_ec_der(der.as_bytes()))
}

/// Host and port of the base URL, as the `uri` claim expects it.
fn uri_host(base_url: &str) -> &str {
    base_url.split_once("://").map_or(base_url, |(_, rest)| rest)
}

/// Coinbase Advanced Trade REST client.
pub struct CoinbaseClient {
    http: Client,
    base_url: String,
    key_name: String,
    signing_key: EncodingKey,
}

impl CoinbaseClient {
    pub fn new(credentials: Credentials, config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("SURGE/0.1.0 (spot-momentum-trader)")
            .build()
            .context("Failed to build HTTP client for Coinbase")?;

        let signing_key = load_signing_key(credentials.api_secret.expose_secret())?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_name: credentials.api_key,
            signing_key,
        })
    }

    // -- Internal helpers ------------------------------------------------

    /// Build the bearer token for one `method` + `path` request.
    fn request_token(&self, method: &str, path: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let header = JwtHeader {
            alg: "ES256",
            typ: "JWT",
            kid: &self.key_name,
            nonce: Uuid::new_v4().simple().to_string(),
        };
        let claims = JwtClaims {
            sub: self.key_name.clone(),
            iss: JWT_ISSUER.to_string(),
            nbf: now,
            exp: now + JWT_TTL_SECS,
            uri: format!("{method} {}{path}", uri_host(&self.base_url)),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature =
            jsonwebtoken::crypto::sign(signing_input.as_bytes(), &self.signing_key, Algorithm::ES256)
                .context("Failed to sign request token")?;

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Send a signed request and decode the JSON response.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let body_text = match &body {
            Some(value) => serde_json::to_string(value).context("Failed to encode request body")?,
            None => String::new(),
        };
        let token = self.request_token(method.as_str(), path)?;
        let url = format!("{}{path}", self.base_url);

        debug!(method = %method, url = %url, "Coinbase API request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        if !query.is_empty() {
            req = req.query(query);
        }
        if body.is_some() {
            req = req
                .header("Content-Type", "application/json")
                .body(body_text);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Coinbase {method} {path} request failed"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ExchangeError::Http { status, body })
                .with_context(|| format!("Coinbase {method} {path} failed"));
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Coinbase {path} response"))
    }

    async fn place_order(
        &self,
        client_order_id: &str,
        product_id: &str,
        side: OrderSide,
        order_configuration: serde_json::Value,
    ) -> Result<OrderReceipt> {
        let body = json!({
            "client_order_id": client_order_id,
            "product_id": product_id,
            "side": side.to_string(),
            "order_configuration": order_configuration,
        });

        let path = format!("{API_PREFIX}/orders");
        let resp: CbCreateOrderResponse =
            self.request(Method::POST, &path, &[], Some(body)).await?;

        let order_id = match (resp.success, resp.success_response) {
            (true, Some(ok)) => ok.order_id,
            _ => {
                let reason = resp
                    .error_response
                    .map(|e| {
                        if e.message.is_empty() {
                            e.error
                        } else {
                            format!("{}: {}", e.error, e.message)
                        }
                    })
                    .or(resp.failure_reason)
                    .unwrap_or_else(|| "unknown reason".to_string());
                return Err(ExchangeError::Rejected {
                    product_id: product_id.to_string(),
                    reason,
                }
                .into());
            }
        };

        info!(
            exchange = EXCHANGE_NAME,
            product_id,
            side = %side,
            order_id = %order_id,
            client_order_id,
            "Order accepted"
        );

        Ok(OrderReceipt {
            order_id,
            client_order_id: client_order_id.to_string(),
            product_id: product_id.to_string(),
            side,
            submitted_at: Utc::now(),
        })
    }
}

// -- Conversion helpers ------------------------------------------------------

/// Parse a decimal string field. Empty strings read as zero.
fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, ExchangeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed).map_err(|_| ExchangeError::MalformedNumber {
        field,
        value: value.to_string(),
    })
}

/// Decimal as sent on the wire: plain notation, no trailing zeros.
pub fn wire_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Keep the 24h change as raw text; the scanner decides whether it is numeric.
fn raw_change(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<CbProduct> for Product {
    type Error = ExchangeError;

    fn try_from(p: CbProduct) -> Result<Self, Self::Error> {
        Ok(Product {
            price: parse_decimal("price", &p.price)?,
            quote_increment: parse_decimal("quote_increment", &p.quote_increment)?,
            quote_min_size: parse_decimal("quote_min_size", &p.quote_min_size)?,
            base_min_size: parse_decimal("base_min_size", &p.base_min_size)?,
            price_change_24h: raw_change(p.price_percentage_change_24h),
            product_id: p.product_id,
        })
    }
}

impl TryFrom<CbAccount> for AccountBalance {
    type Error = ExchangeError;

    fn try_from(a: CbAccount) -> Result<Self, Self::Error> {
        Ok(AccountBalance {
            available: parse_decimal("available_balance", &a.available_balance.value)?,
            uuid: a.uuid,
            name: a.name,
            currency: a.currency,
        })
    }
}

// ---------------------------------------------------------------------------
// Exchange implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Exchange for CoinbaseClient {
    async fn list_open_sell_orders(&self) -> Result<Vec<OpenOrder>> {
        let path = format!("{API_PREFIX}/orders/historical/batch");
        let mut orders = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![
                ("order_side", "SELL".to_string()),
                ("order_status", "OPEN".to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: CbOrdersPage = self.request(Method::GET, &path, &query, None).await?;
            orders.extend(page.orders.into_iter().map(|o| OpenOrder {
                product_id: o.product_id,
            }));

            if !page.has_next || page.cursor.is_empty() {
                break;
            }
            cursor = page.cursor;
        }

        debug!(count = orders.len(), "Fetched open sell orders");
        Ok(orders)
    }

    async fn list_spot_products(&self) -> Result<Vec<Product>> {
        let path = format!("{API_PREFIX}/products");
        let query = [("product_type", "SPOT".to_string())];
        let page: CbProductsPage = self.request(Method::GET, &path, &query, None).await?;

        let total = page.products.len();
        let products: Vec<Product> = page
            .products
            .into_iter()
            .filter_map(|p| {
                let id = p.product_id.clone();
                Product::try_from(p)
                    .map_err(|e| debug!(product_id = %id, error = %e, "Dropping unparseable product"))
                    .ok()
            })
            .collect();

        info!(total, usable = products.len(), "Fetched spot product catalog");
        Ok(products)
    }

    async fn get_account_balance(&self, account_ref: &str) -> Result<Decimal> {
        let path = format!("{API_PREFIX}/accounts/{}", urlencoding::encode(account_ref));
        let envelope: CbAccountEnvelope = self.request(Method::GET, &path, &[], None).await?;
        let balance = parse_decimal("available_balance", &envelope.account.available_balance.value)?;
        debug!(account = account_ref, %balance, "Fetched account balance");
        Ok(balance)
    }

    async fn list_accounts(&self) -> Result<Vec<AccountBalance>> {
        let path = format!("{API_PREFIX}/accounts");
        let mut accounts = Vec::new();
        let mut cursor = String::new();

        loop {
            let mut query = vec![("limit", ACCOUNTS_PAGE_LIMIT.to_string())];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: CbAccountsPage = self.request(Method::GET, &path, &query, None).await?;
            for account in page.accounts {
                accounts.push(AccountBalance::try_from(account)?);
            }

            if !page.has_next || page.cursor.is_empty() {
                break;
            }
            cursor = page.cursor;
        }

        debug!(count = accounts.len(), "Fetched accounts");
        Ok(accounts)
    }

    async fn get_product(&self, product_id: &str) -> Result<Product> {
        let path = format!("{API_PREFIX}/products/{}", urlencoding::encode(product_id));
        let product: CbProduct = self.request(Method::GET, &path, &[], None).await?;
        Product::try_from(product)
            .with_context(|| format!("Malformed product payload for {product_id}"))
    }

    async fn place_market_buy(
        &self,
        client_order_id: &str,
        product_id: &str,
        quote_size: Decimal,
    ) -> Result<OrderReceipt> {
        let config = json!({
            "market_market_ioc": { "quote_size": wire_decimal(quote_size) }
        });
        self.place_order(client_order_id, product_id, OrderSide::Buy, config)
            .await
            .with_context(|| format!("Market buy for {product_id} failed"))
    }

    async fn place_limit_sell_gtc(
        &self,
        client_order_id: &str,
        product_id: &str,
        base_size: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderReceipt> {
        let config = json!({
            "limit_limit_gtc": {
                "base_size": wire_decimal(base_size),
                "limit_price": wire_decimal(limit_price),
                "post_only": false,
            }
        });
        self.place_order(client_order_id, product_id, OrderSide::Sell, config)
            .await
            .with_context(|| format!("Limit sell for {product_id} failed"))
    }

    fn name(&self) -> &'static str {
        EXCHANGE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
