//! BitMEX REST API client.
//!
//! Every request body is serialized exactly once; the same string is handed
//! to the signer and transmitted, so the signature always covers the bytes
//! on the wire. BitMEX accepts JSON bodies on GET requests and signs over
//! them, which is how the filter parameters travel.
//!
//! An `error` object inside the response JSON is not a transport failure.
//! It comes back as [`ApiResponse::ApiErr`] and each call site decides how
//! to react; only network-level problems surface on the outer `Result`.
//!
//! # Example
//!
//! ```ignore
//! use hedge_trade_bitmex::{BitmexClient, BitmexClientConfig};
//! use hedge_trade_bitmex::auth::{BitmexAuthConfig, BitmexCredentials};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = BitmexCredentials::from_env(BitmexAuthConfig::default())?;
//!     let client = BitmexClient::new(BitmexClientConfig::production(), credentials)?;
//!
//!     match client.margin("XBt").await? {
//!         hedge_trade_bitmex::ApiResponse::Ok(margin) => {
//!             println!("balance: {} satoshis", margin.margin_balance);
//!         }
//!         hedge_trade_bitmex::ApiResponse::ApiErr(err) => {
//!             println!("exchange refused: {err}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::BitmexCredentials;
use crate::error::{BitmexError, Result};
use crate::types::{Instrument, LeverageRequest, Margin, Order, OrderRequest, Position};
use hedge_trade_core::hedge::Side;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

// =============================================================================
// Constants
// =============================================================================

/// BitMEX production API base URL.
pub const BITMEX_PROD_URL: &str = "https://www.bitmex.com";

/// BitMEX testnet API base URL.
pub const BITMEX_TESTNET_URL: &str = "https://testnet.bitmex.com";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the BitMEX client.
#[derive(Debug, Clone)]
pub struct BitmexClientConfig {
    /// Base URL for the API.
    pub base_url: String,
}

impl Default for BitmexClientConfig {
    fn default() -> Self {
        Self {
            base_url: BITMEX_PROD_URL.to_string(),
        }
    }
}

impl BitmexClientConfig {
    /// Creates a configuration for production.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Creates a configuration for the testnet environment.
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            base_url: BITMEX_TESTNET_URL.to_string(),
        }
    }

    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

// =============================================================================
// API Result Envelope
// =============================================================================

/// Outcome of a transport-successful API call.
///
/// BitMEX reports application failures inside a 200-shaped JSON body (or a
/// 4xx body of the same shape), so a completed HTTP exchange can still carry
/// a refusal. Call sites pattern-match instead of probing for fields.
#[derive(Debug, Clone)]
pub enum ApiResponse<T> {
    /// The call succeeded and the payload parsed.
    Ok(T),
    /// The exchange answered with an error object.
    ApiErr(ApiFailure),
}

impl<T> ApiResponse<T> {
    /// Maps the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Ok(value) => ApiResponse::Ok(f(value)),
            Self::ApiErr(err) => ApiResponse::ApiErr(err),
        }
    }
}

/// An application-level error reported by the exchange.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    /// Error class name, when the exchange provides one.
    pub name: Option<String>,

    /// Human-readable message.
    pub message: String,
}

impl ApiFailure {
    /// Extracts a failure from the `error` value of a response body.
    ///
    /// `error.message` is not guaranteed; an unexpected shape falls back to
    /// rendering the whole error value.
    fn from_value(value: &serde_json::Value) -> Self {
        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string());

        let name = value
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        Self { name, message }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

// =============================================================================
// Raw API Types
// =============================================================================

/// Raw instrument data from the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstrument {
    symbol: String,
    mark_price: Option<f64>,
}

impl From<RawInstrument> for Instrument {
    fn from(raw: RawInstrument) -> Self {
        Self {
            symbol: raw.symbol,
            mark_price: raw.mark_price,
        }
    }
}

/// Raw position data from the API. Most fields are null for flat or barely
/// touched positions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    symbol: String,
    home_notional: Option<f64>,
    foreign_notional: Option<f64>,
    realised_pnl: Option<i64>,
    rebalanced_pnl: Option<i64>,
    avg_entry_price: Option<f64>,
    commission: Option<f64>,
    leverage: Option<f64>,
    mark_price: Option<f64>,
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Self {
            symbol: raw.symbol,
            home_notional: raw.home_notional.unwrap_or(0.0),
            foreign_notional: raw.foreign_notional.unwrap_or(0.0),
            realised_pnl: raw.realised_pnl.unwrap_or(0),
            rebalanced_pnl: raw.rebalanced_pnl.unwrap_or(0),
            avg_entry_price: raw.avg_entry_price.unwrap_or(0.0),
            commission: raw.commission.unwrap_or(0.0),
            leverage: raw.leverage.unwrap_or(1.0),
            mark_price: raw.mark_price.unwrap_or(0.0),
        }
    }
}

/// Raw margin data from the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMargin {
    currency: Option<String>,
    margin_balance: Option<i64>,
    available_margin: Option<i64>,
}

impl From<RawMargin> for Margin {
    fn from(raw: RawMargin) -> Self {
        Self {
            currency: raw.currency.unwrap_or_default(),
            margin_balance: raw.margin_balance.unwrap_or(0),
            available_margin: raw.available_margin.unwrap_or(0),
        }
    }
}

/// Raw order data from the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    order_id: Option<String>,
    symbol: Option<String>,
    side: Option<String>,
    order_qty: Option<u64>,
    cum_qty: Option<u64>,
    avg_px: Option<f64>,
    ord_status: Option<String>,
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        let side = match raw.side.as_deref() {
            Some("Buy") => Some(Side::Buy),
            Some("Sell") => Some(Side::Sell),
            _ => None,
        };

        Self {
            order_id: raw.order_id.unwrap_or_default(),
            symbol: raw.symbol.unwrap_or_default(),
            side,
            order_qty: raw.order_qty,
            cum_qty: raw.cum_qty,
            avg_px: raw.avg_px,
            ord_status: raw.ord_status,
        }
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Parses a response body, probing for the exchange's `error` object before
/// attempting to deserialize the success type.
fn parse_payload<T: serde::de::DeserializeOwned>(
    status: StatusCode,
    text: &str,
) -> Result<ApiResponse<T>> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Some(error) = value.get("error") {
        return Ok(ApiResponse::ApiErr(ApiFailure::from_value(error)));
    }

    if !status.is_success() {
        return Err(BitmexError::api(status.as_u16(), text));
    }

    Ok(ApiResponse::Ok(serde_json::from_value(value)?))
}

// =============================================================================
// BitmexClient
// =============================================================================

/// BitMEX REST API client.
///
/// All requests are signed. The client enforces no timeout of its own; the
/// signed 60-second expiry window is the only time bound on a request.
pub struct BitmexClient {
    /// Configuration.
    config: BitmexClientConfig,

    /// HTTP client.
    http: Client,

    /// Signing credentials.
    credentials: BitmexCredentials,
}

impl std::fmt::Debug for BitmexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmexClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl BitmexClient {
    /// Creates a new client with the given configuration and credentials.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: BitmexClientConfig, credentials: BitmexCredentials) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| BitmexError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            credentials,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Serializes the body once, signs it, and performs the request.
    async fn call<T, B>(&self, method: Method, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize,
    {
        let body_json = serde_json::to_string(body)?;
        let headers = self
            .credentials
            .sign_request(method.as_str(), path, &body_json)?;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("{} {} body_len={}", method, url, body_json.len());

        let auth = headers.as_tuples();
        let response = self
            .http
            .request(method, &url)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("x-requested-with", "XMLHttpRequest")
            .header(auth[0].0, auth[0].1)
            .header(auth[1].0, auth[1].1)
            .header(auth[2].0, auth[2].1)
            .body(body_json)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        parse_payload(status, &text)
    }

    // =========================================================================
    // Market Endpoints
    // =========================================================================

    /// Gets instruments filtered by symbol.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn instruments(&self, symbol: &str) -> Result<ApiResponse<Vec<Instrument>>> {
        let body = json!({ "filter": { "symbol": symbol } });
        let response: ApiResponse<Vec<RawInstrument>> =
            self.call(Method::GET, "/api/v1/instrument", &body).await?;

        Ok(response.map(|list| list.into_iter().map(Instrument::from).collect()))
    }

    // =========================================================================
    // Account Endpoints
    // =========================================================================

    /// Gets open positions filtered by symbol. The list is empty when the
    /// account holds no position.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn positions(&self, symbol: &str) -> Result<ApiResponse<Vec<Position>>> {
        let body = json!({ "filter": { "symbol": symbol } });
        let response: ApiResponse<Vec<RawPosition>> =
            self.call(Method::GET, "/api/v1/position", &body).await?;

        Ok(response.map(|list| list.into_iter().map(Position::from).collect()))
    }

    /// Gets the margin balance for a settlement currency.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn margin(&self, currency: &str) -> Result<ApiResponse<Margin>> {
        let body = json!({ "filter": { "currency": currency } });
        let response: ApiResponse<RawMargin> =
            self.call(Method::GET, "/api/v1/user/margin", &body).await?;

        Ok(response.map(Margin::from))
    }

    /// Sets position leverage and returns the updated position.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn set_leverage(&self, symbol: &str, leverage: f64) -> Result<ApiResponse<Position>> {
        let body = LeverageRequest {
            symbol: symbol.to_string(),
            leverage,
        };
        let response: ApiResponse<RawPosition> = self
            .call(Method::POST, "/api/v1/position/leverage", &body)
            .await?;

        Ok(response.map(Position::from))
    }

    // =========================================================================
    // Order Endpoints
    // =========================================================================

    /// Submits an order.
    ///
    /// # Errors
    /// Returns error on transport failure.
    pub async fn submit_order(&self, order: &OrderRequest) -> Result<ApiResponse<Order>> {
        let response: ApiResponse<RawOrder> =
            self.call(Method::POST, "/api/v1/order", order).await?;

        Ok(response.map(Order::from))
    }
}
