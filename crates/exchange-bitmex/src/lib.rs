//! BitMEX exchange integration for the hedge-trade CLI.
//!
//! This crate provides:
//! - HMAC-SHA256 request signing for the BitMEX REST API
//! - A typed REST client that signs the exact body bytes it transmits
//! - Data models for instruments, positions, margin, and orders
//!
//! # Authentication
//!
//! BitMEX authenticates requests with three headers: `api-key`,
//! `api-expires` (epoch milliseconds, 60 seconds ahead), and
//! `api-signature` (lowercase-hex HMAC-SHA256 over
//! `verb + path + expires + body`). Set the following environment
//! variables:
//!
//! - `BITMEX_API_KEY`: Your API key
//! - `BITMEX_API_SECRET`: Your API secret
//!
//! For the testnet, use `BITMEX_TESTNET_API_KEY` and
//! `BITMEX_TESTNET_API_SECRET`.
//!
//! # API Endpoints
//!
//! The client supports the endpoints the hedging workflow needs:
//!
//! - `GET /api/v1/instrument` - Instrument data (mark price)
//! - `GET /api/v1/position` - Open positions
//! - `GET /api/v1/user/margin` - Margin balance
//! - `POST /api/v1/position/leverage` - Change position leverage
//! - `POST /api/v1/order` - Submit order

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use auth::{BitmexAuthConfig, BitmexCredentials, SignedHeaders};
pub use client::{
    ApiFailure, ApiResponse, BitmexClient, BitmexClientConfig, BITMEX_PROD_URL,
    BITMEX_TESTNET_URL,
};
pub use error::{BitmexError, Result};
pub use types::{
    Instrument, LeverageRequest, Margin, Order, OrderRequest, OrderType, Position, TimeInForce,
};
