//! Data models for BitMEX exchange integration.
//!
//! XBT monetary amounts are satoshi integers (divide by 1e8 for XBT);
//! notionals and prices are floats. The client parses the exchange's raw
//! payloads, where most fields are nullable, into these types, so consumers
//! never see a half-populated position.

use hedge_trade_core::hedge::Side;
use serde::Serialize;

// =============================================================================
// Market Data
// =============================================================================

/// A tradeable instrument.
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Instrument symbol (e.g., "XBTUSD").
    pub symbol: String,

    /// Mark price used for margin and PnL calculations. Absent for
    /// unsettled or delisted instruments.
    pub mark_price: Option<f64>,
}

// =============================================================================
// Account Data
// =============================================================================

/// An open position, or the synthetic flat position when none exists.
#[derive(Debug, Clone)]
pub struct Position {
    /// Instrument symbol.
    pub symbol: String,

    /// Position exposure in the base currency (XBT); negative for shorts.
    pub home_notional: f64,

    /// Position exposure in the quote currency (USD).
    pub foreign_notional: f64,

    /// Realised PnL in satoshis.
    pub realised_pnl: i64,

    /// Rebalanced PnL in satoshis.
    pub rebalanced_pnl: i64,

    /// Average entry price.
    pub avg_entry_price: f64,

    /// Commission rate (e.g., 0.00075).
    pub commission: f64,

    /// Leverage multiplier.
    pub leverage: f64,

    /// Mark price the exchange used for this position.
    pub mark_price: f64,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            home_notional: 0.0,
            foreign_notional: 0.0,
            realised_pnl: 0,
            rebalanced_pnl: 0,
            avg_entry_price: 0.0,
            commission: 0.0,
            leverage: 1.0,
            mark_price: 0.0,
        }
    }
}

impl Position {
    /// Builds the synthetic zero position used when the account holds no
    /// open position, with prices defaulted from the instrument.
    #[must_use]
    pub fn flat(symbol: impl Into<String>, mark_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            avg_entry_price: mark_price,
            mark_price,
            ..Self::default()
        }
    }
}

/// Account margin for one settlement currency.
#[derive(Debug, Clone, Default)]
pub struct Margin {
    /// Settlement currency (e.g., "XBt").
    pub currency: String,

    /// Total margin balance in satoshis.
    pub margin_balance: i64,

    /// Margin available for new orders, in satoshis.
    pub available_margin: i64,
}

// =============================================================================
// Orders
// =============================================================================

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Time in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeInForce {
    ImmediateOrCancel,
    GoodTillCancel,
}

/// Request to submit an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Instrument symbol.
    pub symbol: String,

    /// Buy or Sell.
    pub side: Side,

    /// Quantity in contracts.
    pub order_qty: u64,

    /// Order type.
    pub ord_type: OrderType,

    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Creates an immediate-or-cancel market order.
    #[must_use]
    pub fn market(symbol: impl Into<String>, side: Side, order_qty: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_qty,
            ord_type: OrderType::Market,
            time_in_force: TimeInForce::ImmediateOrCancel,
        }
    }
}

/// Request to change position leverage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageRequest {
    /// Instrument symbol.
    pub symbol: String,

    /// New leverage multiplier.
    pub leverage: f64,
}

/// An order as reported back by the exchange. Fill fields stay `None` for
/// rejected or unfilled orders.
#[derive(Debug, Clone, Default)]
pub struct Order {
    /// Exchange-assigned order ID.
    pub order_id: String,

    /// Instrument symbol.
    pub symbol: String,

    /// Buy or Sell.
    pub side: Option<Side>,

    /// Requested quantity in contracts.
    pub order_qty: Option<u64>,

    /// Filled quantity in contracts.
    pub cum_qty: Option<u64>,

    /// Average fill price.
    pub avg_px: Option<f64>,

    /// Order status (e.g., "Filled", "Canceled").
    pub ord_status: Option<String>,
}
