//! Hedge arithmetic over instrument, position, and margin data.
//!
//! Everything here is pure: one snapshot of exchange state in, one report
//! out. Figures use `f64` deliberately. XBT amounts arrive as satoshi
//! integers and are scaled by 1e8, and a zero original value must produce a
//! non-finite profit percentage for the reporter to render rather than a
//! fatal error.

use serde::{Deserialize, Serialize};

/// Satoshis per XBT.
pub const SATOSHIS_PER_XBT: f64 = 1e8;

/// Side of a hedge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the API string representation.
    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// One run's view of the exchange state, in the units the API reports.
///
/// Satoshi fields (`*_pnl`, `margin_balance`, `available_margin`) divide by
/// 1e8 to get XBT. `cold_wallet` is off-exchange XBT supplied by the
/// operator and treated as part of the margin balance.
#[derive(Debug, Clone, Copy)]
pub struct HedgeSnapshot {
    pub mark_price: f64,
    pub avg_entry_price: f64,
    pub home_notional: f64,
    pub foreign_notional: f64,
    pub realised_pnl: i64,
    pub rebalanced_pnl: i64,
    pub commission: f64,
    pub leverage: f64,
    pub margin_balance: i64,
    pub available_margin: i64,
    pub cold_wallet: f64,
}

/// Derived hedge figures, computed fresh each run and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct HedgeReport {
    pub mark_price: f64,
    pub margin_balance_xbt: f64,
    pub margin_balance_usd: f64,
    pub hedged_xbt: f64,
    pub hedged_usd: f64,
    pub unhedged_xbt: f64,
    pub unhedged_usd: f64,
    pub available_margin_usd: f64,
    pub total_profit_xbt: f64,
    pub hedged_profit_xbt: f64,
    pub unhedged_profit_xbt: f64,
    /// Non-finite when the original value is zero.
    pub profit_percent: f64,
    pub side: Side,
    pub quantity: u64,
    pub max_quantity: u64,
}

/// The order the tool would submit, after the margin ceiling is applied.
#[derive(Debug, Clone, Copy)]
pub struct OrderPlan {
    pub side: Side,
    pub quantity: u64,
    /// True when the quantity was cut down to the margin ceiling.
    pub clamped: bool,
}

impl HedgeSnapshot {
    /// Derives balances, PnL attribution, and the recommended order.
    #[must_use]
    pub fn assess(&self) -> HedgeReport {
        let margin_balance_xbt = self.margin_balance as f64 / SATOSHIS_PER_XBT + self.cold_wallet;
        let margin_balance_usd = margin_balance_xbt * self.mark_price;

        let hedged_usd = self.foreign_notional;
        let hedged_xbt = -self.home_notional;

        let unhedged_xbt = margin_balance_xbt - hedged_xbt;
        let unhedged_usd = unhedged_xbt * self.mark_price;

        let available_margin_usd =
            self.available_margin as f64 / SATOSHIS_PER_XBT * self.mark_price;

        let total_profit_xbt =
            (self.rebalanced_pnl + self.realised_pnl) as f64 / SATOSHIS_PER_XBT;

        // Profit attributable to the hedged leg, bounded to [0, total]. The
        // bounds are applied min-first so a negative total clamps to zero
        // instead of producing an inverted range.
        let hedged_profit_xbt = (total_profit_xbt - unhedged_xbt)
            .min(total_profit_xbt)
            .max(0.0);
        let unhedged_profit_xbt = total_profit_xbt - hedged_profit_xbt;

        let original_value = hedged_usd - hedged_profit_xbt * self.avg_entry_price;
        let current_value = original_value
            + hedged_profit_xbt * self.avg_entry_price
            + unhedged_profit_xbt * self.mark_price;
        let profit_percent = (current_value - original_value) / original_value * 100.0;

        let side = if unhedged_usd > 0.0 { Side::Sell } else { Side::Buy };
        let quantity = unhedged_usd.abs().floor() as u64;

        // Leverage- and fee-adjusted ceiling on same-direction orders.
        let max_quantity =
            (self.leverage * (available_margin_usd / (1.0 + 2.0 * self.commission)).max(0.0))
                .floor() as u64;

        HedgeReport {
            mark_price: self.mark_price,
            margin_balance_xbt,
            margin_balance_usd,
            hedged_xbt,
            hedged_usd,
            unhedged_xbt,
            unhedged_usd,
            available_margin_usd,
            total_profit_xbt,
            hedged_profit_xbt,
            unhedged_profit_xbt,
            profit_percent,
            side,
            quantity,
            max_quantity,
        }
    }
}

impl HedgeReport {
    /// Applies the margin ceiling to the recommended order.
    ///
    /// Only orders that grow the hedge are capped; an order that flattens an
    /// oversized hedge frees margin and goes through at full size. A flat
    /// hedge counts as same-direction, since the order establishing a hedge
    /// consumes margin like one growing it.
    #[must_use]
    pub fn order_plan(&self) -> OrderPlan {
        let increases_hedge = (self.unhedged_usd > 0.0) == (self.hedged_usd >= 0.0);

        if increases_hedge && self.quantity > self.max_quantity {
            OrderPlan {
                side: self.side,
                quantity: self.max_quantity,
                clamped: true,
            }
        } else {
            OrderPlan {
                side: self.side,
                quantity: self.quantity,
                clamped: false,
            }
        }
    }
}
