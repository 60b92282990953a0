#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use crate::hedge::HedgeReport;

/// Renders a monetary figure right-aligned in a 9-character field with two
/// decimal places. Non-finite values render as `NaN`/`inf` text.
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("{:>9.2}", value)
}

pub struct HedgeFormatter;

impl HedgeFormatter {
    #[must_use]
    pub fn format(report: &HedgeReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Margin Balance: {} USD\n",
            format_amount(report.margin_balance_usd)
        ));
        output.push_str(&format!(
            "Hedged:         {} USD\n",
            format_amount(report.hedged_usd)
        ));
        output.push_str(&format!(
            "Unhedged:       {} USD\n",
            format_amount(report.unhedged_usd)
        ));
        output.push_str(&format!(
            "Available:      {} USD\n",
            format_amount(report.available_margin_usd)
        ));
        output.push_str(&format!(
            "Profit:         {} USD ({:.2}%)\n",
            format_amount(report.total_profit_xbt * report.mark_price),
            report.profit_percent
        ));

        if report.quantity > 0 {
            output.push_str(&format!(
                "Order:          {} {} contracts\n",
                report.side, report.quantity
            ));
        } else {
            output.push_str("Order:          none\n");
        }

        output
    }
}
