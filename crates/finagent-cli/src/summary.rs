//! Console summary of a valuation

use finagent_valuation::{NOT_AVAILABLE, ValuationReport};
use std::fmt::Write;

/// Field-by-field summary for the terminal
pub fn format_summary(report: &ValuationReport) -> String {
    let risks = if report.risk_factors.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        report.risk_factors.join("; ")
    };

    let rows = [
        ("Company", &report.company_name),
        ("Ticker", &report.ticker),
        ("Market cap", &report.market_cap),
        ("P/E ratio", &report.pe_ratio),
        ("Revenue", &report.revenue.current),
        ("Revenue growth", &report.revenue.growth_rate),
        ("EPS", &report.eps),
        ("Debt/Equity", &report.debt_to_equity),
        ("Free cash flow", &report.free_cash_flow),
        ("Dividend yield", &report.dividend_yield),
        ("Fair value", &report.estimated_fair_value),
        ("Methodology", &report.valuation_methodology),
        ("Risk factors", &risks),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<16} {value}");
    }
    out
}
