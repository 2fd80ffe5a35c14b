use serde::{Deserialize, Serialize};

use crate::engine::{self, EquityCurvePoint, PositionSize, Stats, StrategyBreakdown};
use crate::error::JournalResult;
use crate::journal::Journal;

/// Dashboard figures for the current filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub period: String,
    pub strategy: Option<String>,
    pub baseline_capital: f64,
    #[serde(flatten)]
    pub stats: Stats,
}

pub fn dashboard_stats(journal: &Journal) -> DashboardStats {
    DashboardStats {
        period: journal.filters().period_label(),
        strategy: journal.filters().strategy.clone(),
        baseline_capital: journal.settings().capital,
        stats: journal.stats(),
    }
}

pub fn render_stats(dashboard: &DashboardStats) -> String {
    let s = &dashboard.stats;
    let mut out = String::new();
    out.push_str(&format!("Period: {}", dashboard.period));
    if let Some(strategy) = &dashboard.strategy {
        out.push_str(&format!(" | Strategy: {}", strategy));
    }
    out.push('\n');
    out.push_str(&format!("Trades:          {} ({} won, {} lost)\n", s.total_trades, s.winning_trades, s.losing_trades));
    out.push_str(&format!("Total P&L:       ₹{:.2}\n", s.total_pnl));
    out.push_str(&format!("Win rate:        {:.1}%\n", s.win_rate));
    out.push_str(&format!("Average win:     ₹{:.2}\n", s.avg_win));
    out.push_str(&format!("Capital:         ₹{:.2} (baseline ₹{:.2})\n", s.current_capital, dashboard.baseline_capital));
    out.push_str(&format!("ROI:             {:.2}%\n", s.roi));
    out
}

pub fn render_equity_curve(points: &[EquityCurvePoint]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>6} {:>14} {:>14}\n", "DATE", "TRADES", "DAY P&L", "CUMULATIVE"));
    for p in points {
        out.push_str(&format!(
            "{:<10} {:>6} {:>14.2} {:>14.2}\n",
            p.date, p.trade_count, p.daily_pnl, p.cumulative_pnl
        ));
    }
    out
}

pub fn render_strategy_breakdown(rows: &[StrategyBreakdown]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20} {:>6} {:>6} {:>8} {:>14}\n", "STRATEGY", "TRADES", "WINS", "WIN %", "P&L"));
    for r in rows {
        let name = if r.strategy.is_empty() { "(none)" } else { r.strategy.as_str() };
        out.push_str(&format!(
            "{:<20} {:>6} {:>6} {:>8.1} {:>14.2}\n",
            name, r.trades, r.wins, r.win_rate, r.total_pnl
        ));
    }
    out
}

/// Position size against `capital`, or the journal's baseline capital
pub fn risk_calculator(
    journal_capital: f64,
    capital: Option<f64>,
    risk_percent: f64,
    entry: f64,
    stop_loss: f64,
) -> JournalResult<PositionSize> {
    engine::position_size(capital.unwrap_or(journal_capital), risk_percent, entry, stop_loss)
}

pub fn render_position_size(size: &PositionSize) -> String {
    format!(
        "Risk amount:     ₹{:.2}\nRisk per unit:   ₹{:.2}\nQuantity:        {}\nPosition value:  ₹{:.2}\n",
        size.risk_amount, size.risk_per_unit, size.quantity, size.position_value
    )
}
