use serde::{Deserialize, Serialize};

use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub current_capital: f64,
    pub roi: f64,
    pub winning_trades: usize,
    pub losing_trades: usize, // Breakevens count as losses
}

/// Aggregate statistics over an already-filtered set of trades.
///
/// Every ratio is zero-guarded: an empty set yields zero rates and a
/// non-positive baseline yields zero ROI.
pub fn compute_stats<'a, I>(trades: I, baseline_capital: f64) -> Stats
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut total_trades = 0usize;
    let mut winning_trades = 0usize;
    let mut total_pnl = 0.0;
    let mut gross_profit = 0.0;

    for trade in trades {
        total_trades += 1;
        total_pnl += trade.pnl();
        if trade.is_win() {
            winning_trades += 1;
            gross_profit += trade.pnl();
        }
    }

    let win_rate = if total_trades == 0 {
        0.0
    } else {
        (winning_trades as f64 / total_trades as f64) * 100.0
    };
    let avg_win = gross_profit / winning_trades.max(1) as f64;
    let roi = if baseline_capital > 0.0 {
        (total_pnl / baseline_capital) * 100.0
    } else {
        0.0
    };

    Stats {
        total_trades,
        total_pnl,
        win_rate,
        avg_win,
        current_capital: baseline_capital + total_pnl,
        roi,
        winning_trades,
        losing_trades: total_trades - winning_trades,
    }
}
