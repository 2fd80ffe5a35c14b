use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurvePoint {
    pub date: String,
    pub cumulative_pnl: f64,
    pub daily_pnl: f64,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBreakdown {
    pub strategy: String,
    pub trades: usize,
    pub wins: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
}

/// Daily P&L and running total, oldest day first
pub fn equity_curve<'a, I>(trades: I) -> Vec<EquityCurvePoint>
where
    I: IntoIterator<Item = &'a Trade>,
{
    // Keyed by display date; ordered by the earliest timestamp seen that day
    let mut daily_map: HashMap<&str, (i64, f64, usize)> = HashMap::new();

    for trade in trades {
        let entry = daily_map
            .entry(trade.date.as_str())
            .or_insert((trade.timestamp(), 0.0, 0));
        entry.0 = entry.0.min(trade.timestamp());
        entry.1 += trade.pnl();
        entry.2 += 1;
    }

    let mut days: Vec<_> = daily_map.into_iter().collect();
    days.sort_by_key(|(_, (first_ts, _, _))| *first_ts);

    let mut cumulative_pnl = 0.0;
    days.into_iter()
        .map(|(date, (_, daily_pnl, trade_count))| {
            cumulative_pnl += daily_pnl;
            EquityCurvePoint {
                date: date.to_string(),
                cumulative_pnl,
                daily_pnl,
                trade_count,
            }
        })
        .collect()
}

/// Per-strategy results, best total P&L first
pub fn strategy_breakdown<'a, I>(trades: I) -> Vec<StrategyBreakdown>
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut rows: Vec<StrategyBreakdown> = Vec::new();

    for trade in trades {
        let idx = match rows.iter().position(|r| r.strategy == trade.strategy) {
            Some(idx) => idx,
            None => {
                rows.push(StrategyBreakdown {
                    strategy: trade.strategy.clone(),
                    trades: 0,
                    wins: 0,
                    total_pnl: 0.0,
                    win_rate: 0.0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[idx];
        row.trades += 1;
        row.total_pnl += trade.pnl();
        if trade.is_win() {
            row.wins += 1;
        }
    }

    for row in &mut rows {
        row.win_rate = (row.wins as f64 / row.trades as f64) * 100.0;
    }
    rows.sort_by(|a, b| b.total_pnl.total_cmp(&a.total_pnl));
    rows
}
