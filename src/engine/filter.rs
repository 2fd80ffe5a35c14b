use crate::models::{Trade, TradeFilters};

/// Keep trades matching every active criterion, in input order.
pub fn filter_trades<'a>(trades: &'a [Trade], filters: &TradeFilters) -> Vec<&'a Trade> {
    let date = filters.storage_date();

    trades
        .iter()
        .filter(|t| date.as_deref().map_or(true, |d| t.date == d))
        .filter(|t| filters.strategy.as_deref().map_or(true, |s| t.strategy == s))
        .collect()
}
