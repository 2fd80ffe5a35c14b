//! Session state: the loaded trades, settings and active filters on top of a
//! storage backend.
//!
//! Mutations go to the store first; the in-memory list only changes once the
//! store has accepted the write, and is then re-sorted newest first.

use crate::engine::{self, EquityCurvePoint, Stats, StrategyBreakdown};
use crate::error::{JournalError, JournalResult};
use crate::models::{
    generate_trade_id, Settings, Trade, TradeFilters, TradeFormData, INITIAL_STRATEGIES,
};
use crate::store::{StorageMode, TradeStore};

pub struct Journal {
    store: Box<dyn TradeStore>,
    trades: Vec<Trade>,
    settings: Settings,
    filters: TradeFilters,
}

impl Journal {
    pub async fn open(store: Box<dyn TradeStore>) -> JournalResult<Self> {
        let trades = store.load_trades().await?;
        let settings = store.load_settings().await?;
        log::info!(
            "Opened {} journal with {} trades",
            store.mode(),
            trades.len()
        );

        let mut journal = Self {
            store,
            trades,
            settings,
            filters: TradeFilters::default(),
        };
        journal.sort_trades();
        Ok(journal)
    }

    pub fn mode(&self) -> StorageMode {
        self.store.mode()
    }

    pub fn store(&self) -> &dyn TradeStore {
        self.store.as_ref()
    }

    /// All trades, newest first
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn trade(&self, id: &str) -> JournalResult<&Trade> {
        self.trades
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| JournalError::NotFound(format!("Trade {}", id)))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Create a trade, or replace `editing_id` when given. P&L and timestamp
    /// are always recomputed from the form.
    pub async fn save_trade(
        &mut self,
        form: &TradeFormData,
        editing_id: Option<&str>,
    ) -> JournalResult<Trade> {
        let trade = match editing_id {
            Some(id) => {
                let trade = Trade::from_form(id, form)?;
                self.store.update_trade(&trade).await?;
                match self.trades.iter_mut().find(|t| t.id == id) {
                    Some(existing) => *existing = trade.clone(),
                    None => self.trades.push(trade.clone()),
                }
                trade
            }
            None => {
                let trade = Trade::from_form(generate_trade_id(), form)?;
                self.store.create_trade(&trade).await?;
                self.trades.push(trade.clone());
                trade
            }
        };

        self.sort_trades();
        Ok(trade)
    }

    pub async fn delete_trade(&mut self, id: &str) -> JournalResult<()> {
        self.store.delete_trade(id).await?;
        self.trades.retain(|t| t.id != id);
        Ok(())
    }

    /// Insert or replace each trade, rebuilding it from its form data.
    /// Every trade is validated before the first write. Returns the number of
    /// trades written.
    pub async fn import_trades(&mut self, trades: &[Trade]) -> JournalResult<usize> {
        let rebuilt = trades
            .iter()
            .map(|source| Trade::from_form(source.id.clone(), &source.to_form()?))
            .collect::<JournalResult<Vec<_>>>()?;

        let result = self.write_imported(rebuilt).await;
        // Trades written before a store failure stay in the list
        self.sort_trades();

        let imported = result?;
        log::info!("Imported {} trades", imported);
        Ok(imported)
    }

    async fn write_imported(&mut self, trades: Vec<Trade>) -> JournalResult<usize> {
        let mut imported = 0;
        for trade in trades {
            match self.trades.iter().position(|t| t.id == trade.id) {
                Some(index) => {
                    self.store.update_trade(&trade).await?;
                    self.trades[index] = trade;
                }
                None => {
                    self.store.create_trade(&trade).await?;
                    self.trades.push(trade);
                }
            }
            imported += 1;
        }
        Ok(imported)
    }

    pub fn filters(&self) -> &TradeFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: TradeFilters) {
        self.filters = filters;
    }

    /// Trades matching the active filters, newest first
    pub fn filtered_trades(&self) -> Vec<&Trade> {
        engine::filter_trades(&self.trades, &self.filters)
    }

    /// Dashboard figures for the filtered view against the configured capital
    pub fn stats(&self) -> Stats {
        engine::compute_stats(self.filtered_trades(), self.settings.capital)
    }

    pub fn equity_curve(&self) -> Vec<EquityCurvePoint> {
        engine::equity_curve(self.filtered_trades())
    }

    pub fn strategy_breakdown(&self) -> Vec<StrategyBreakdown> {
        engine::strategy_breakdown(self.filtered_trades())
    }

    pub async fn set_capital(&mut self, capital: f64) -> JournalResult<()> {
        if !capital.is_finite() {
            return Err(JournalError::Validation(format!(
                "capital must be a finite number, got {}",
                capital
            )));
        }

        let settings = Settings {
            capital,
            ..self.settings.clone()
        };
        self.store.save_settings(&settings).await?;
        self.settings = settings;
        Ok(())
    }

    pub async fn replace_settings(&mut self, settings: Settings) -> JournalResult<()> {
        if !settings.capital.is_finite() {
            return Err(JournalError::Validation("capital must be a finite number".to_string()));
        }
        self.store.save_settings(&settings).await?;
        self.settings = settings;
        Ok(())
    }

    /// Built-in strategies, then user-added ones, then any only seen on trades
    pub fn strategies(&self) -> Vec<String> {
        let mut strategies: Vec<String> = Vec::new();
        let candidates = INITIAL_STRATEGIES
            .iter()
            .copied()
            .chain(self.settings.strategies.iter().map(String::as_str))
            .chain(self.trades.iter().map(|t| t.strategy.as_str()));

        for name in candidates {
            if !name.is_empty() && !strategies.iter().any(|s| s == name) {
                strategies.push(name.to_string());
            }
        }
        strategies
    }

    /// Add a custom strategy. Returns false when it is already known.
    pub async fn add_strategy(&mut self, name: &str) -> JournalResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JournalError::Validation("strategy name is required".to_string()));
        }
        if self.strategies().iter().any(|s| s == name) {
            return Ok(false);
        }

        let mut settings = self.settings.clone();
        settings.strategies.push(name.to_string());
        self.store.save_settings(&settings).await?;
        self.settings = settings;
        Ok(true)
    }

    fn sort_trades(&mut self) {
        // Stable, so equal timestamps keep insertion order
        self.trades.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeType, DEFAULT_CAPITAL};
    use crate::store::LocalStore;

    fn form(date: &str, time: &str, entry: &str, exit: &str, strategy: &str) -> TradeFormData {
        TradeFormData {
            symbol: "BANKNIFTY".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            trade_type: TradeType::Long,
            entry: entry.to_string(),
            exit: exit.to_string(),
            qty: "10".to_string(),
            strategy: strategy.to_string(),
            notes: String::new(),
        }
    }

    async fn journal() -> Journal {
        Journal::open(Box::new(LocalStore::in_memory().unwrap()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_empty() {
        let journal = journal().await;
        assert_eq!(journal.mode(), StorageMode::Local);
        assert!(journal.trades().is_empty());
        assert_eq!(journal.settings().capital, DEFAULT_CAPITAL);

        let stats = journal.stats();
        assert_eq!(stats.total_trades, 0);
        assert_eq!(stats.current_capital, DEFAULT_CAPITAL);
    }

    #[tokio::test]
    async fn test_trades_sorted_newest_first() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-14", "10:00", "100", "110", "ORB"), None).await.unwrap();
        journal.save_trade(&form("2024-03-16", "09:15", "100", "90", "Scalp"), None).await.unwrap();
        journal.save_trade(&form("2024-03-15", "", "100", "105", "ORB"), None).await.unwrap();

        let dates: Vec<&str> = journal.trades().iter().map(|t| t.date.as_str()).collect();
        assert_eq!(dates, vec!["16/03/2024", "15/03/2024", "14/03/2024"]);
    }

    #[tokio::test]
    async fn test_edit_recomputes_and_resorts() {
        let mut journal = journal().await;
        let first = journal.save_trade(&form("2024-03-14", "10:00", "100", "110", "ORB"), None).await.unwrap();
        journal.save_trade(&form("2024-03-15", "10:00", "100", "110", "ORB"), None).await.unwrap();

        let mut edit = first.to_form().unwrap();
        edit.date = "2024-03-20".to_string();
        edit.exit = "95".to_string();
        let edited = journal.save_trade(&edit, Some(&first.id)).await.unwrap();

        assert_eq!(edited.id, first.id);
        assert_eq!(edited.pnl(), -50.0);
        assert_eq!(journal.trades().len(), 2);
        assert_eq!(journal.trades()[0].id, first.id);
        assert_eq!(journal.store().load_trades().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_unknown_id_leaves_state_untouched() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-14", "10:00", "100", "110", "ORB"), None).await.unwrap();

        let result = journal
            .save_trade(&form("2024-03-14", "10:00", "1", "2", "ORB"), Some("missing"))
            .await;
        assert!(matches!(result, Err(JournalError::NotFound(_))));
        assert_eq!(journal.trades().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_stored() {
        let mut journal = journal().await;
        let result = journal
            .save_trade(&form("2024-03-14", "10:00", "abc", "110", "ORB"), None)
            .await;
        assert!(matches!(result, Err(JournalError::Validation(_))));
        assert!(journal.trades().is_empty());
        assert!(journal.store().load_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let mut journal = journal().await;
        let trade = journal.save_trade(&form("2024-03-14", "10:00", "100", "110", "ORB"), None).await.unwrap();

        journal.delete_trade(&trade.id).await.unwrap();
        assert!(journal.trades().is_empty());
        assert!(matches!(
            journal.delete_trade(&trade.id).await,
            Err(JournalError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_filtered_stats() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-14", "10:00", "100", "150", "ORB"), None).await.unwrap();
        journal.save_trade(&form("2024-03-14", "11:00", "100", "80", "Scalp"), None).await.unwrap();
        journal.save_trade(&form("2024-03-15", "10:00", "100", "130", "ORB"), None).await.unwrap();

        assert_eq!(journal.stats().total_pnl, 600.0);

        journal.set_filters(TradeFilters::new(Some("2024-03-14"), None).unwrap());
        let stats = journal.stats();
        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.total_pnl, 300.0);
        assert_eq!(stats.win_rate, 50.0);

        journal.set_filters(TradeFilters::new(Some("2024-03-14"), Some("ORB")).unwrap());
        assert_eq!(journal.filtered_trades().len(), 1);
        assert_eq!(journal.strategy_breakdown().len(), 1);

        journal.set_filters(TradeFilters::default());
        assert_eq!(journal.equity_curve().len(), 2);
    }

    #[tokio::test]
    async fn test_capital_drives_roi() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-14", "10:00", "100", "150", "ORB"), None).await.unwrap();

        journal.set_capital(50_000.0).await.unwrap();
        let stats = journal.stats();
        assert_eq!(stats.current_capital, 50_500.0);
        assert!((stats.roi - 1.0).abs() < 1e-9);

        assert!(journal.set_capital(f64::NAN).await.is_err());
        assert_eq!(journal.store().load_settings().await.unwrap().capital, 50_000.0);
    }

    #[tokio::test]
    async fn test_strategies_union() {
        let mut journal = journal().await;
        assert_eq!(journal.strategies().len(), INITIAL_STRATEGIES.len());

        assert!(journal.add_strategy("  Breakout ").await.unwrap());
        assert!(!journal.add_strategy("Breakout").await.unwrap());
        assert!(!journal.add_strategy("ORB").await.unwrap());
        assert!(journal.add_strategy("   ").await.is_err());

        journal.save_trade(&form("2024-03-14", "10:00", "1", "2", "Momentum"), None).await.unwrap();
        journal.save_trade(&form("2024-03-14", "10:00", "1", "2", ""), None).await.unwrap();

        let strategies = journal.strategies();
        assert_eq!(strategies[0], "ORB");
        assert_eq!(strategies[INITIAL_STRATEGIES.len()], "Breakout");
        assert_eq!(strategies.last().map(String::as_str), Some("Momentum"));
        assert_eq!(strategies.len(), INITIAL_STRATEGIES.len() + 2);
        assert_eq!(journal.store().load_settings().await.unwrap().strategies, vec!["Breakout"]);
    }

    #[tokio::test]
    async fn test_import_upserts_and_recomputes() {
        let mut journal = journal().await;
        let existing = journal.save_trade(&form("2024-03-14", "10:00", "100", "110", "ORB"), None).await.unwrap();

        let mut changed = existing.clone();
        changed.exit = "120".to_string();
        changed.pnl = 0.0;
        let fresh = Trade::from_form("TRADE-imported", &form("2024-03-10", "09:30", "50", "40", "Scalp")).unwrap();

        let count = journal.import_trades(&[changed, fresh]).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(journal.trades().len(), 2);
        assert_eq!(journal.trade(&existing.id).unwrap().pnl(), 200.0);
        assert_eq!(journal.trades()[1].id, "TRADE-imported");
        assert_eq!(journal.store().load_trades().await.unwrap().len(), 2);
    }

    fn is_sorted_newest_first(trades: &[Trade]) -> bool {
        trades.windows(2).all(|w| w[0].timestamp() >= w[1].timestamp())
    }

    #[tokio::test]
    async fn test_import_with_invalid_trade_writes_nothing() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-10", "10:00", "100", "110", "ORB"), None).await.unwrap();

        let newer = Trade::from_form("TRADE-newer", &form("2024-03-20", "10:00", "100", "110", "ORB")).unwrap();
        let mut bad = Trade::from_form("TRADE-bad", &form("2024-03-18", "10:00", "100", "110", "ORB")).unwrap();
        bad.entry = "abc".to_string();

        let result = journal.import_trades(&[newer, bad]).await;
        assert!(matches!(result, Err(JournalError::Validation(_))));
        assert_eq!(journal.trades().len(), 1);
        assert_eq!(journal.store().load_trades().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_store_failure_keeps_order() {
        let mut journal = journal().await;
        journal.save_trade(&form("2024-03-10", "10:00", "100", "110", "ORB"), None).await.unwrap();

        // Present in the store but not in the loaded list, so the create collides
        let hidden = Trade::from_form("TRADE-hidden", &form("2024-03-12", "10:00", "1", "2", "ORB")).unwrap();
        journal.store().create_trade(&hidden).await.unwrap();

        let newer = Trade::from_form("TRADE-newer", &form("2024-03-20", "10:00", "100", "110", "ORB")).unwrap();
        let result = journal.import_trades(&[newer, hidden]).await;

        assert!(result.is_err());
        assert_eq!(journal.trades().len(), 2);
        assert_eq!(journal.trades()[0].id, "TRADE-newer");
        assert!(is_sorted_newest_first(journal.trades()));
    }

    #[tokio::test]
    async fn test_overflowing_trade_is_not_saved() {
        let mut journal = journal().await;
        let mut overflow = form("2024-03-14", "10:00", "-1e308", "1e308", "ORB");
        overflow.qty = "10".to_string();

        let result = journal.save_trade(&overflow, None).await;
        assert!(matches!(result, Err(JournalError::Validation(_))));
        assert!(journal.trades().is_empty());
        assert!(journal.stats().roi.is_finite());
    }
}
