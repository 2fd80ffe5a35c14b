use clap::Args;

use crate::error::JournalResult;
use crate::journal::Journal;
use crate::models::{Trade, TradeFormData, TradeType};

/// Field overrides for `edit`; unset fields keep their current value
#[derive(Debug, Clone, Default, Args)]
pub struct TradeEdit {
    #[arg(long)]
    pub symbol: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub time: Option<String>,
    /// LONG or SHORT
    #[arg(long = "type")]
    pub trade_type: Option<TradeType>,
    #[arg(long)]
    pub entry: Option<String>,
    #[arg(long)]
    pub exit: Option<String>,
    #[arg(long)]
    pub qty: Option<String>,
    #[arg(long)]
    pub strategy: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl TradeEdit {
    fn apply(self, form: &mut TradeFormData) {
        if let Some(v) = self.symbol {
            form.symbol = v;
        }
        if let Some(v) = self.date {
            form.date = v;
        }
        if let Some(v) = self.time {
            form.time = v;
        }
        if let Some(v) = self.trade_type {
            form.trade_type = v;
        }
        if let Some(v) = self.entry {
            form.entry = v;
        }
        if let Some(v) = self.exit {
            form.exit = v;
        }
        if let Some(v) = self.qty {
            form.qty = v;
        }
        if let Some(v) = self.strategy {
            form.strategy = v;
        }
        if let Some(v) = self.notes {
            form.notes = v;
        }
    }
}

pub async fn add_trade(journal: &mut Journal, form: TradeFormData) -> JournalResult<Trade> {
    journal.save_trade(&form, None).await
}

/// Load the trade into an edit form, overlay the changes and save it back
pub async fn edit_trade(journal: &mut Journal, id: &str, edit: TradeEdit) -> JournalResult<Trade> {
    let mut form = journal.trade(id)?.to_form()?;
    edit.apply(&mut form);
    journal.save_trade(&form, Some(id)).await
}

pub async fn delete_trade(journal: &mut Journal, id: &str) -> JournalResult<()> {
    journal.delete_trade(id).await
}

/// Plain-text trade table, one row per trade in the given order
pub fn render_trades(trades: &[&Trade]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<5} {:<20} {:<5} {:>8} {:>10} {:>10} {:>12}  {:<18} {}\n",
        "DATE", "TIME", "SYMBOL", "TYPE", "QTY", "ENTRY", "EXIT", "P&L", "STRATEGY", "ID"
    ));
    for t in trades {
        out.push_str(&format!(
            "{:<10} {:<5} {:<20} {:<5} {:>8} {:>10} {:>10} {:>12.2}  {:<18} {}\n",
            t.date,
            t.time,
            t.symbol,
            t.trade_type,
            t.qty,
            t.entry,
            t.exit,
            t.pnl(),
            t.strategy,
            t.id
        ));
    }
    out
}
