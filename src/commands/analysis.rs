use crate::api::GeminiClient;
use crate::error::{JournalError, JournalResult};
use crate::journal::Journal;

/// Ask the model to review the filtered trades. An empty view is refused
/// before any request is made.
pub async fn analyze_trades(journal: &Journal, client: &GeminiClient) -> JournalResult<String> {
    let trades = journal.filtered_trades();
    if trades.is_empty() {
        return Err(JournalError::NothingToAnalyze);
    }

    let stats = journal.stats();
    let period = journal.filters().period_label();
    Ok(client
        .analyze(&trades, stats.total_pnl, stats.win_rate, &period)
        .await?)
}
