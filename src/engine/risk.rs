use serde::{Deserialize, Serialize};

use crate::error::{JournalError, JournalResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub risk_amount: f64, // capital * risk_percent / 100
    pub risk_per_unit: f64,
    pub quantity: u64,
    pub position_value: f64,
}

/// Largest whole quantity whose loss at `stop_loss` stays within the risk budget
pub fn position_size(
    capital: f64,
    risk_percent: f64,
    entry: f64,
    stop_loss: f64,
) -> JournalResult<PositionSize> {
    if !(capital > 0.0) {
        return Err(JournalError::Validation("capital must be positive".to_string()));
    }
    if !(risk_percent > 0.0 && risk_percent <= 100.0) {
        return Err(JournalError::Validation(
            "risk percent must be within (0, 100]".to_string(),
        ));
    }
    if !entry.is_finite() || !stop_loss.is_finite() || entry <= 0.0 {
        return Err(JournalError::Validation("entry and stop loss must be valid prices".to_string()));
    }

    let risk_per_unit = (entry - stop_loss).abs();
    if risk_per_unit == 0.0 {
        return Err(JournalError::Validation(
            "stop loss must differ from entry".to_string(),
        ));
    }

    let risk_amount = capital * risk_percent / 100.0;
    let quantity = (risk_amount / risk_per_unit).floor() as u64;

    Ok(PositionSize {
        risk_amount,
        risk_per_unit,
        quantity,
        position_value: quantity as f64 * entry,
    })
}
