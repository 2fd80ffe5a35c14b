use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::{form_to_storage_date, FORM_DATE_FORMAT};
use crate::error::{JournalError, JournalResult};

/// Active list filters. Both criteria are exact-match; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilters {
    pub date: Option<NaiveDate>,
    pub strategy: Option<String>,
}

impl TradeFilters {
    /// Build filters from edit-form input. Empty strings clear a criterion.
    pub fn new(date: Option<&str>, strategy: Option<&str>) -> JournalResult<Self> {
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => Some(NaiveDate::parse_from_str(d, FORM_DATE_FORMAT).map_err(|_| {
                JournalError::Validation(format!("filter date must be YYYY-MM-DD, got '{}'", d))
            })?),
            None => None,
        };
        let strategy = strategy.filter(|s| !s.is_empty()).map(str::to_string);

        Ok(Self { date, strategy })
    }

    /// The date criterion in DD/MM/YYYY storage form
    pub fn storage_date(&self) -> Option<String> {
        self.date.as_ref().map(form_to_storage_date)
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.strategy.is_none()
    }

    /// Label used when describing the filtered period
    pub fn period_label(&self) -> String {
        match &self.date {
            Some(d) => d.format(FORM_DATE_FORMAT).to_string(),
            None => "All Time".to_string(),
        }
    }
}
