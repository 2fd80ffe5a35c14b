use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{JournalError, JournalResult};

/// Storage form of a trade date
pub const STORAGE_DATE_FORMAT: &str = "%d/%m/%Y";
/// Edit-form (and filter) form of a trade date
pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";
/// Time assumed for ordering when a trade has no time of day
pub const DEFAULT_TIME: &str = "12:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Long,
    Short,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Long => "LONG",
            TradeType::Short => "SHORT",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(TradeType::Long),
            "SHORT" => Ok(TradeType::Short),
            other => Err(JournalError::Validation(format!(
                "type must be LONG or SHORT, got '{}'",
                other
            ))),
        }
    }
}

/// A logged round-trip trade.
///
/// `pnl` and `timestamp` are derived at save time and only ever written by
/// [`Trade::from_form`]; stores persist them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub date: String, // DD/MM/YYYY
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub(crate) timestamp: i64, // Unix milliseconds
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub entry: String,
    pub exit: String,
    pub qty: String,
    pub(crate) pnl: f64,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub notes: String,
}

/// Trade as typed into the entry form (date in YYYY-MM-DD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFormData {
    pub symbol: String,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub entry: String,
    pub exit: String,
    pub qty: String,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub notes: String,
}

impl Trade {
    /// Build a trade from form input, validating every field and deriving
    /// `pnl` and `timestamp`. Used for both create and edit.
    pub fn from_form(id: impl Into<String>, form: &TradeFormData) -> JournalResult<Self> {
        let symbol = form.symbol.trim();
        if symbol.is_empty() {
            return Err(JournalError::Validation("symbol is required".to_string()));
        }

        let entry = parse_number("entry", &form.entry)?;
        let exit = parse_number("exit", &form.exit)?;
        let qty = parse_number("qty", &form.qty)?;

        let date = NaiveDate::parse_from_str(form.date.trim(), FORM_DATE_FORMAT).map_err(|_| {
            JournalError::Validation(format!("date must be YYYY-MM-DD, got '{}'", form.date))
        })?;
        let time = form.time.trim();
        let time_of_day = parse_time(if time.is_empty() { DEFAULT_TIME } else { time })?;

        let pnl = compute_pnl(form.trade_type, entry, exit, qty);
        if !pnl.is_finite() {
            return Err(JournalError::Validation(format!(
                "P&L overflows for entry {}, exit {} and qty {}",
                form.entry.trim(),
                form.exit.trim(),
                form.qty.trim()
            )));
        }

        Ok(Trade {
            id: id.into(),
            date: date.format(STORAGE_DATE_FORMAT).to_string(),
            time: time.to_string(),
            timestamp: local_timestamp_millis(date.and_time(time_of_day)),
            symbol: symbol.to_string(),
            trade_type: form.trade_type,
            entry: form.entry.trim().to_string(),
            exit: form.exit.trim().to_string(),
            qty: form.qty.trim().to_string(),
            pnl,
            strategy: form.strategy.trim().to_string(),
            notes: form.notes.clone(),
        })
    }

    /// Convert back into edit-form data (DD/MM/YYYY -> YYYY-MM-DD)
    pub fn to_form(&self) -> JournalResult<TradeFormData> {
        let date = NaiveDate::parse_from_str(&self.date, STORAGE_DATE_FORMAT)
            .map(|d| d.format(FORM_DATE_FORMAT).to_string())
            .map_err(|_| {
                JournalError::Validation(format!(
                    "trade {} has a malformed stored date '{}'",
                    self.id, self.date
                ))
            })?;

        Ok(TradeFormData {
            symbol: self.symbol.clone(),
            date,
            time: self.time.clone(),
            trade_type: self.trade_type,
            entry: self.entry.clone(),
            exit: self.exit.clone(),
            qty: self.qty.clone(),
            strategy: self.strategy.clone(),
            notes: self.notes.clone(),
        })
    }

    pub fn pnl(&self) -> f64 {
        self.pnl
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}

/// New client-side trade id
pub fn generate_trade_id() -> String {
    format!(
        "TRADE-{}-{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4()
    )
}

pub fn compute_pnl(trade_type: TradeType, entry: f64, exit: f64, qty: f64) -> f64 {
    match trade_type {
        TradeType::Long => (exit - entry) * qty,
        TradeType::Short => (entry - exit) * qty,
    }
}

/// Convert a YYYY-MM-DD date into the DD/MM/YYYY storage form
pub fn form_to_storage_date(date: &NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}

fn parse_number(field: &str, value: &str) -> JournalResult<f64> {
    let parsed = value.trim().parse::<f64>().map_err(|_| {
        JournalError::Validation(format!("{} must be a number, got '{}'", field, value))
    })?;
    if !parsed.is_finite() {
        return Err(JournalError::Validation(format!(
            "{} must be a finite number, got '{}'",
            field, value
        )));
    }
    Ok(parsed)
}

fn parse_time(value: &str) -> JournalResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| JournalError::Validation(format!("time must be HH:MM, got '{}'", value)))
}

fn local_timestamp_millis(naive: NaiveDateTime) -> i64 {
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp_millis(),
        // Skipped by a DST transition
        None => naive.and_utc().timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(trade_type: TradeType, entry: &str, exit: &str, qty: &str) -> TradeFormData {
        TradeFormData {
            symbol: "NIFTY".to_string(),
            date: "2024-03-15".to_string(),
            time: "09:30".to_string(),
            trade_type,
            entry: entry.to_string(),
            exit: exit.to_string(),
            qty: qty.to_string(),
            strategy: "ORB".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_long_pnl() {
        let trade = Trade::from_form("t1", &form(TradeType::Long, "100", "120", "10")).unwrap();
        assert_eq!(trade.pnl(), 200.0);
    }

    #[test]
    fn test_short_pnl() {
        let trade = Trade::from_form("t1", &form(TradeType::Short, "100", "90", "5")).unwrap();
        assert_eq!(trade.pnl(), 50.0);
    }

    #[test]
    fn test_losing_long_is_negative() {
        let trade = Trade::from_form("t1", &form(TradeType::Long, "250.5", "240.5", "4")).unwrap();
        assert_eq!(trade.pnl(), -40.0);
    }

    #[test]
    fn test_date_stored_in_display_form() {
        let trade = Trade::from_form("t1", &form(TradeType::Long, "1", "2", "1")).unwrap();
        assert_eq!(trade.date, "15/03/2024");
        assert_eq!(trade.to_form().unwrap().date, "2024-03-15");
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        for (entry, exit, qty) in [("abc", "1", "1"), ("1", "", "1"), ("1", "1", "NaN"), ("inf", "1", "1")] {
            let result = Trade::from_form("t1", &form(TradeType::Long, entry, exit, qty));
            assert!(
                matches!(result, Err(JournalError::Validation(_))),
                "expected rejection for {:?}",
                (entry, exit, qty)
            );
        }
    }

    #[test]
    fn test_rejects_overflowing_pnl() {
        let result = Trade::from_form("t1", &form(TradeType::Long, "-1e308", "1e308", "10"));
        assert!(matches!(result, Err(JournalError::Validation(_))));

        let result = Trade::from_form("t1", &form(TradeType::Short, "1e308", "-1e308", "1e10"));
        assert!(matches!(result, Err(JournalError::Validation(_))));
    }

    #[test]
    fn test_to_form_names_trade_with_malformed_date() {
        let mut trade = Trade::from_form("t1", &form(TradeType::Long, "1", "2", "1")).unwrap();
        trade.date = "2024-03-15".to_string();

        match trade.to_form() {
            Err(JournalError::Validation(msg)) => {
                assert!(msg.contains("t1"));
                assert!(msg.contains("2024-03-15"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_blank_symbol_and_bad_date() {
        let mut f = form(TradeType::Long, "1", "2", "1");
        f.symbol = "   ".to_string();
        assert!(Trade::from_form("t1", &f).is_err());

        let mut f = form(TradeType::Long, "1", "2", "1");
        f.date = "15/03/2024".to_string();
        assert!(Trade::from_form("t1", &f).is_err());

        let mut f = form(TradeType::Long, "1", "2", "1");
        f.time = "late".to_string();
        assert!(Trade::from_form("t1", &f).is_err());
    }

    #[test]
    fn test_missing_time_orders_at_noon() {
        let mut morning = form(TradeType::Long, "1", "2", "1");
        morning.time = "11:59".to_string();
        let mut untimed = form(TradeType::Long, "1", "2", "1");
        untimed.time = String::new();
        let mut afternoon = form(TradeType::Long, "1", "2", "1");
        afternoon.time = "12:01".to_string();

        let morning = Trade::from_form("a", &morning).unwrap();
        let untimed = Trade::from_form("b", &untimed).unwrap();
        let afternoon = Trade::from_form("c", &afternoon).unwrap();

        assert!(morning.timestamp() < untimed.timestamp());
        assert!(untimed.timestamp() < afternoon.timestamp());
        assert_eq!(untimed.time, "");
    }

    #[test]
    fn test_edit_round_trip_recomputes_pnl() {
        let trade = Trade::from_form("t1", &form(TradeType::Long, "100", "120", "10")).unwrap();
        let mut edit = trade.to_form().unwrap();
        edit.trade_type = TradeType::Short;
        let edited = Trade::from_form(trade.id.clone(), &edit).unwrap();
        assert_eq!(edited.id, "t1");
        assert_eq!(edited.pnl(), -200.0);
    }

    #[test]
    fn test_trade_type_parsing_and_serde() {
        assert_eq!("long".parse::<TradeType>().unwrap(), TradeType::Long);
        assert_eq!("SHORT".parse::<TradeType>().unwrap(), TradeType::Short);
        assert!("FLAT".parse::<TradeType>().is_err());

        let trade = Trade::from_form("t1", &form(TradeType::Short, "100", "90", "5")).unwrap();
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["type"], "SHORT");
        assert_eq!(json["pnl"], 50.0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_trade_id();
        let b = generate_trade_id();
        assert!(a.starts_with("TRADE-"));
        assert_ne!(a, b);
    }
}
