use super::types::{ArrayValue, Document, FieldValue, Fields};
use crate::api::error::ApiError;
use crate::models::{Settings, Trade, TradeType, DEFAULT_CAPITAL};

/// Map a trade document into a Trade. The id comes from the document name.
pub fn document_to_trade(doc: &Document) -> Result<Trade, ApiError> {
    let f = &doc.fields;
    let trade_type = string_field(f, "type")
        .parse::<TradeType>()
        .map_err(|e| ApiError::ParseError(format!("trade {}: {}", doc.id(), e)))?;

    Ok(Trade {
        id: doc.id().to_string(),
        date: string_field(f, "date"),
        time: string_field(f, "time"),
        timestamp: number_field(f, "timestamp").map(|ts| ts as i64).unwrap_or(0),
        symbol: string_field(f, "symbol"),
        trade_type,
        entry: string_field(f, "entry"),
        exit: string_field(f, "exit"),
        qty: string_field(f, "qty"),
        pnl: number_field(f, "pnl").unwrap_or(0.0),
        strategy: string_field(f, "strategy"),
        notes: string_field(f, "notes"),
    })
}

pub fn trade_to_fields(trade: &Trade) -> Fields {
    let mut fields = Fields::new();
    fields.insert("date".into(), string(&trade.date));
    fields.insert("time".into(), string(&trade.time));
    fields.insert("timestamp".into(), FieldValue::IntegerValue(trade.timestamp().to_string()));
    fields.insert("symbol".into(), string(&trade.symbol));
    fields.insert("type".into(), string(trade.trade_type.as_str()));
    fields.insert("entry".into(), string(&trade.entry));
    fields.insert("exit".into(), string(&trade.exit));
    fields.insert("qty".into(), string(&trade.qty));
    fields.insert("pnl".into(), FieldValue::DoubleValue(trade.pnl()));
    fields.insert("strategy".into(), string(&trade.strategy));
    fields.insert("notes".into(), string(&trade.notes));
    fields
}

/// Settings document; a missing document or missing field yields the default.
/// A stored capital of zero is kept.
pub fn document_to_settings(doc: Option<&Document>) -> Settings {
    let Some(doc) = doc else {
        return Settings::default();
    };

    let capital = number_field(&doc.fields, "capital").unwrap_or(DEFAULT_CAPITAL);
    let strategies = match doc.fields.get("strategies") {
        Some(FieldValue::ArrayValue(array)) => array
            .values
            .iter()
            .filter_map(|v| match v {
                FieldValue::StringValue(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Settings { capital, strategies }
}

pub fn settings_to_fields(settings: &Settings) -> Fields {
    let mut fields = Fields::new();
    fields.insert("capital".into(), FieldValue::DoubleValue(settings.capital));
    fields.insert(
        "strategies".into(),
        FieldValue::ArrayValue(ArrayValue {
            values: settings.strategies.iter().map(|s| string(s)).collect(),
        }),
    );
    fields
}

fn string(value: &str) -> FieldValue {
    FieldValue::StringValue(value.to_string())
}

/// Missing and null fields read as empty strings; numbers are rendered as text
fn string_field(fields: &Fields, key: &str) -> String {
    match fields.get(key) {
        Some(FieldValue::StringValue(s)) => s.clone(),
        Some(FieldValue::IntegerValue(i)) => i.clone(),
        Some(FieldValue::DoubleValue(d)) => d.to_string(),
        _ => String::new(),
    }
}

/// Integers may be stored as integerValue or doubleValue depending on the writer
fn number_field(fields: &Fields, key: &str) -> Option<f64> {
    match fields.get(key)? {
        FieldValue::DoubleValue(d) => Some(*d),
        FieldValue::IntegerValue(i) => i.parse::<i64>().ok().map(|i| i as f64),
        FieldValue::StringValue(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeFormData;

    fn sample_trade() -> Trade {
        Trade::from_form(
            "TRADE-1",
            &TradeFormData {
                symbol: "BANKNIFTY 48000 CE".to_string(),
                date: "2024-03-15".to_string(),
                time: "09:20".to_string(),
                trade_type: TradeType::Short,
                entry: "210.5".to_string(),
                exit: "180".to_string(),
                qty: "30".to_string(),
                strategy: "Expiry HeroZero".to_string(),
                notes: "Sold the \"spike\"".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_trade_fields_round_trip() {
        let trade = sample_trade();
        let mut doc = Document::with_fields(trade_to_fields(&trade));
        doc.name = "projects/p/databases/(default)/documents/artifacts/a/users/u/trades/TRADE-1".to_string();

        let mapped = document_to_trade(&doc).unwrap();
        assert_eq!(mapped, trade);
        assert_eq!(mapped.pnl(), 915.0);
    }

    #[test]
    fn test_integer_pnl_and_missing_fields() {
        // Documents written by other clients store whole numbers as integerValue
        let mut fields = Fields::new();
        fields.insert("date".into(), string("01/02/2024"));
        fields.insert("symbol".into(), string("INFY"));
        fields.insert("type".into(), string("LONG"));
        fields.insert("entry".into(), string("100"));
        fields.insert("exit".into(), string("120"));
        fields.insert("qty".into(), string("10"));
        fields.insert("pnl".into(), FieldValue::IntegerValue("200".to_string()));
        let mut doc = Document::with_fields(fields);
        doc.name = "x/trades/abc".to_string();

        let trade = document_to_trade(&doc).unwrap();
        assert_eq!(trade.id, "abc");
        assert_eq!(trade.pnl(), 200.0);
        assert_eq!(trade.timestamp(), 0);
        assert_eq!(trade.time, "");
        assert_eq!(trade.notes, "");
    }

    #[test]
    fn test_rejects_unknown_trade_type() {
        let mut fields = Fields::new();
        fields.insert("type".into(), string("FLAT"));
        let doc = Document::with_fields(fields);
        assert!(matches!(document_to_trade(&doc), Err(ApiError::ParseError(_))));
    }

    #[test]
    fn test_settings_mapping() {
        assert_eq!(document_to_settings(None), Settings::default());

        let settings = Settings {
            capital: 250_000.0,
            strategies: vec!["Breakout".to_string()],
        };
        let doc = Document::with_fields(settings_to_fields(&settings));
        assert_eq!(document_to_settings(Some(&doc)), settings);

        let mut fields = Fields::new();
        fields.insert("capital".into(), FieldValue::IntegerValue("50000".to_string()));
        let doc = Document::with_fields(fields);
        assert_eq!(document_to_settings(Some(&doc)).capital, 50_000.0);
    }

    #[test]
    fn test_zero_capital_is_kept() {
        let settings = Settings {
            capital: 0.0,
            strategies: Vec::new(),
        };
        let doc = Document::with_fields(settings_to_fields(&settings));
        assert_eq!(document_to_settings(Some(&doc)).capital, 0.0);

        let doc = Document::with_fields(Fields::new());
        assert_eq!(document_to_settings(Some(&doc)).capital, DEFAULT_CAPITAL);
    }
}
