use serde::Deserialize;
use serde_json::json;

use super::error::{error_from_response, ApiError};
use super::throttle::RequestThrottle;
use crate::config::GeminiConfig;
use crate::models::Trade;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Generative-text client that reviews a set of trades
pub struct GeminiClient {
    api_key: String,
    model: String,
    http_client: reqwest::Client,
    throttle: RequestThrottle,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http_client: reqwest::Client::new(),
            throttle: RequestThrottle::per_minute(config.requests_per_minute),
        }
    }

    /// Ask the model for feedback on `trades` and return its text
    pub async fn analyze(
        &self,
        trades: &[&Trade],
        total_pnl: f64,
        win_rate: f64,
        period: &str,
    ) -> Result<String, ApiError> {
        let prompt = build_prompt(trades, total_pnl, win_rate, period);

        self.throttle.acquire().await;
        log::info!("Requesting analysis of {} trades ({})", trades.len(), period);

        let response = self
            .http_client
            .post(format!("{}/{}:generateContent", BASE_URL, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("gemini", response).await);
        }

        let body: GenerateResponse = response.json().await?;
        extract_text(body)
    }
}

pub fn build_prompt(trades: &[&Trade], total_pnl: f64, win_rate: f64, period: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a trading coach reviewing an Indian market trader's journal for the period: {}.\n",
        period
    ));
    prompt.push_str(&format!(
        "Summary: {} trades, total P&L ₹{:.2}, win rate {:.1}%.\n",
        trades.len(),
        total_pnl,
        win_rate
    ));
    prompt.push_str("\nTrades (date time | symbol | side | qty | entry -> exit | P&L | strategy | notes):\n");
    for t in trades {
        prompt.push_str(&format!(
            "- {} {} | {} | {} | {} | {} -> {} | {:.2} | {} | {}\n",
            t.date,
            t.time,
            t.symbol,
            t.trade_type,
            t.qty,
            t.entry,
            t.exit,
            t.pnl(),
            if t.strategy.is_empty() { "-" } else { t.strategy.as_str() },
            if t.notes.is_empty() { "-" } else { t.notes.as_str() },
        ));
    }
    prompt.push_str(
        "\nIdentify recurring mistakes and strengths, comment on risk management and \
         strategy selection, and give three concrete improvements. Keep it concise.",
    );
    prompt
}

fn extract_text(response: GenerateResponse) -> Result<String, ApiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ApiError::EmptyResponse("gemini"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TradeFormData, TradeType};

    fn trade(symbol: &str, entry: &str, exit: &str, notes: &str) -> Trade {
        Trade::from_form(
            symbol,
            &TradeFormData {
                symbol: symbol.to_string(),
                date: "2024-03-15".to_string(),
                time: "09:30".to_string(),
                trade_type: TradeType::Long,
                entry: entry.to_string(),
                exit: exit.to_string(),
                qty: "10".to_string(),
                strategy: "ORB".to_string(),
                notes: notes.to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_build_prompt() {
        let a = trade("RELIANCE", "2900", "2950", "Clean breakout");
        let b = trade("TCS", "4000", "3980", "");
        let prompt = build_prompt(&[&a, &b], 300.0, 50.0, "All Time");

        assert!(prompt.contains("period: All Time"));
        assert!(prompt.contains("2 trades, total P&L ₹300.00, win rate 50.0%"));
        assert!(prompt.contains("- 15/03/2024 09:30 | RELIANCE | LONG | 10 | 2900 -> 2950 | 500.00 | ORB | Clean breakout"));
        assert!(prompt.contains("| TCS | LONG | 10 | 4000 -> 3980 | -200.00 | ORB | -"));
    }

    #[test]
    fn test_extract_text() {
        let json = r#"{
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Cut losers " }, { "text": "faster." }] },
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_text(response).unwrap(), "Cut losers faster.");
    }

    #[test]
    fn test_extract_text_empty() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(extract_text(response), Err(ApiError::EmptyResponse("gemini"))));

        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(matches!(extract_text(response), Err(ApiError::EmptyResponse(_))));
    }
}
