use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CAPITAL: f64 = 100_000.0;

/// Strategies offered before the user adds any of their own
pub const INITIAL_STRATEGIES: [&str; 9] = [
    "ORB",
    "Gap Fill",
    "VWAP Rejection",
    "BTST",
    "Expiry HeroZero",
    "Scalp",
    "Swing",
    "Price Action",
    "Support/Resistance",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub capital: f64,
    #[serde(default)]
    pub strategies: Vec<String>, // User-added, on top of INITIAL_STRATEGIES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capital: DEFAULT_CAPITAL,
            strategies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl Profile {
    pub fn demo() -> Self {
        Self {
            uid: "demo".to_string(),
            display_name: Some("Demo Trader".to_string()),
            email: Some("demo@local".to_string()),
            photo_url: None,
        }
    }
}

/// New profile photo: either a URL to use as-is or a local image file
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoSource {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo: Option<PhotoSource>,
}
