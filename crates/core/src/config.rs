use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bitmex: BitmexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitmexConfig {
    pub base_url: String,
    pub symbol: String,
    pub settlement_currency: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bitmex: BitmexConfig {
                base_url: "https://www.bitmex.com".to_string(),
                symbol: "XBTUSD".to_string(),
                settlement_currency: "XBt".to_string(),
            },
        }
    }
}
