use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory the JSON persistence backend writes into.
    pub data_dir: PathBuf,

    // Symbol lookup (optional — search falls back to a static list)
    pub finnhub_api_key: Option<String>,

    // Periodic refresh
    pub refresh_enabled: bool,
    pub refresh_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),

            finnhub_api_key: env::var("FINNHUB_API_KEY").ok(),

            refresh_enabled: env::var("REFRESH_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),
        })
    }
}
