use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use controller::ControllerConfig;
use market::{BookConfig, TrendConfig};
use trade::ExchangeCredentials;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// JSON log output (APP_ENV=production).
    pub json_logs: bool,

    // =========================
    // Observer channel
    // =========================
    /// Address the status WebSocket listens on.
    pub notifier_addr: String,

    // =========================
    // Trading loop
    // =========================
    /// Tick cadence and warm-up before the first arming.
    pub controller: ControllerConfig,

    // =========================
    // Market data
    // =========================
    /// Match stream to feed the order book from. Without it the book stays
    /// empty and the loop never reports status.
    pub feed_url: Option<String>,

    /// Optional frame sent after connecting to the feed.
    pub feed_subscribe: Option<String>,

    /// Moving-average windows and trend thresholds.
    pub book: BookConfig,

    // =========================
    // Exchange
    // =========================
    /// Handed to the trade settlement source; validated during its init.
    pub credentials: ExchangeCredentials,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, applying defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ControllerConfig::default();
        let book_defaults = BookConfig::default();
        let trend_defaults = TrendConfig::default();

        let controller = ControllerConfig {
            tick_interval: Duration::from_millis(parse_or(
                &lookup,
                "TICK_INTERVAL_MS",
                defaults.tick_interval.as_millis() as u64,
            )?),
            warmup: Duration::from_millis(parse_or(
                &lookup,
                "WARMUP_MS",
                defaults.warmup.as_millis() as u64,
            )?),
            ..defaults
        };

        if controller.tick_interval.is_zero() {
            anyhow::bail!("TICK_INTERVAL_MS must be greater than zero");
        }

        let book = BookConfig {
            trend: TrendConfig {
                threshold_bps: parse_or(
                    &lookup,
                    "TREND_THRESHOLD_BPS",
                    trend_defaults.threshold_bps,
                )?,
                ..trend_defaults
            },
            ..book_defaults
        };

        Ok(Self {
            json_logs: lookup("APP_ENV").is_some_and(|v| v == "production"),
            notifier_addr: lookup("NOTIFIER_ADDR").unwrap_or_else(|| "0.0.0.0:8888".to_string()),
            controller,
            feed_url: lookup("FEED_URL").filter(|v| !v.is_empty()),
            feed_subscribe: lookup("FEED_SUBSCRIBE").filter(|v| !v.is_empty()),
            book,
            credentials: ExchangeCredentials {
                api_key: lookup("EXCHANGE_API_KEY").unwrap_or_default(),
                api_secret: lookup("EXCHANGE_API_SECRET").unwrap_or_default(),
                passphrase: lookup("EXCHANGE_PASSPHRASE").unwrap_or_default(),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
