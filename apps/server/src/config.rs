use std::collections::HashMap;
use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context};
use bookshelf_core::constants::{
    DEFAULT_BASE_CURRENCY, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_STALENESS_SECS,
    DEFAULT_TRACKED_CURRENCIES,
};
use bookshelf_core::fx::{DisplayLocale, FxConfig};
use rust_decimal::Decimal;

/// Default interval of the background rate refresh (matches the staleness threshold)
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = DEFAULT_STALENESS_SECS;

/// Where exchange rates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum RatesSource {
    /// ExchangeRate-API; keyed endpoint when a key is set, open endpoint otherwise
    ExchangeRateApi {
        api_key: Option<String>,
        base_url: Option<String>,
    },
    /// Static rates from `BS_FIXED_RATES` (`USD=0.031,EUR=0.029`)
    Fixed(HashMap<String, Decimal>),
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub rates_source: RatesSource,
    pub fx: FxConfig,
    /// `None` disables the background refresh
    pub refresh_interval: Option<Duration>,
}

impl Config {
    /// Reads `.env` and `BS_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let listen_addr: SocketAddr = var("BS_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid BS_LISTEN_ADDR")?;
        let db_path = var("BS_DB_PATH").unwrap_or_else(|| "./db/bookshelf.db".into());
        let cors_allow = split_list(&var("BS_CORS_ALLOW_ORIGINS").unwrap_or_else(|| "*".into()));
        let timeout_ms: u64 =
            parse_or("BS_REQUEST_TIMEOUT_MS", var("BS_REQUEST_TIMEOUT_MS"), 30_000)?;

        let rates_source = match var("BS_RATES_PROVIDER").as_deref() {
            None | Some("exchangerate-api") => RatesSource::ExchangeRateApi {
                api_key: var("BS_RATES_API_KEY"),
                base_url: var("BS_RATES_BASE_URL"),
            },
            Some("fixed") => {
                RatesSource::Fixed(parse_fixed_rates(&var("BS_FIXED_RATES").unwrap_or_default())?)
            }
            Some(other) => return Err(anyhow!("Unknown BS_RATES_PROVIDER '{}'", other)),
        };

        let tracked_currencies = match var("BS_TRACKED_CURRENCIES") {
            Some(list) => split_list(&list),
            None => DEFAULT_TRACKED_CURRENCIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        };
        let staleness_secs = parse_or(
            "BS_RATE_STALENESS_SECS",
            var("BS_RATE_STALENESS_SECS"),
            DEFAULT_STALENESS_SECS,
        )?;
        let fetch_timeout_ms = parse_or(
            "BS_RATE_FETCH_TIMEOUT_MS",
            var("BS_RATE_FETCH_TIMEOUT_MS"),
            DEFAULT_FETCH_TIMEOUT_MS,
        )?;
        let locale = match var("BS_DISPLAY_LOCALE") {
            Some(raw) => raw.parse::<DisplayLocale>().map_err(|e| anyhow!(e))?,
            None => DisplayLocale::default(),
        };

        let fx = FxConfig {
            base_currency: var("BS_BASE_CURRENCY").unwrap_or_else(|| DEFAULT_BASE_CURRENCY.into()),
            tracked_currencies,
            staleness_threshold: Duration::from_secs(staleness_secs),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            locale,
        };

        let refresh_secs = parse_or(
            "BS_REFRESH_INTERVAL_SECS",
            var("BS_REFRESH_INTERVAL_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            rates_source,
            fx,
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", name, value, e)),
        None => Ok(default),
    }
}

fn parse_fixed_rates(raw: &str) -> anyhow::Result<HashMap<String, Decimal>> {
    let mut rates = HashMap::new();
    for pair in split_list(raw) {
        let (code, rate) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid BS_FIXED_RATES entry '{}'", pair))?;
        let rate: Decimal = rate
            .trim()
            .parse()
            .with_context(|| format!("Invalid rate for {}", code.trim()))?;
        rates.insert(code.trim().to_ascii_uppercase(), rate);
    }
    Ok(rates)
}
