use std::sync::Arc;

use crate::{
    config::{Config, RatesSource},
    events::{BroadcastFxEventSink, EventBus},
};
use bookshelf_core::{
    fx::{FxService, FxServiceTrait},
    kv::KeyValueStore,
};
use bookshelf_rates::{ExchangeRateApiProvider, FixedRateProvider, RateProvider};
use bookshelf_storage_sqlite::{
    db::{self, write_actor},
    SqliteKeyValueStore,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Capacity of the SSE broadcast channel
const EVENT_BUS_CAPACITY: usize = 256;

pub struct AppState {
    pub fx_service: Arc<dyn FxServiceTrait>,
    pub event_bus: EventBus,
}

pub fn init_tracing() {
    let log_format = std::env::var("BS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also bridges `log` records from the library crates.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn build_provider(config: &Config) -> Arc<dyn RateProvider> {
    match &config.rates_source {
        RatesSource::ExchangeRateApi { api_key, base_url } => match base_url {
            Some(url) => Arc::new(ExchangeRateApiProvider::with_timeout(
                api_key.clone(),
                url.clone(),
                config.fx.fetch_timeout,
            )),
            None => Arc::new(ExchangeRateApiProvider::new(api_key.clone())),
        },
        RatesSource::Fixed(rates) => Arc::new(FixedRateProvider::new(
            &config.fx.base_currency,
            rates.clone(),
        )),
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(pool, writer));

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let provider = build_provider(config);
    tracing::info!(
        "Exchange rates from {} against {}",
        provider.id(),
        config.fx.base_currency
    );

    let fx_service = FxService::new(config.fx.clone(), provider, store)?
        .with_event_sink(Arc::new(BroadcastFxEventSink::new(event_bus.clone())));
    fx_service.initialize().await?;

    Ok(Arc::new(AppState {
        fx_service: Arc::new(fx_service),
        event_bus,
    }))
}
