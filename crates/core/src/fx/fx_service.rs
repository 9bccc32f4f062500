use super::currency::{
    currency_catalogue, is_valid_currency_code, normalize_currency_code, CurrencyInfo,
};
use super::currency_formatter::DisplayLocale;
use super::fx_config::FxConfig;
use super::fx_errors::FxError;
use super::fx_model::{DisplayPrice, ExchangeRateSet, Money, RefreshOutcome};
use super::fx_traits::FxServiceTrait;
use super::rate_cache::{is_stale, RateCache};
use crate::constants::{
    SOFT_ERROR_NO_RATES, SOFT_ERROR_RATES_NOT_SAVED, SOFT_ERROR_USING_SAVED_RATES,
};
use crate::errors::{Error, Result};
use crate::events::{FxEvent, FxEventSink, NoOpFxEventSink};
use crate::kv::KeyValueStore;
use async_trait::async_trait;
use bookshelf_rates::RateProvider;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

type RefreshFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

struct FxState {
    rates: Option<ExchangeRateSet>,
    selected_currency: String,
    locale: DisplayLocale,
    last_error: Option<String>,
}

/// The rate store: cached rates, display currency, conversion and display.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FxService {
    config: Arc<FxConfig>,
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
    state: Arc<RwLock<FxState>>,
    in_flight: Arc<Mutex<Option<RefreshFlight>>>,
    event_sink: Arc<dyn FxEventSink>,
}

impl FxService {
    pub fn new(
        config: FxConfig,
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let config = config.validated()?;
        let cache = RateCache::new(store, &config.base_currency);
        let state = FxState {
            rates: None,
            selected_currency: config.base_currency.clone(),
            locale: config.locale,
            last_error: None,
        };

        Ok(Self {
            config: Arc::new(config),
            provider,
            cache,
            state: Arc::new(RwLock::new(state)),
            in_flight: Arc::new(Mutex::new(None)),
            event_sink: Arc::new(NoOpFxEventSink),
        })
    }

    /// Sets the event sink for this service.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn FxEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn config(&self) -> &FxConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, FxState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, FxState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<RefreshFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins the running refresh, or starts one.
    ///
    /// The fetch runs on its own task so it completes, and clears the slot,
    /// even when every caller awaiting it is dropped.
    fn join_or_start_refresh(&self) -> RefreshFlight {
        let mut slot = self.lock_in_flight();
        if let Some(flight) = slot.as_ref() {
            // A finished flight is only left behind by a task that panicked.
            if flight.peek().is_none() {
                return flight.clone();
            }
        }

        let this = self.clone();
        let task = tokio::spawn(async move {
            let outcome = this.run_refresh().await;
            *this.lock_in_flight() = None;
            outcome
        });

        let state = Arc::clone(&self.state);
        let flight = task
            .map(move |joined| {
                joined.unwrap_or_else(|e| {
                    log::error!("Exchange rate refresh task failed: {}", e);
                    let rates = state
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .rates
                        .clone();
                    let message = if rates.is_some() {
                        SOFT_ERROR_USING_SAVED_RATES
                    } else {
                        SOFT_ERROR_NO_RATES
                    };
                    RefreshOutcome::cached(rates, message.to_string())
                })
            })
            .boxed()
            .shared();
        *slot = Some(flight.clone());
        flight
    }

    async fn run_refresh(&self) -> RefreshOutcome {
        let base = &self.config.base_currency;
        log::debug!(
            "Fetching exchange rates for {} from {}",
            base,
            self.provider.id()
        );

        let fetched = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.fetch_latest(base),
        )
        .await
        {
            Ok(Ok(snapshot)) if normalize_currency_code(&snapshot.base) != *base => {
                Err(FxError::Parse(format!(
                    "{} quoted rates against {} instead of {}",
                    self.provider.id(),
                    snapshot.base,
                    base
                )))
            }
            Ok(Ok(snapshot)) => ExchangeRateSet::from_snapshot(
                &snapshot,
                &self.config.tracked_currencies,
                Utc::now(),
            ),
            Ok(Err(e)) => Err(FxError::from(e)),
            Err(_) => Err(FxError::Network(format!(
                "{} did not answer within {:?}",
                self.provider.id(),
                self.config.fetch_timeout
            ))),
        };

        match fetched {
            Ok(rates) => self.apply_fresh(rates).await,
            Err(e) => self.fall_back(e).await,
        }
    }

    async fn apply_fresh(&self, rates: ExchangeRateSet) -> RefreshOutcome {
        log::info!(
            "Exchange rates updated: {} currencies against {}",
            rates.rates.len(),
            rates.base
        );

        let error = match self.cache.save(&rates).await {
            Ok(()) => None,
            Err(e) => {
                log::warn!("Failed to persist exchange rates: {}", e);
                Some(SOFT_ERROR_RATES_NOT_SAVED.to_string())
            }
        };

        {
            let mut state = self.write_state();
            state.rates = Some(rates.clone());
            state.last_error = error.clone();
        }

        self.event_sink.emit(FxEvent::rates_updated(
            rates.base.clone(),
            rates.last_updated,
            false,
        ));
        if let Some(message) = &error {
            self.event_sink.emit(FxEvent::soft_error(message.clone()));
        }

        RefreshOutcome::fresh(rates, error)
    }

    async fn fall_back(&self, cause: FxError) -> RefreshOutcome {
        log::warn!("Exchange rate refresh failed: {}", cause);

        let in_memory = self.read_state().rates.clone();
        let (cached, loaded) = match in_memory {
            Some(rates) => (Some(rates), false),
            None => {
                let persisted = self.load_persisted().await;
                let loaded = persisted.is_some();
                (persisted, loaded)
            }
        };

        let message = if cached.is_some() {
            SOFT_ERROR_USING_SAVED_RATES
        } else {
            SOFT_ERROR_NO_RATES
        };

        {
            let mut state = self.write_state();
            if loaded {
                state.rates = cached.clone();
            }
            state.last_error = Some(message.to_string());
        }

        if let (true, Some(rates)) = (loaded, &cached) {
            self.event_sink.emit(FxEvent::rates_updated(
                rates.base.clone(),
                rates.last_updated,
                true,
            ));
        }
        self.event_sink.emit(FxEvent::soft_error(message));

        RefreshOutcome::cached(cached, message.to_string())
    }

    async fn load_persisted(&self) -> Option<ExchangeRateSet> {
        match self.cache.load_or_migrate().await {
            Ok(rates) => rates,
            Err(e) => {
                log::warn!("Ignoring cached exchange rates: {}", e);
                None
            }
        }
    }

    fn with_rates<T>(&self, f: impl FnOnce(&ExchangeRateSet) -> T) -> T {
        let state = self.read_state();
        match &state.rates {
            Some(rates) => f(rates),
            None => f(&ExchangeRateSet::empty(&self.config.base_currency)),
        }
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    async fn initialize(&self) -> Result<()> {
        match self.cache.load_selected_currency() {
            Ok(Some(code)) if self.config.is_supported(&code) => {
                self.write_state().selected_currency = code;
            }
            Ok(Some(code)) => {
                log::warn!(
                    "Stored display currency {} is not offered, using {}",
                    code,
                    self.config.base_currency
                );
            }
            Ok(None) => {}
            Err(e) => log::warn!("Failed to load display currency: {}", e),
        }

        match self.cache.load_selected_locale() {
            Ok(Some(locale)) => self.write_state().locale = locale,
            Ok(None) => {}
            Err(e) => log::warn!("Failed to load display locale: {}", e),
        }

        let outcome = self.ensure_fresh().await;
        if let Some(error) = outcome.error {
            log::warn!("Rate store started with a soft error: {}", error);
        }
        Ok(())
    }

    async fn refresh(&self) -> RefreshOutcome {
        self.join_or_start_refresh().await
    }

    async fn ensure_fresh(&self) -> RefreshOutcome {
        let in_memory = self.read_state().rates.clone();
        let (current, loaded) = match in_memory {
            Some(rates) => (Some(rates), false),
            None => {
                let persisted = self.load_persisted().await;
                let loaded = persisted.is_some();
                (persisted, loaded)
            }
        };

        if let Some(rates) = current {
            if !is_stale(rates.last_updated, Utc::now(), self.config.staleness_threshold) {
                if loaded {
                    self.write_state().rates = Some(rates.clone());
                    self.event_sink.emit(FxEvent::rates_updated(
                        rates.base.clone(),
                        rates.last_updated,
                        true,
                    ));
                }
                log::debug!("Cached exchange rates are fresh, skipping fetch");
                let error = self.last_error();
                return RefreshOutcome {
                    rates: Some(rates),
                    from_cache: true,
                    error,
                };
            }
        }

        self.refresh().await
    }

    fn rates(&self) -> Option<ExchangeRateSet> {
        self.read_state().rates.clone()
    }

    fn is_stale(&self) -> bool {
        let last_updated = self
            .read_state()
            .rates
            .as_ref()
            .and_then(|rates| rates.last_updated);
        is_stale(last_updated, Utc::now(), self.config.staleness_threshold)
    }

    fn is_refreshing(&self) -> bool {
        self.lock_in_flight()
            .as_ref()
            .is_some_and(|flight| flight.peek().is_none())
    }

    fn last_error(&self) -> Option<String> {
        self.read_state().last_error.clone()
    }

    fn base_currency(&self) -> &str {
        &self.config.base_currency
    }

    fn locale(&self) -> DisplayLocale {
        self.read_state().locale
    }

    fn selected_currency(&self) -> String {
        self.read_state().selected_currency.clone()
    }

    async fn select_currency(&self, code: &str) -> Result<String> {
        let code = normalize_currency_code(code);
        if !is_valid_currency_code(&code) {
            return Err(FxError::InvalidCurrencyCode(code).into());
        }
        if !self.config.is_supported(&code) {
            return Err(Error::UnsupportedCurrency(code));
        }

        self.cache.save_selected_currency(&code).await?;
        self.write_state().selected_currency = code.clone();

        log::info!("Display currency set to {}", code);
        self.event_sink
            .emit(FxEvent::selected_currency_changed(code.clone()));
        Ok(code)
    }

    async fn select_locale(&self, locale: DisplayLocale) -> Result<DisplayLocale> {
        self.cache.save_selected_locale(locale).await?;
        self.write_state().locale = locale;

        log::info!("Display locale set to {}", locale);
        self.event_sink.emit(FxEvent::locale_changed(locale));
        Ok(locale)
    }

    fn supported_currencies(&self) -> Vec<CurrencyInfo> {
        currency_catalogue(&self.config.base_currency, &self.config.tracked_currencies)
    }

    fn convert(&self, money: &Money, to: &str) -> Result<Money> {
        self.with_rates(|rates| money.convert_to(to, rates))
            .map_err(Error::from)
    }

    fn convert_to_selected(&self, money: &Money) -> Result<Money> {
        let target = self.selected_currency();
        self.convert(money, &target)
    }

    fn format(&self, money: &Money) -> String {
        money.format(self.locale())
    }

    fn display_price(&self, money: &Money) -> DisplayPrice {
        let locale = self.locale();
        match self.convert_to_selected(money) {
            Ok(converted) => DisplayPrice {
                text: converted.format(locale),
                amount: converted.amount(),
                currency: converted.currency().to_string(),
                converted: true,
                error: None,
            },
            Err(e) => {
                let message = e.to_string();
                log::debug!("Showing unconverted price: {}", message);
                self.write_state().last_error = Some(message.clone());
                DisplayPrice {
                    text: money.format(locale),
                    amount: money.amount(),
                    currency: money.currency().to_string(),
                    converted: false,
                    error: Some(message),
                }
            }
        }
    }
}
