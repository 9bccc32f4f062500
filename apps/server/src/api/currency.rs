use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use bookshelf_core::fx::{CurrencyInfo, DisplayLocale, DisplayPrice, Money, RefreshOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrenciesResponse {
    base: String,
    selected: String,
    locale: String,
    currencies: Vec<CurrencyInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RatesResponse {
    base: String,
    rates: BTreeMap<String, Decimal>,
    last_updated: Option<DateTime<Utc>>,
    stale: bool,
    refreshing: bool,
    error: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct SelectedCurrency {
    currency: String,
}

#[derive(Serialize, Deserialize)]
struct SelectedLocale {
    locale: String,
}

#[derive(Deserialize)]
struct ConvertQuery {
    amount: String,
    from: Option<String>,
    to: Option<String>,
}

#[derive(Deserialize)]
struct AmountQuery {
    amount: String,
    currency: Option<String>,
}

#[derive(Serialize)]
struct Formatted {
    text: String,
}

fn parse_amount(raw: &str) -> ApiResult<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid amount '{}': {}", raw, e)))
}

/// Builds a price from query parameters; the currency defaults to the base.
fn money_from(state: &AppState, amount: &str, currency: Option<&str>) -> ApiResult<Money> {
    let amount = parse_amount(amount)?;
    let money = match currency {
        Some(code) => Money::new(amount, code),
        None => Money::new(amount, state.fx_service.base_currency()),
    };
    Ok(money)
}

async fn list_currencies(State(state): State<Arc<AppState>>) -> Json<CurrenciesResponse> {
    let fx = &state.fx_service;
    Json(CurrenciesResponse {
        base: fx.base_currency().to_string(),
        selected: fx.selected_currency(),
        locale: fx.locale().to_string(),
        currencies: fx.supported_currencies(),
    })
}

async fn get_rates(State(state): State<Arc<AppState>>) -> Json<RatesResponse> {
    let fx = &state.fx_service;
    let (rates, last_updated) = match fx.rates() {
        Some(set) => (set.rates, set.last_updated),
        None => (BTreeMap::new(), None),
    };
    Json(RatesResponse {
        base: fx.base_currency().to_string(),
        rates,
        last_updated,
        stale: fx.is_stale(),
        refreshing: fx.is_refreshing(),
        error: fx.last_error(),
    })
}

async fn refresh_rates(State(state): State<Arc<AppState>>) -> Json<RefreshOutcome> {
    Json(state.fx_service.refresh().await)
}

async fn ensure_fresh_rates(State(state): State<Arc<AppState>>) -> Json<RefreshOutcome> {
    Json(state.fx_service.ensure_fresh().await)
}

async fn get_selected(State(state): State<Arc<AppState>>) -> Json<SelectedCurrency> {
    Json(SelectedCurrency {
        currency: state.fx_service.selected_currency(),
    })
}

async fn set_selected(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectedCurrency>,
) -> ApiResult<Json<SelectedCurrency>> {
    let currency = state.fx_service.select_currency(&body.currency).await?;
    Ok(Json(SelectedCurrency { currency }))
}

async fn get_locale(State(state): State<Arc<AppState>>) -> Json<SelectedLocale> {
    Json(SelectedLocale {
        locale: state.fx_service.locale().to_string(),
    })
}

async fn set_locale(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectedLocale>,
) -> ApiResult<Json<SelectedLocale>> {
    let locale: DisplayLocale = body.locale.parse().map_err(ApiError::BadRequest)?;
    let locale = state.fx_service.select_locale(locale).await?;
    Ok(Json(SelectedLocale {
        locale: locale.to_string(),
    }))
}

async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<Json<Money>> {
    let money = money_from(&state, &query.amount, query.from.as_deref())?;
    let converted = match query.to.as_deref() {
        Some(to) => state.fx_service.convert(&money, to)?,
        None => state.fx_service.convert_to_selected(&money)?,
    };
    Ok(Json(converted))
}

async fn display(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AmountQuery>,
) -> ApiResult<Json<DisplayPrice>> {
    let money = money_from(&state, &query.amount, query.currency.as_deref())?;
    Ok(Json(state.fx_service.display_price(&money)))
}

async fn format_price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AmountQuery>,
) -> ApiResult<Json<Formatted>> {
    let money = money_from(&state, &query.amount, query.currency.as_deref())?;
    Ok(Json(Formatted {
        text: state.fx_service.format(&money),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/currency/currencies", get(list_currencies))
        .route("/currency/selected", get(get_selected).put(set_selected))
        .route("/currency/locale", get(get_locale).put(set_locale))
        .route("/currency/rates", get(get_rates))
        .route("/currency/rates/refresh", post(refresh_rates))
        .route("/currency/rates/ensure-fresh", post(ensure_fresh_rates))
        .route("/currency/convert", get(convert))
        .route("/currency/display", get(display))
        .route("/currency/format", get(format_price))
}
