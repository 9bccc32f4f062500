use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use bookshelf_server::{api::app_router, build_state, config::Config};

struct TestApp {
    router: Router,
    _dir: TempDir,
}

async fn build_test_app(extra: &[(&str, &str)]) -> TestApp {
    let dir = tempdir().unwrap();
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(
        "BS_DB_PATH".into(),
        dir.path().join("test.db").to_string_lossy().into_owned(),
    );
    vars.insert("BS_RATES_PROVIDER".into(), "fixed".into());
    vars.insert("BS_FIXED_RATES".into(), "USD=0.03,EUR=0.028".into());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = build_state(&config).await.unwrap();
    TestApp {
        router: app_router(state, &config).unwrap(),
        _dir: dir,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn healthz_works() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(&app, Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["baseCurrency"], "TRY");
}

#[tokio::test]
async fn lists_base_first_then_tracked() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(&app, Method::GET, "/api/v1/currency/currencies", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], "TRY");
    assert_eq!(body["locale"], "tr-TR");
    let codes: Vec<&str> = body["currencies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["TRY", "USD", "EUR", "GBP"]);
}

#[tokio::test]
async fn startup_loads_rates() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(&app, Method::GET, "/api/v1/currency/rates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["base"], "TRY");
    assert_eq!(decimal(&body["rates"]["USD"]), dec!(0.03));
    assert!(body["rates"].get("TRY").is_none());
    assert!(body["rates"].get("GBP").is_none());
    assert_eq!(body["stale"], false);
    assert!(body["lastUpdated"].is_string());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn refresh_returns_fresh_outcome() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(&app, Method::POST, "/api/v1/currency/rates/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fromCache"], false);
    assert_eq!(decimal(&body["rates"]["rates"]["EUR"]), dec!(0.028));

    let (_, body) = send(&app, Method::POST, "/api/v1/currency/rates/ensure-fresh", None).await;
    assert_eq!(body["fromCache"], true);
}

#[tokio::test]
async fn selected_currency_round_trip() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/currency/selected",
        Some(json!({ "currency": "usd" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "USD");

    let (_, body) = send(&app, Method::GET, "/api/v1/currency/selected", None).await;
    assert_eq!(body["currency"], "USD");
}

#[tokio::test]
async fn rejects_invalid_and_unsupported_selection() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/currency/selected",
        Some(json!({ "currency": "DOLLAR" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/currency/selected",
        Some(json!({ "currency": "JPY" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::GET, "/api/v1/currency/selected", None).await;
    assert_eq!(body["currency"], "TRY");
}

#[tokio::test]
async fn converts_between_currencies() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/currency/convert?amount=100&from=TRY&to=USD",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "USD");
    assert_eq!(decimal(&body["amount"]), dec!(3));

    let (status, body) = send(&app, Method::GET, "/api/v1/currency/convert?amount=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "TRY");
    assert_eq!(decimal(&body["amount"]), dec!(100));
}

#[tokio::test]
async fn missing_rate_is_unprocessable() {
    let app = build_test_app(&[]).await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/currency/convert?amount=100&to=GBP",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
}

#[tokio::test]
async fn invalid_amount_is_bad_request() {
    let app = build_test_app(&[]).await;
    let (status, _) = send(&app, Method::GET, "/api/v1/currency/display?amount=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn display_uses_selected_currency() {
    let app = build_test_app(&[]).await;
    send(
        &app,
        Method::PUT,
        "/api/v1/currency/selected",
        Some(json!({ "currency": "USD" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/currency/display?amount=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted"], true);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["text"], "$3,00");
}

#[tokio::test]
async fn display_falls_back_when_rate_missing() {
    let app = build_test_app(&[("BS_TRACKED_CURRENCIES", "USD,GBP")]).await;
    send(
        &app,
        Method::PUT,
        "/api/v1/currency/selected",
        Some(json!({ "currency": "GBP" })),
    )
    .await;

    let uri = "/api/v1/currency/display?amount=1234.5";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["converted"], false);
    assert_eq!(body["currency"], "TRY");
    assert_eq!(body["text"], "₺1.234,50");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn format_uses_configured_locale() {
    let app = build_test_app(&[("BS_DISPLAY_LOCALE", "en-US")]).await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/currency/format?amount=1234.56&currency=USD",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "$1,234.56");
}

#[tokio::test]
async fn unreachable_provider_reports_soft_error() {
    let app = build_test_app(&[
        ("BS_RATES_PROVIDER", "exchangerate-api"),
        ("BS_RATES_BASE_URL", "http://127.0.0.1:9"),
        ("BS_RATE_FETCH_TIMEOUT_MS", "2000"),
    ])
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/currency/rates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rates"], json!({}));
    assert_eq!(body["stale"], true);
    assert!(body["error"].is_string());

    let (_, body) = send(&app, Method::GET, "/api/v1/currency/display?amount=10", None).await;
    assert_eq!(body["converted"], true);
    assert_eq!(body["currency"], "TRY");
}

#[tokio::test]
async fn overflowing_conversion_is_unprocessable() {
    let app = build_test_app(&[]).await;
    let uri = "/api/v1/currency/convert?amount=79228162514264337593543950335&from=USD&to=TRY";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
}

#[tokio::test]
async fn locale_selection_changes_display_format() {
    let app = build_test_app(&[]).await;
    let (_, body) = send(&app, Method::GET, "/api/v1/currency/locale", None).await;
    assert_eq!(body["locale"], "tr-TR");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/currency/locale",
        Some(json!({ "locale": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locale"], "en-US");

    let uri = "/api/v1/currency/format?amount=1234.56&currency=USD";
    let (_, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(body["text"], "$1,234.56");

    let (_, body) = send(&app, Method::GET, "/api/v1/currency/currencies", None).await;
    assert_eq!(body["locale"], "en-US");
}

#[tokio::test]
async fn unknown_locale_is_bad_request() {
    let app = build_test_app(&[]).await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/currency/locale",
        Some(json!({ "locale": "fr-FR" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
