//! End-to-end tests of the rebalance workflow against a mock exchange.

use hedge_trade_bitmex::auth::BitmexCredentials;
use hedge_trade_bitmex::{BitmexClient, BitmexClientConfig};
use hedge_trade_core::AppConfig;
use hedge_trade_cli::commands::rebalance::{execute, RebalanceArgs};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> BitmexClient {
    let credentials = BitmexCredentials::new("test-key", "test-secret");
    BitmexClient::new(
        BitmexClientConfig::default().with_base_url(base_url),
        credentials,
    )
    .unwrap()
}

fn args() -> RebalanceArgs {
    RebalanceArgs {
        cold_wallet: 0.0,
        reset_leverage: false,
        hedge: false,
        force: false,
        testnet: false,
        config: None,
    }
}

async fn mount_instrument(server: &MockServer, mark_price: f64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/instrument"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "symbol": "XBTUSD", "markPrice": mark_price }
        ])))
        .mount(server)
        .await;
}

async fn mount_flat_position(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/position"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(server)
        .await;
}

async fn mount_margin(server: &MockServer, margin_balance: i64, available_margin: i64) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/margin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "currency": "XBt",
            "marginBalance": margin_balance,
            "availableMargin": available_margin
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn large_order_without_force_never_reaches_order_endpoint() {
    let server = MockServer::start().await;
    mount_instrument(&server, 10_000.0).await;
    mount_flat_position(&server).await;
    // 0.15 XBT at $10,000: a 1500 contract hedge, over the 1000 threshold.
    mount_margin(&server, 15_000_000, 15_000_000).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut args = args();
    args.hedge = true;

    execute(&client, &AppConfig::default(), &args).await.unwrap();
}

#[tokio::test]
async fn without_hedge_flag_no_order_is_submitted() {
    let server = MockServer::start().await;
    mount_instrument(&server, 10_000.0).await;
    mount_flat_position(&server).await;
    // 0.05 XBT: a 500 contract hedge, under the threshold.
    mount_margin(&server, 5_000_000, 5_000_000).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    execute(&client, &AppConfig::default(), &args()).await.unwrap();
}

#[tokio::test]
async fn hedge_flag_submits_the_recommended_sell() {
    let server = MockServer::start().await;
    mount_instrument(&server, 10_000.0).await;
    mount_flat_position(&server).await;
    mount_margin(&server, 5_000_000, 5_000_000).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .and(body_json(serde_json::json!({
            "symbol": "XBTUSD",
            "side": "Sell",
            "orderQty": 500,
            "ordType": "Market",
            "timeInForce": "ImmediateOrCancel"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "orderId": "abc-123",
            "symbol": "XBTUSD",
            "side": "Sell",
            "orderQty": 500,
            "cumQty": 500,
            "avgPx": 10_001.5,
            "ordStatus": "Filled"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut args = args();
    args.hedge = true;

    execute(&client, &AppConfig::default(), &args).await.unwrap();
}

#[tokio::test]
async fn instrument_error_halts_the_chain() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/instrument"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "message": "Invalid API Key.", "name": "HTTPError" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/position"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user/margin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    execute(&client, &AppConfig::default(), &args()).await.unwrap();
}

#[tokio::test]
async fn reset_leverage_uses_the_leverage_endpoint_for_the_position() {
    let server = MockServer::start().await;
    mount_instrument(&server, 10_000.0).await;
    mount_margin(&server, 500_000_000, 0).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/position/leverage"))
        .and(body_json(serde_json::json!({
            "symbol": "XBTUSD",
            "leverage": 1.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "symbol": "XBTUSD",
            "homeNotional": -5.0,
            "foreignNotional": 50000.0,
            "realisedPnl": 0,
            "rebalancedPnl": 0,
            "avgEntryPrice": 10000.0,
            "commission": 0.00075,
            "leverage": 1.0,
            "markPrice": 10000.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/position"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut args = args();
    args.reset_leverage = true;

    // 5 XBT against a 5 XBT hedge: balanced, so the run ends after the
    // report without touching the order endpoint.
    execute(&client, &AppConfig::default(), &args).await.unwrap();
}

#[tokio::test]
async fn order_error_is_reported_not_fatal() {
    let server = MockServer::start().await;
    mount_instrument(&server, 10_000.0).await;
    mount_flat_position(&server).await;
    mount_margin(&server, 5_000_000, 5_000_000).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/order"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "message": "Account has insufficient Available Balance",
                "name": "ValidationError"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut args = args();
    args.hedge = true;

    execute(&client, &AppConfig::default(), &args).await.unwrap();
}

#[tokio::test]
async fn transport_failure_propagates_as_error() {
    let client = test_client("http://127.0.0.1:1");
    let result = execute(&client, &AppConfig::default(), &args()).await;
    assert!(result.is_err());
}
