//! End-to-end tests of `GatewayClient` against a local mock gateway.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use freekassa_sdk::client::{ClientError, GatewayClient};
use freekassa_sdk::objects::{EmailAddress, OrderListQuery, OrderRequest, RequestParams};
use freekassa_sdk::signature;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use url::Url;

const API_KEY: &str = "test-api-key";
const SHOP_ID: &str = "12345";

/// Request bodies the mock gateway has received, in arrival order.
#[derive(Clone, Default)]
struct Received(Arc<Mutex<Vec<RequestParams>>>);

impl Received {
    async fn all(&self) -> Vec<RequestParams> {
        self.0.lock().await.clone()
    }

    async fn last(&self) -> RequestParams {
        self.0.lock().await.last().cloned().expect("no request received")
    }
}

/// Records the body and rejects it like the real gateway when the signature
/// does not check out.
async fn record(received: &Received, body: RequestParams) -> Result<(), impl IntoResponse> {
    received.0.lock().await.push(body.clone());
    signature::verify(&body, API_KEY.as_bytes())
        .map_err(|_| (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad_signature" }))))
}

async fn balance(
    State(received): State<Received>,
    Json(body): Json<RequestParams>,
) -> impl IntoResponse {
    if let Err(rejection) = record(&received, body).await {
        return rejection.into_response();
    }
    Json(json!({
        "type": "success",
        "balance": [{ "currency": "RUB", "value": "1500.25" }]
    }))
    .into_response()
}

async fn create_order(
    State(received): State<Received>,
    Json(body): Json<RequestParams>,
) -> impl IntoResponse {
    if let Err(rejection) = record(&received, body).await {
        return rejection.into_response();
    }
    Json(json!({
        "type": "success",
        "orderId": 71503,
        "orderHash": "f0d3c2b1",
        "location": "https://pay.freekassa.ru/form/71503"
    }))
    .into_response()
}

async fn orders(
    State(received): State<Received>,
    Json(body): Json<RequestParams>,
) -> impl IntoResponse {
    if let Err(rejection) = record(&received, body).await {
        return rejection.into_response();
    }
    Json(json!({ "type": "success", "pages": 1, "orders": [] })).into_response()
}

async fn spawn_gateway(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/v1/")).unwrap()
}

async fn mock_gateway() -> (GatewayClient, Received) {
    let received = Received::default();
    let router = Router::new()
        .route("/v1/balance", post(balance))
        .route("/v1/orders/create", post(create_order))
        .route("/v1/orders", post(orders))
        .with_state(received.clone());
    let base_url = spawn_gateway(router).await;
    let client = GatewayClient::new(API_KEY, SHOP_ID)
        .unwrap()
        .with_base_url(base_url);
    (client, received)
}

async fn failing_gateway(status: StatusCode, body: serde_json::Value) -> GatewayClient {
    let router = Router::new().route(
        "/v1/balance",
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    let base_url = spawn_gateway(router).await;
    GatewayClient::new(API_KEY, SHOP_ID)
        .unwrap()
        .with_base_url(base_url)
}

fn sample_order() -> OrderRequest {
    OrderRequest::new(
        36,
        EmailAddress::parse("a@b.com").unwrap(),
        "1.2.3.4".parse().unwrap(),
        Decimal::from_str("9.9").unwrap(),
    )
    .with_currency("USD")
}

fn keys(params: &RequestParams) -> Vec<&str> {
    params.keys().map(String::as_str).collect()
}

#[tokio::test]
async fn test_get_balance_returns_payload_verbatim() {
    let (client, received) = mock_gateway().await;

    let balance = client.get_balance().await.unwrap();
    assert_eq!(balance["type"], json!("success"));
    assert_eq!(balance["balance"][0]["value"], json!("1500.25"));

    let body = received.last().await;
    assert_eq!(keys(&body), ["shopId", "nonce", "signature"]);
    assert_eq!(body["shopId"], json!(SHOP_ID));
    assert!(body["nonce"].as_i64().unwrap() > 1_600_000_000);
    assert_eq!(body["signature"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_create_order_payload() {
    let (client, received) = mock_gateway().await;

    let created = client.create_order(&sample_order()).await.unwrap();
    assert_eq!(
        created["location"],
        json!("https://pay.freekassa.ru/form/71503")
    );

    let body = received.last().await;
    assert_eq!(
        keys(&body),
        ["shopId", "nonce", "i", "email", "ip", "amount", "currency", "signature"]
    );
    assert_eq!(body["i"], json!(36));
    assert_eq!(body["email"], json!("a@b.com"));
    assert_eq!(body["ip"], json!("1.2.3.4"));
    assert_eq!(body["amount"], json!(9.9));
    assert_eq!(body["currency"], json!("USD"));
    assert_eq!(body["shopId"], json!(SHOP_ID));

    let message = signature::canonical_message(&body).unwrap();
    let nonce = body["nonce"].as_i64().unwrap();
    assert_eq!(message, format!("99|USD|a@b.com|36|1.2.3.4|{nonce}|{SHOP_ID}"));
    assert!(signature::verify(&body, API_KEY.as_bytes()).is_ok());
}

#[tokio::test]
async fn test_create_order_optional_fields() {
    let (client, received) = mock_gateway().await;

    let order = sample_order()
        .with_payment_id("order-42")
        .with_phone("+1234567890")
        .with_success_url(Url::parse("https://shop.example/ok").unwrap())
        .with_notification_url(Url::parse("https://shop.example/notify").unwrap());
    client.create_order(&order).await.unwrap();

    let body = received.last().await;
    assert_eq!(body["paymentId"], json!("order-42"));
    assert_eq!(body["tel"], json!("+1234567890"));
    assert_eq!(body["success_url"], json!("https://shop.example/ok"));
    assert_eq!(body["notification_url"], json!("https://shop.example/notify"));
    assert!(!body.contains_key("failure_url"));
    assert!(!body.contains_key("phone"));
    assert_eq!(keys(&body).last(), Some(&"signature"));
}

#[tokio::test]
async fn test_invalid_order_is_not_sent() {
    let (client, received) = mock_gateway().await;

    let mut order = sample_order();
    order.amount = Decimal::ZERO;
    let err = client.create_order(&order).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidOrder(_)));
    assert!(received.all().await.is_empty());
}

#[tokio::test]
async fn test_list_orders_sends_filters() {
    let (client, received) = mock_gateway().await;

    let query = OrderListQuery {
        payment_id: Some("order-42".to_owned()),
        page: Some(1),
        ..Default::default()
    };
    let result = client.list_orders(&query).await.unwrap();
    assert_eq!(result["pages"], json!(1));

    let body = received.last().await;
    assert_eq!(
        keys(&body),
        ["shopId", "nonce", "paymentId", "page", "signature"]
    );
}

#[tokio::test]
async fn test_wrong_key_is_rejected_with_error_field() {
    let (client, _) = mock_gateway().await;
    let client = GatewayClient::new("wrong-key", SHOP_ID)
        .unwrap()
        .with_base_url(client.base_url().clone());

    let err = client.get_balance().await.unwrap_err();
    let gateway = err.as_gateway().expect("gateway error");
    assert_eq!(gateway.status_code(), 400);
    assert_eq!(gateway.message(), Some("bad_signature"));
    assert!(!err.is_network());
}

#[tokio::test]
async fn test_bad_request_uses_error_field() {
    let client = failing_gateway(StatusCode::BAD_REQUEST, json!({ "error": "bad_signature" })).await;

    match client.get_balance().await {
        Err(ClientError::Gateway(error)) => {
            assert_eq!(error.status_code(), 400);
            assert_eq!(error.message(), Some("bad_signature"));
        }
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_uses_message_field() {
    let client = failing_gateway(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "server_error" }),
    )
    .await;

    match client.get_balance().await {
        Err(ClientError::Gateway(error)) => {
            assert_eq!(error.status_code(), 500);
            assert_eq!(error.message(), Some("server_error"));
            assert_eq!(error.body()["message"], json!("server_error"));
        }
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_broken_error_body_is_still_a_gateway_error() {
    // status line and a first chunk go out, then the body stream fails
    let router = Router::new().route(
        "/v1/balance",
        post(|| async {
            let chunks = futures_util::stream::unfold(0u8, |step| async move {
                match step {
                    0 => Some((Ok(Bytes::from_static(b"{\"message\": \"ser")), 1)),
                    1 => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Some((Err(std::io::Error::other("connection reset")), 2))
                    }
                    _ => None,
                }
            });
            (StatusCode::SERVICE_UNAVAILABLE, Body::from_stream(chunks))
        }),
    );
    let base_url = spawn_gateway(router).await;
    let client = GatewayClient::new(API_KEY, SHOP_ID)
        .unwrap()
        .with_base_url(base_url);

    let err = client.get_balance().await.unwrap_err();
    assert!(!err.is_network(), "expected gateway error, got {err:?}");
    let gateway = err.as_gateway().expect("gateway error");
    assert_eq!(gateway.status_code(), 503);
    assert!(gateway.body().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // grab a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GatewayClient::new(API_KEY, SHOP_ID)
        .unwrap()
        .with_base_url(Url::parse(&format!("http://{addr}/v1/")).unwrap());

    let err = client.get_balance().await.unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
    assert!(err.as_gateway().is_none());
}

#[tokio::test]
async fn test_sequential_nonces_do_not_decrease() {
    let (client, received) = mock_gateway().await;

    for _ in 0..3 {
        client.get_balance().await.unwrap();
    }

    let nonces: Vec<i64> = received
        .all()
        .await
        .iter()
        .map(|body| body["nonce"].as_i64().unwrap())
        .collect();
    assert_eq!(nonces.len(), 3);
    assert!(nonces.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_concurrent_requests() {
    let (client, received) = mock_gateway().await;

    let order = sample_order();
    let list_query = OrderListQuery::default();
    let (balance, created, listed) = tokio::join!(
        client.get_balance(),
        client.create_order(&order),
        client.list_orders(&list_query),
    );
    assert!(balance.is_ok());
    assert!(created.is_ok());
    assert!(listed.is_ok());
    assert_eq!(received.all().await.len(), 3);
}
