//! Gateway client (merchant backend → FreeKassa API).
//!
//! Every request is a JSON `POST` whose body starts with `shopId` and
//! `nonce`, followed by the route's own fields, and ends with the
//! `signature` computed over everything before it.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::{ClientError, GatewayError};
use crate::config::{Credentials, DEFAULT_API_URL};
use crate::objects::{
    BALANCE_ROUTE, NONCE_FIELD, ORDERS_CREATE_ROUTE, ORDERS_ROUTE, OrderListQuery, OrderRequest,
    RequestParams, SHOP_ID_FIELD,
};
use crate::signature::{self, SignatureError};

/// Typed HTTP client for the FreeKassa API.
///
/// Cloning is cheap and clones share the nonce high-water mark, so nonces
/// never go backwards across any of them even if the system clock does.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    last_nonce: Arc<AtomicI64>,
}

impl GatewayClient {
    /// Create a new `GatewayClient` talking to the production API.
    ///
    /// * `api_key` – the secret key requests are signed with.
    /// * `shop_id` – the merchant's shop identifier.
    pub fn new(
        api_key: impl Into<String>,
        shop_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let credentials = Credentials::new(shop_id, api_key)?;
        Ok(Self::with_credentials(credentials, Url::parse(DEFAULT_API_URL)?))
    }

    /// Create a client from already validated credentials.
    pub fn with_credentials(credentials: Credentials, base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url: with_trailing_slash(base_url),
            credentials,
            last_nonce: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Point the client at a different API root (e.g. a sandbox or mock).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = with_trailing_slash(base_url);
        self
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn shop_id(&self) -> &str {
        self.credentials.shop_id()
    }

    /// `POST /v1/balance` – the shop's balances, as returned by the gateway.
    pub async fn get_balance(&self) -> Result<RequestParams, ClientError> {
        self.request(BALANCE_ROUTE, RequestParams::new()).await
    }

    /// `POST /v1/orders/create` – create a payment order.
    ///
    /// The returned payload carries the payment page URL under `location`.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<RequestParams, ClientError> {
        let fields = order.to_fields()?;
        self.request(ORDERS_CREATE_ROUTE, fields).await
    }

    /// `POST /v1/orders` – list the shop's orders.
    pub async fn list_orders(&self, query: &OrderListQuery) -> Result<RequestParams, ClientError> {
        self.request(ORDERS_ROUTE, query.to_fields()).await
    }

    /// Sign `fields` and `POST` them to `route`, relative to the base URL.
    pub async fn request(
        &self,
        route: &str,
        fields: RequestParams,
    ) -> Result<RequestParams, ClientError> {
        let nonce = self.next_nonce();
        let payload = self.build_payload(nonce, fields)?;
        let url = self.base_url.join(route)?;

        tracing::debug!(%url, nonce, "sending gateway request");

        let resp = self.http.post(url).json(&payload).send().await?;

        parse_response(resp).await
    }

    /// Assemble the signed body for one request:
    /// `shopId`, `nonce`, then `fields`, then `signature`.
    pub fn build_payload(
        &self,
        nonce: i64,
        fields: RequestParams,
    ) -> Result<RequestParams, SignatureError> {
        let mut payload = RequestParams::new();
        payload.insert(
            SHOP_ID_FIELD.to_owned(),
            Value::from(self.credentials.shop_id()),
        );
        payload.insert(NONCE_FIELD.to_owned(), Value::from(nonce));
        payload.extend(fields);
        signature::append_signature(&mut payload, self.credentials.api_key())?;
        Ok(payload)
    }

    /// The current Unix timestamp, raised to the last nonce handed out if
    /// the clock stepped back.
    fn next_nonce(&self) -> i64 {
        let now = signature::current_nonce();
        let previous = self.last_nonce.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn parse_response(resp: reqwest::Response) -> Result<RequestParams, ClientError> {
    let status = resp.status();
    if status.is_client_error() || status.is_server_error() {
        // the gateway answered, so a broken body is still a rejection
        let bytes = resp.bytes().await.unwrap_or_default();
        let error = GatewayError::from_body(status.as_u16(), &bytes);
        tracing::warn!(
            status = error.status_code(),
            reason = error.message().unwrap_or_default(),
            "gateway rejected request"
        );
        return Err(error.into());
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
