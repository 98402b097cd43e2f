//! HTTP client for the FreeKassa API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the payload types and signing do not pull in `reqwest`.

mod gateway;

pub use gateway::GatewayClient;

use std::fmt;

use serde_json::Value;

use crate::config::CredentialsError;
use crate::objects::{OrderError, RequestParams};
use crate::signature::SignatureError;

/// Errors produced by [`GatewayClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection refused, timeout, …).
    /// The gateway never produced a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The gateway answered with a status of 400 or above.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The request parameters could not be signed.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("invalid order: {0}")]
    InvalidOrder(#[from] OrderError),

    #[error("invalid credentials: {0}")]
    Credentials(#[from] CredentialsError),

    /// A successful response body was not a JSON object.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the route.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// `true` when the request never reached the gateway.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// The gateway rejection, if that is what this error is.
    pub fn as_gateway(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway(error) => Some(error),
            _ => None,
        }
    }
}

/// A request the gateway received and rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayError {
    status_code: u16,
    body: RequestParams,
}

impl GatewayError {
    pub fn new(status_code: u16, body: RequestParams) -> Self {
        Self { status_code, body }
    }

    /// Build the error from a raw response body.
    ///
    /// A body that is not a JSON object is kept as a string under the key
    /// [`message`](Self::message) reads. An empty body gives an empty map.
    pub fn from_body(status_code: u16, bytes: &[u8]) -> Self {
        if bytes.trim_ascii().is_empty() {
            return Self::new(status_code, RequestParams::new());
        }
        let body = match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(body)) => body,
            _ => {
                let mut body = RequestParams::new();
                body.insert(
                    message_key(status_code).to_owned(),
                    Value::String(String::from_utf8_lossy(bytes).into_owned()),
                );
                body
            }
        };
        Self::new(status_code, body)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn body(&self) -> &RequestParams {
        &self.body
    }

    /// The human-readable reason. The gateway puts it under `error` for
    /// status 400 and under `message` for every other status.
    pub fn message(&self) -> Option<&str> {
        self.body
            .get(message_key(self.status_code))
            .and_then(Value::as_str)
    }
}

fn message_key(status_code: u16) -> &'static str {
    if status_code == 400 { "error" } else { "message" }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gateway error: status {}, message: {}",
            self.status_code,
            self.message().unwrap_or("<none>")
        )
    }
}

impl std::error::Error for GatewayError {}
