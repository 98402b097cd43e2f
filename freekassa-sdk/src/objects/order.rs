//! Order creation payload.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use url::Url;
use validator::ValidateEmail;

use super::RequestParams;

/// Currency used when the caller does not pick one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Errors raised while validating an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("amount {0} cannot be sent as a JSON number")]
    UnrepresentableAmount(Decimal),
    #[error("currency code is empty")]
    EmptyCurrency,
    #[error("{field} must be an http(s) url, got {url}")]
    UnsupportedUrl { field: &'static str, url: Url },
}

/// A syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(value: impl Into<String>) -> Result<Self, OrderError> {
        let value = value.into();
        if value.validate_email() {
            Ok(Self(value))
        } else {
            Err(OrderError::InvalidEmail(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EmailAddress {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request payload for creating a new payment order.
///
/// Optional fields are only sent (and signed) when they are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Payment system the buyer pays with. Sent as `i`.
    pub payment_system_id: i64,
    pub email: EmailAddress,
    pub ip: IpAddr,
    pub amount: Decimal,
    /// Sent as `currency`.
    pub currency_code: String,
    /// Merchant-side order identifier. Sent as `paymentId`.
    pub payment_id: Option<String>,
    /// Buyer phone number. Sent as `tel`.
    pub phone: Option<String>,
    pub success_url: Option<Url>,
    pub failure_url: Option<Url>,
    pub notification_url: Option<Url>,
}

impl OrderRequest {
    /// Create an order in the default currency with no optional fields.
    pub fn new(payment_system_id: i64, email: EmailAddress, ip: IpAddr, amount: Decimal) -> Self {
        Self {
            payment_system_id,
            email,
            ip,
            amount,
            currency_code: DEFAULT_CURRENCY.to_owned(),
            payment_id: None,
            phone: None,
            success_url: None,
            failure_url: None,
            notification_url: None,
        }
    }

    pub fn with_currency(mut self, currency_code: impl Into<String>) -> Self {
        self.currency_code = currency_code.into();
        self
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_success_url(mut self, url: Url) -> Self {
        self.success_url = Some(url);
        self
    }

    pub fn with_failure_url(mut self, url: Url) -> Self {
        self.failure_url = Some(url);
        self
    }

    pub fn with_notification_url(mut self, url: Url) -> Self {
        self.notification_url = Some(url);
        self
    }

    /// Check the invariants the type system does not already guarantee.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.amount <= Decimal::ZERO {
            return Err(OrderError::NonPositiveAmount(self.amount));
        }
        if self.currency_code.trim().is_empty() {
            return Err(OrderError::EmptyCurrency);
        }
        for (field, url) in self.urls() {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(OrderError::UnsupportedUrl {
                    field,
                    url: url.clone(),
                });
            }
        }
        Ok(())
    }

    fn urls(&self) -> impl Iterator<Item = (&'static str, &Url)> {
        [
            ("success_url", self.success_url.as_ref()),
            ("failure_url", self.failure_url.as_ref()),
            ("notification_url", self.notification_url.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, url)| url.map(|url| (field, url)))
    }

    /// Validate the order and map it to the gateway's field names.
    pub fn to_fields(&self) -> Result<RequestParams, OrderError> {
        self.validate()?;

        let amount = self
            .amount
            .to_f64()
            .and_then(Number::from_f64)
            .ok_or(OrderError::UnrepresentableAmount(self.amount))?;

        let mut fields = RequestParams::new();
        fields.insert("i".to_owned(), Value::from(self.payment_system_id));
        fields.insert("email".to_owned(), Value::from(self.email.as_str()));
        fields.insert("ip".to_owned(), Value::from(self.ip.to_string()));
        fields.insert("amount".to_owned(), Value::Number(amount));
        fields.insert("currency".to_owned(), Value::from(self.currency_code.as_str()));

        if let Some(payment_id) = &self.payment_id {
            fields.insert("paymentId".to_owned(), Value::from(payment_id.as_str()));
        }
        if let Some(phone) = &self.phone {
            fields.insert("tel".to_owned(), Value::from(phone.as_str()));
        }
        for (field, url) in self.urls() {
            fields.insert(field.to_owned(), Value::from(url.as_str()));
        }

        Ok(fields)
    }
}
