//! Signature algorithm and verification for the FreeKassa API.
//!
//! Every request body carries a `signature` field computed over all of the
//! other fields in the body:
//!
//! ```text
//! signature = hex(HMAC-SHA256(api_key, "{v1}|{v2}|...|{vn}"))
//! ```
//!
//! where `v1..vn` are the field *values* ordered by their keys in byte order.
//! The `amount` field is rewritten before it enters the message, see
//! [`canonical_amount`].

use ring::hmac;
use serde_json::Value;

use crate::objects::RequestParams;

/// Field name carrying the hex-encoded HMAC.
pub const SIGNATURE_FIELD: &str = "signature";

/// Field name whose value is canonicalized before signing.
pub const AMOUNT_FIELD: &str = "amount";

const MESSAGE_SEPARATOR: &str = "|";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("amount is not a decimal number: {0}")]
    InvalidAmount(String),
    #[error("signature field is missing")]
    Missing,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("invalid signature")]
    SignatureMismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

// ---------------------------------------------------------------------------
// Nonce
// ---------------------------------------------------------------------------

/// The nonce for a request issued right now: the current Unix timestamp in
/// seconds.
pub fn current_nonce() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// ---------------------------------------------------------------------------
// Canonical message
// ---------------------------------------------------------------------------

/// Render an amount the way the gateway expects it inside the signed message.
///
/// The amount travels as a binary float, so the fraction is taken and rounded
/// on the `f64` itself: `amount % 1` is rounded to two decimals (correctly
/// rounded from the exact binary value, exact ties to even), rendered in its
/// shortest form, and the digits after its decimal point are appended directly
/// to the truncated integer part:
///
/// | amount  | rounded fraction | result |
/// |---------|------------------|--------|
/// | `10.0`  | -                | `10`   |
/// | `9.9`   | `0.9`            | `99`   |
/// | `9.955` | `0.96`           | `996`  |
/// | `2.675` | `0.67`           | `267`  |
/// | `1.125` | `0.12`           | `112`  |
/// | `9.999` | `1`              | `90`   |
pub fn canonical_amount(amount: f64) -> String {
    // `+ 0.0` turns a negative zero into zero
    let whole = format!("{:.0}", amount.trunc() + 0.0);
    let fraction = amount.rem_euclid(1.0);
    if fraction <= 0.0 {
        return whole;
    }

    let rounded: f64 = format!("{fraction:.2}").parse().unwrap_or(fraction);
    let rendered = rounded.to_string();
    // A fraction that rounds to a whole number renders as "0.0" / "1.0" on
    // the gateway side, so its only decimal digit is "0".
    let digits = rendered.split_once('.').map_or("0", |(_, digits)| digits);
    format!("{whole}{digits}")
}

/// Build the pipe-joined message that gets signed.
///
/// The `signature` field itself never takes part in the message.
pub fn canonical_message(params: &RequestParams) -> Result<String, SignatureError> {
    let mut fields = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key == SIGNATURE_FIELD {
            continue;
        }
        let rendered = if key == AMOUNT_FIELD {
            canonical_amount(parse_amount(value)?)
        } else {
            render_value(value)
        };
        fields.push((key.as_str(), rendered));
    }

    // keys are unique within a map
    fields.sort_unstable_by(|a, b| a.0.cmp(b.0));

    Ok(fields
        .into_iter()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join(MESSAGE_SEPARATOR))
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_amount(value: &Value) -> Result<f64, SignatureError> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| SignatureError::InvalidAmount(render_value(value)))
}

// ---------------------------------------------------------------------------
// Signing / verification
// ---------------------------------------------------------------------------

/// Compute the hex-encoded signature of `params` with `key`.
pub fn sign(params: &RequestParams, key: &[u8]) -> Result<String, SignatureError> {
    let message = canonical_message(params)?;
    let tag = hmac::sign(
        &hmac::Key::new(hmac::HMAC_SHA256, key),
        message.as_bytes(),
    );
    Ok(hex::encode(tag.as_ref()))
}

/// Sign `params` and store the result as their last field.
///
/// A `signature` already present is replaced.
pub fn append_signature(params: &mut RequestParams, key: &[u8]) -> Result<(), SignatureError> {
    let signature = sign(params, key)?;
    params.shift_remove(SIGNATURE_FIELD);
    params.insert(SIGNATURE_FIELD.to_owned(), Value::String(signature));
    Ok(())
}

/// Check the `signature` field of a received parameter set against the
/// other fields.
pub fn verify(params: &RequestParams, key: &[u8]) -> Result<(), SignatureError> {
    let signature = params
        .get(SIGNATURE_FIELD)
        .and_then(Value::as_str)
        .ok_or(SignatureError::Missing)?;
    let signature = hex::decode(signature).map_err(|_| SignatureError::InvalidHex)?;
    let message = canonical_message(params)?;
    hmac::verify(
        &hmac::Key::new(hmac::HMAC_SHA256, key),
        message.as_bytes(),
        &signature,
    )?;
    Ok(())
}
