//! Request payload types for the FreeKassa API.

pub mod order;
pub mod orders;

pub use order::{EmailAddress, OrderError, OrderRequest};
pub use orders::OrderListQuery;

/// An ordered field-name → value mapping, used both for signed request
/// payloads and for the JSON objects the gateway answers with.
///
/// Insertion order is preserved on the wire.
pub type RequestParams = serde_json::Map<String, serde_json::Value>;

/// `POST /v1/balance`
pub const BALANCE_ROUTE: &str = "balance";
/// `POST /v1/orders`
pub const ORDERS_ROUTE: &str = "orders";
/// `POST /v1/orders/create`
pub const ORDERS_CREATE_ROUTE: &str = "orders/create";

/// Merchant identifier, first field of every request.
pub const SHOP_ID_FIELD: &str = "shopId";
/// Per-request freshness token, second field of every request.
pub const NONCE_FIELD: &str = "nonce";
