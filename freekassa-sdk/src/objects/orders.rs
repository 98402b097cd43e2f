//! Order listing filters.

use serde_json::Value;

use super::RequestParams;

/// Filters for `POST /v1/orders`. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    /// Gateway-side order id. Sent as `orderId`.
    pub order_id: Option<i64>,
    /// Merchant-side order id. Sent as `paymentId`.
    pub payment_id: Option<String>,
    /// Sent as `orderStatus`.
    pub order_status: Option<i32>,
    pub page: Option<u32>,
}

impl OrderListQuery {
    pub fn to_fields(&self) -> RequestParams {
        let mut fields = RequestParams::new();
        if let Some(order_id) = self.order_id {
            fields.insert("orderId".to_owned(), Value::from(order_id));
        }
        if let Some(payment_id) = &self.payment_id {
            fields.insert("paymentId".to_owned(), Value::from(payment_id.as_str()));
        }
        if let Some(order_status) = self.order_status {
            fields.insert("orderStatus".to_owned(), Value::from(order_status));
        }
        if let Some(page) = self.page {
            fields.insert("page".to_owned(), Value::from(page));
        }
        fields
    }
}
