use cnc_common::Money;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GatewayApiError;

//--------------------------------------  Checkout preferences  -----------------------------------------------------

/// One line item on a checkout preference. Prices are in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CheckoutItem {
    pub fn new<S: Into<String>>(title: S, quantity: u32, unit_price: Money) -> Self {
        Self { title: title.into(), quantity, unit_price }
    }
}

/// The request body for creating a checkout preference.
#[derive(Debug, Clone, Serialize)]
pub struct NewPreference {
    pub items: Vec<CheckoutItem>,
    /// Our order id, echoed back by the gateway in payment lookups.
    pub external_reference: String,
    pub notification_url: String,
}

impl NewPreference {
    pub fn new(items: Vec<CheckoutItem>, external_reference: String, notification_url: String) -> Self {
        Self { items, external_reference, notification_url }
    }

    pub fn total(&self) -> Money {
        self.items.iter().map(|i| Money::from(i.unit_price.value() * i64::from(i.quantity))).sum()
    }
}

/// The gateway's response to a preference creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutPreference {
    pub id: String,
    /// The URL the client opens to complete the payment.
    pub init_point: String,
    #[serde(default)]
    pub external_reference: Option<String>,
}

//--------------------------------------  Payments and merchant orders  ---------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct PaymentInfoWire {
    id: u64,
    status: String,
    transaction_amount: Money,
    #[serde(default)]
    external_reference: Option<String>,
}

/// The gateway's record of a single payment, with the raw response retained for auditing.
#[derive(Debug, Clone)]
pub struct PaymentInfo {
    pub id: u64,
    pub status: String,
    pub transaction_amount: Money,
    pub external_reference: Option<String>,
    pub raw: Value,
}

impl PaymentInfo {
    pub fn from_value(raw: Value) -> Result<Self, GatewayApiError> {
        let wire = serde_json::from_value::<PaymentInfoWire>(raw.clone())
            .map_err(|e| GatewayApiError::JsonError(e.to_string()))?;
        Ok(Self {
            id: wire.id,
            status: wire.status,
            transaction_amount: wire.transaction_amount,
            external_reference: wire.external_reference,
            raw,
        })
    }

    pub fn payment_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerchantOrderPayment {
    pub id: u64,
    pub status: String,
}

/// A merchant order groups the payments made against one preference.
#[derive(Debug, Clone, Deserialize)]
pub struct MerchantOrder {
    pub id: u64,
    pub status: String,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub payments: Vec<MerchantOrderPayment>,
}

//--------------------------------------  Webhook notifications  ----------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRef {
    pub id: String,
}

/// The raw webhook body. The gateway sends two shapes: `{"type": "payment", "data": {"id": ...}}`
/// and `{"topic": "merchant_order", "resource": ...}`. Anything else classifies as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub data: Option<PaymentRef>,
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookPayload {
    Payment { payment_id: String },
    MerchantOrder { resource: String },
}

impl WebhookNotification {
    pub fn payload(&self) -> Option<WebhookPayload> {
        if self.kind.as_deref() == Some("payment") {
            let id = self.data.as_ref()?.id.clone();
            return Some(WebhookPayload::Payment { payment_id: id });
        }
        if self.topic.as_deref() == Some("merchant_order") {
            let resource = self.resource.clone()?;
            return Some(WebhookPayload::MerchantOrder { resource });
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payment_notification_classifies() {
        let body = r#"{"type": "payment", "data": {"id": "11223344"}}"#;
        let note = serde_json::from_str::<WebhookNotification>(body).unwrap();
        assert_eq!(note.payload(), Some(WebhookPayload::Payment { payment_id: "11223344".to_string() }));
    }

    #[test]
    fn merchant_order_notification_classifies() {
        let body = r#"{"topic": "merchant_order", "resource": "https://api.gateway.example.com/merchant_orders/99"}"#;
        let note = serde_json::from_str::<WebhookNotification>(body).unwrap();
        assert_eq!(note.payload(), Some(WebhookPayload::MerchantOrder {
            resource: "https://api.gateway.example.com/merchant_orders/99".to_string(),
        }));
    }

    #[test]
    fn unknown_shapes_classify_as_none() {
        let body = r#"{"topic": "chargebacks", "resource": "/chargebacks/1"}"#;
        let note = serde_json::from_str::<WebhookNotification>(body).unwrap();
        assert_eq!(note.payload(), None);
        let body = r#"{"type": "payment"}"#;
        let note = serde_json::from_str::<WebhookNotification>(body).unwrap();
        assert_eq!(note.payload(), None);
    }

    #[test]
    fn payment_info_keeps_the_raw_response() {
        let raw = serde_json::json!({
            "id": 11223344u64,
            "status": "approved",
            "transaction_amount": 5000,
            "external_reference": "42",
            "payer": {"email": "ana@example.com"}
        });
        let info = PaymentInfo::from_value(raw).unwrap();
        assert_eq!(info.payment_id(), "11223344");
        assert_eq!(info.status, "approved");
        assert_eq!(info.transaction_amount, Money::from(5000));
        assert_eq!(info.external_reference.as_deref(), Some("42"));
        assert_eq!(info.raw["payer"]["email"], "ana@example.com");
    }
}
