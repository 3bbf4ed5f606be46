mod api;
mod config;
mod error;

mod data_objects;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{
    CheckoutItem,
    CheckoutPreference,
    MerchantOrder,
    MerchantOrderPayment,
    NewPreference,
    PaymentInfo,
    PaymentRef,
    WebhookNotification,
    WebhookPayload,
};
pub use error::GatewayApiError;
