use cnc_common::Secret;
use log::*;

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub access_token: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Where the gateway should deliver webhook notifications for new preferences.
    pub notification_url: String,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("CANCHITA_GATEWAY_URL").unwrap_or_else(|_| {
            warn!("CANCHITA_GATEWAY_URL not set, using (probably useless) default");
            "https://api.gateway.example.com".to_string()
        });
        let access_token = Secret::new(std::env::var("CANCHITA_GATEWAY_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("CANCHITA_GATEWAY_ACCESS_TOKEN not set, using (probably useless) default");
            "TEST-00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("CANCHITA_GATEWAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("CANCHITA_GATEWAY_WEBHOOK_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let notification_url = std::env::var("CANCHITA_GATEWAY_NOTIFICATION_URL").unwrap_or_else(|_| {
            warn!("CANCHITA_GATEWAY_NOTIFICATION_URL not set, using (probably useless) default");
            "https://canchita.example.com/gateway/webhook".to_string()
        });
        Self { base_url, access_token, webhook_secret, notification_url }
    }
}
