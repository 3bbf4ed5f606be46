use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::GatewayConfig,
    data_objects::{CheckoutPreference, MerchantOrder, NewPreference, PaymentInfo},
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Create a checkout preference and return the id and redirect URL the client needs.
    pub async fn create_preference(&self, preference: NewPreference) -> Result<CheckoutPreference, GatewayApiError> {
        let url = self.url("/checkout/preferences");
        debug!("Creating checkout preference for order {}", preference.external_reference);
        let result =
            self.rest_query::<CheckoutPreference, NewPreference>(Method::POST, &url, &[], Some(preference)).await?;
        info!("Created checkout preference {}", result.id);
        Ok(result)
    }

    pub async fn payment_info(&self, payment_id: &str) -> Result<PaymentInfo, GatewayApiError> {
        let url = self.url(&format!("/v1/payments/{payment_id}"));
        debug!("Fetching payment info for payment {payment_id}");
        let raw = self.rest_query::<Value, ()>(Method::GET, &url, &[], None).await?;
        let info = PaymentInfo::from_value(raw)?;
        info!("Fetched payment {payment_id}. Status: {}", info.status);
        Ok(info)
    }

    /// Fetch a merchant order from the resource URL a webhook notification carries. Relative
    /// resources are resolved against the configured base URL.
    pub async fn merchant_order(&self, resource: &str) -> Result<MerchantOrder, GatewayApiError> {
        let url = if resource.starts_with("http") { resource.to_string() } else { self.url(resource) };
        debug!("Fetching merchant order from {url}");
        let result = self.rest_query::<MerchantOrder, ()>(Method::GET, &url, &[], None).await?;
        info!("Fetched merchant order {}", result.id);
        Ok(result)
    }
}
