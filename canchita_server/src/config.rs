use std::{env, time::Duration};

use cnc_common::{parse_boolean_flag, Secret};
use gateway_tools::GatewayConfig;
use log::*;

const DEFAULT_CNC_HOST: &str = "127.0.0.1";
const DEFAULT_CNC_PORT: u16 = 8480;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the cancellation and reminder sweeps run.
    pub sweep_interval: Duration,
    /// When false, webhook calls are accepted without an HMAC signature check. **DANGER**
    pub hmac_checks: bool,
    /// Checkout gateway client configuration.
    pub gateway: GatewayConfig,
    /// Push notification endpoint configuration.
    pub push: PushConfig,
}

#[derive(Clone, Debug, Default)]
pub struct PushConfig {
    pub url: String,
    pub access_token: Secret<String>,
    /// When false, push delivery is replaced with a no-op notifier.
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CNC_HOST.to_string(),
            port: DEFAULT_CNC_PORT,
            database_url: String::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            hmac_checks: true,
            gateway: GatewayConfig::default(),
            push: PushConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANCHITA_HOST").ok().unwrap_or_else(|| DEFAULT_CNC_HOST.into());
        let port = env::var("CANCHITA_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CANCHITA_PORT. {e} Using the default, {DEFAULT_CNC_PORT}, \
                         instead."
                    );
                    DEFAULT_CNC_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CNC_PORT);
        let database_url = env::var("CANCHITA_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CANCHITA_DATABASE_URL is not set. Please set it to the URL for the Canchita database.");
            String::default()
        });
        let sweep_interval = env::var("CANCHITA_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL);
        let hmac_checks = parse_boolean_flag(env::var("CANCHITA_GATEWAY_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🪛️ HMAC checks on webhook calls are DISABLED. Do not run like this in production.");
        }
        let gateway = GatewayConfig::new_from_env_or_default();
        let push = PushConfig::from_env_or_default();
        Self { host, port, database_url, sweep_interval, hmac_checks, gateway, push }
    }
}

impl PushConfig {
    pub fn from_env_or_default() -> Self {
        let url = env::var("CANCHITA_PUSH_URL").ok().unwrap_or_else(|| DEFAULT_PUSH_URL.into());
        let access_token = Secret::new(env::var("CANCHITA_PUSH_ACCESS_TOKEN").unwrap_or_default());
        let enabled = parse_boolean_flag(env::var("CANCHITA_PUSH_ENABLED").ok(), true);
        if !enabled {
            info!("🪛️ Push notifications are disabled. Notification events will be logged and dropped.");
        }
        Self { url, access_token, enabled }
    }
}
