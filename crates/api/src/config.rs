use bizhub_database::DatabaseConfig;
use bizhub_tenant::RoutingPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub routing_policy: RoutingPolicy,
    /// `None` disables the background reconciliation sweep
    pub sweep_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database: DatabaseConfig::from_env(),
            routing_policy: RoutingPolicy::from_env(),
            sweep_interval: match std::env::var("TENANT_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60)
            {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}
