use crate::orchestrator::CancellationPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const ENV_PRODUCTION: &str = "production";
const DEFAULT_NAMESPACE: &str = "default";
const NAMESPACE_ENV: &str = "NAMESPACE";

#[derive(Debug, Deserialize, Clone)]
#[allow(unused)]
pub struct Logger {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    pub directory: bool,
    pub console: bool,
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_settle_delay() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct Deploy {
    pub namespace: Option<String>,
    /// Seconds to wait between the cleanup and deploy passes.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: u64,
    #[serde(default)]
    pub cancellation_policy: CancellationPolicy,
}

impl Deploy {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logger: Logger,
    pub deploy: Deploy,
}

impl Settings {
    pub fn mode() -> String {
        env::var("DEPLOYER_ENV").unwrap_or_else(|_| ENV_PRODUCTION.into())
    }

    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = Self::mode();
        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::default().try_parsing(true).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Namespace for the whole run. The `NAMESPACE` environment variable wins,
    /// then `deploy.namespace`, then `default`.
    pub fn namespace(&self) -> String {
        resolve_namespace(env::var(NAMESPACE_ENV).ok(), self.deploy.namespace.as_deref())
    }
}

pub fn resolve_namespace(from_env: Option<String>, configured: Option<&str>) -> String {
    from_env
        .filter(|ns| !ns.is_empty())
        .or_else(|| configured.filter(|ns| !ns.is_empty()).map(String::from))
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}
