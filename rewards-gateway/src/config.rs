use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub ledger: LedgerSection,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LedgerSection {
    pub mailbox_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            ledger: LedgerSection {
                mailbox_capacity: rewards_ledger::Config::default().mailbox_capacity,
            },
            log: LogConfig {
                json: false,
                level: "info".to_string(),
            },
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GatewayConfig::default();

        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            // Ledger defaults
            .set_default("ledger.mailbox_capacity", defaults.ledger.mailbox_capacity as i64)?
            // Logging defaults
            .set_default("log.json", defaults.log.json)?
            .set_default("log.level", defaults.log.level)?;

        builder = builder.add_source(Environment::with_prefix("REWARDS_GATEWAY").separator("__"));

        // Plain PORT wins, matching the usual container convention
        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        let config: GatewayConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger_config()
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Engine-side view of this configuration
    pub fn ledger_config(&self) -> rewards_ledger::Config {
        rewards_ledger::Config {
            service_name: "rewards-gateway".to_string(),
            mailbox_capacity: self.ledger.mailbox_capacity,
            ..rewards_ledger::Config::default()
        }
    }
}
