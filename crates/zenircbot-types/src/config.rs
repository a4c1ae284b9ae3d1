//! Service and bus connection configuration.
//!
//! `ServiceConfig` is the top-level config file of one bot service. All
//! fields have defaults matching a Redis instance on the local machine.

use serde::{Deserialize, Serialize};

/// Connection settings for the pub/sub store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Hostname of the store.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Database (namespace) index used for key reads.
    #[serde(default)]
    pub db: i64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
        }
    }
}

impl BusConfig {
    /// Connection URL in `redis://host:port/db` form.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Configuration for one bot service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Name used in announcements and discovery replies.
    #[serde(default = "default_service_name")]
    pub name: String,

    #[serde(default)]
    pub bus: BusConfig,
}

fn default_service_name() -> String {
    "bot".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            bus: BusConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.name, "bot");
        assert_eq!(config.bus.host, "localhost");
        assert_eq!(config.bus.port, 6379);
        assert_eq!(config.bus.db, 0);
    }

    #[test]
    fn test_service_config_deserialize_with_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_service_config_deserialize_partial_bus() {
        let toml_str = r#"
name = "weather"

[bus]
host = "redis.internal"
db = 3
"#;
        let config: ServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.name, "weather");
        assert_eq!(config.bus.host, "redis.internal");
        assert_eq!(config.bus.port, 6379);
        assert_eq!(config.bus.db, 3);
    }

    #[test]
    fn test_bus_url() {
        let bus = BusConfig {
            host: "10.0.0.5".to_string(),
            port: 6380,
            db: 2,
        };
        assert_eq!(bus.url(), "redis://10.0.0.5:6380/2");
        assert_eq!(BusConfig::default().url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_service_config_json() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"name": "admin", "bus": {"port": 7000}}"#).unwrap();
        assert_eq!(config.name, "admin");
        assert_eq!(config.bus.port, 7000);
        assert_eq!(config.bus.host, "localhost");
    }
}
