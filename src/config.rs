//! Environment-driven configuration, loaded once at boot.

use crate::error::{Result, TaskError};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_DATABASE: &str = "taskdb";
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_millis(5000);

const USERNAME_KEY: &str = "MONGODB_USERNAME";
const PASSWORD_KEY: &str = "MONGODB_PASSWORD";
const HOSTNAME_KEYS: [&str; 2] = ["MONGODB_HOSTNAME", "MONGODB_HOST"];
const PORT_KEY: &str = "MONGODB_PORT";
const DATABASE_KEYS: [&str; 2] = ["MONGODB_DBNAME", "MONGODB_DATABASE"];
const URI_KEY: &str = "MONGODB_URI";
const INSTANCE_NAME_KEY: &str = "HOSTNAME";
const INSTANCE_IP_KEY: &str = "POD_IP";
const SECRET_KEY: &str = "SECRET_KEY";
const PING_TIMEOUT_KEY: &str = "TASKBOARD_PING_TIMEOUT_MS";

/// Raw connection inputs. Every field is optional; the resolver decides
/// which of them are used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub uri: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub database_name: Option<String>,
}

impl ConnectionConfig {
    /// Read the connection keys from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Read the connection keys through `lookup`, treating blank values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(lookup(key));
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(*key));

        let port = match get(PORT_KEY) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or(TaskError::InvalidPort(raw))?,
            ),
            None => None,
        };

        Ok(ConnectionConfig {
            uri: get(URI_KEY),
            username: get(USERNAME_KEY),
            password: get(PASSWORD_KEY),
            hostname: first(&HOSTNAME_KEYS[..]),
            port,
            database_name: first(&DATABASE_KEYS[..]),
        })
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_name(&self) -> &str {
        self.database_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
    }
}

/// Identity of the running service copy, stamped onto every write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub name: String,
    pub ip: String,
}

impl InstanceInfo {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        InstanceInfo {
            name: name.into(),
            ip: ip.into(),
        }
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        InstanceInfo {
            name: non_blank(lookup(INSTANCE_NAME_KEY)).unwrap_or_else(|| "local".to_string()),
            ip: non_blank(lookup(INSTANCE_IP_KEY)).unwrap_or_else(|| "localhost".to_string()),
        }
    }
}

/// Everything the process needs at boot, built once and passed by reference
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub connection: ConnectionConfig,
    pub instance: InstanceInfo,
    pub ping_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // The session key belongs to the HTTP layer; its absence is not ours to fail on.
        if non_blank(lookup(SECRET_KEY)).is_none() {
            warn!("SECRET_KEY not set, the HTTP layer will fall back to an insecure default");
        }

        let ping_timeout = match non_blank(lookup(PING_TIMEOUT_KEY)) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(TaskError::InvalidTimeout(raw))?,
            None => DEFAULT_PING_TIMEOUT,
        };

        Ok(ServiceConfig {
            connection: ConnectionConfig::from_lookup(&lookup)?,
            instance: InstanceInfo::from_lookup(&lookup),
            ping_timeout,
        })
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment() {
        let config = ConnectionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConnectionConfig::default());
        assert_eq!(config.port(), 27017);
        assert_eq!(config.database_name(), "taskdb");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("MONGODB_USERNAME", "   "),
            ("MONGODB_URI", ""),
            ("MONGODB_HOSTNAME", " db.internal "),
        ]))
        .unwrap();
        assert_eq!(config.username, None);
        assert_eq!(config.uri, None);
        assert_eq!(config.hostname.as_deref(), Some("db.internal"));
    }

    #[test]
    fn test_legacy_aliases() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("MONGODB_HOST", "legacy-host"),
            ("MONGODB_DATABASE", "legacydb"),
        ]))
        .unwrap();
        assert_eq!(config.hostname.as_deref(), Some("legacy-host"));
        assert_eq!(config.database_name(), "legacydb");
    }

    #[test]
    fn test_primary_key_beats_alias() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("MONGODB_HOSTNAME", "new-host"),
            ("MONGODB_HOST", "old-host"),
            ("MONGODB_DBNAME", "newdb"),
            ("MONGODB_DATABASE", "olddb"),
        ]))
        .unwrap();
        assert_eq!(config.hostname.as_deref(), Some("new-host"));
        assert_eq!(config.database_name(), "newdb");
    }

    #[test]
    fn test_port_parsing() {
        let config =
            ConnectionConfig::from_lookup(lookup(&[("MONGODB_PORT", "27018")])).unwrap();
        assert_eq!(config.port(), 27018);

        let result = ConnectionConfig::from_lookup(lookup(&[("MONGODB_PORT", "mongo")]));
        assert!(matches!(result, Err(TaskError::InvalidPort(p)) if p == "mongo"));

        let result = ConnectionConfig::from_lookup(lookup(&[("MONGODB_PORT", "70000")]));
        assert!(matches!(result, Err(TaskError::InvalidPort(_))));

        let result = ConnectionConfig::from_lookup(lookup(&[("MONGODB_PORT", "0")]));
        assert!(matches!(result, Err(TaskError::InvalidPort(_))));
    }

    #[test]
    fn test_service_defaults() {
        let service = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(service.instance, InstanceInfo::new("local", "localhost"));
        assert_eq!(service.ping_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_service_instance_and_timeout() {
        let service = ServiceConfig::from_lookup(lookup(&[
            ("HOSTNAME", "taskboard-7d9f-abcde"),
            ("POD_IP", "10.1.2.3"),
            ("TASKBOARD_PING_TIMEOUT_MS", "250"),
            ("SECRET_KEY", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(service.instance.name, "taskboard-7d9f-abcde");
        assert_eq!(service.instance.ip, "10.1.2.3");
        assert_eq!(service.ping_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_timeout() {
        let result = ServiceConfig::from_lookup(lookup(&[("TASKBOARD_PING_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(TaskError::InvalidTimeout(_))));
    }
}
