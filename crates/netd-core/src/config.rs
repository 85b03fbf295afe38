//! Configuration recognized by the discovery agent (spec section 6).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Minimum `target_expiration` value, in seconds (spec section 4.6 Phase B).
pub const MIN_TARGET_EXPIRATION_SECS: u64 = 60;

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Per-address budget used to derive the scheduler's deadline.
    #[serde(default = "default_target_expiration")]
    pub target_expiration_secs: u64,
    /// Reported in the START message's `AGENTVERSION` field. Supplied by
    /// configuration, never computed (version strings are out of scope
    /// for the core to derive).
    #[serde(default = "default_agent_version")]
    pub agent_version: String,
    /// Reported in every message's `MODULEVERSION` field.
    #[serde(default = "default_module_version")]
    pub module_version: String,
    /// The `deviceid` tag stamped on every outbound message.
    pub agent_device_id: String,
    /// The management server URL messages are POSTed to.
    pub server_url: String,
    #[serde(default)]
    pub snmp: SnmpConfig,
}

fn default_target_expiration() -> u64 {
    MIN_TARGET_EXPIRATION_SECS
}

fn default_agent_version() -> String {
    "unknown".to_string()
}

fn default_module_version() -> String {
    "unknown".to_string()
}

/// SNMP-specific defaults (spec section 6: "configured ports (default 161)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpConfig {
    #[serde(default = "default_snmp_port")]
    pub default_port: u16,
}

fn default_snmp_port() -> u16 {
    161
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            default_port: default_snmp_port(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {path:?}: {e}")))?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("failed to write config file {path:?}: {e}")))
    }

    /// Effective `target_expiration`: floored at [`MIN_TARGET_EXPIRATION_SECS`]
    /// regardless of what the file says (spec section 4.6).
    pub fn effective_target_expiration_secs(&self) -> u64 {
        self.target_expiration_secs.max(MIN_TARGET_EXPIRATION_SECS)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_device_id.trim().is_empty() {
            return Err(Error::Config("agent_device_id must not be empty".into()));
        }
        if self.server_url.trim().is_empty() {
            return Err(Error::Config("server_url must not be empty".into()));
        }
        if self.snmp.default_port == 0 {
            return Err(Error::Config("snmp.default_port must not be 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_expiration_is_floored_at_sixty() {
        let cfg = Config {
            target_expiration_secs: 10,
            agent_version: "1.0".into(),
            module_version: "1.0".into(),
            agent_device_id: "agent-1".into(),
            server_url: "https://example.test/".into(),
            snmp: SnmpConfig::default(),
        };
        assert_eq!(cfg.effective_target_expiration_secs(), 60);
    }

    #[test]
    fn validate_rejects_empty_device_id() {
        let cfg = Config {
            target_expiration_secs: 60,
            agent_version: "1.0".into(),
            module_version: "1.0".into(),
            agent_device_id: String::new(),
            server_url: "https://example.test/".into(),
            snmp: SnmpConfig::default(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let toml_src = r#"
            agent_device_id = "agent-1"
            server_url = "https://example.test/"
        "#;
        let cfg = Config::load_from_str(toml_src).unwrap();
        assert_eq!(cfg.target_expiration_secs, MIN_TARGET_EXPIRATION_SECS);
        assert_eq!(cfg.snmp.default_port, 161);
    }
}
