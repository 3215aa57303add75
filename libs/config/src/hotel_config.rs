//! Hotel configuration loading
//!
//! Supports an optional TOML file layered over defaults, with `HOTEL_`
//! environment overrides on top.

use crate::defaults;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HotelConfig {
    pub ipc: IpcConfig,
    pub supervisor: SupervisorConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

/// How the ledger travels between processes
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Every process maps the same ledger memory
    #[default]
    Mapped,
    /// A hosting process owns the ledger and answers GET/SET frames
    Brokered,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Mapped => f.write_str("mapped"),
            TransportKind::Brokered => f.write_str("brokered"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mapped" => Ok(TransportKind::Mapped),
            "brokered" => Ok(TransportKind::Brokered),
            other => Err(format!(
                "unknown transport '{other}' (expected 'mapped' or 'brokered')"
            )),
        }
    }
}

/// Names and paths of the shared IPC resources
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct IpcConfig {
    pub transport: TransportKind,
    pub gate_name: String,
    pub rendezvous_name: String,
    pub ledger_path: PathBuf,
    pub request_fifo: PathBuf,
    pub response_fifo: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            gate_name: defaults::ipc::GATE_NAME.to_string(),
            rendezvous_name: defaults::ipc::RENDEZVOUS_NAME.to_string(),
            ledger_path: PathBuf::from(defaults::ipc::LEDGER_PATH),
            request_fifo: PathBuf::from(defaults::ipc::REQUEST_FIFO),
            response_fifo: PathBuf::from(defaults::ipc::RESPONSE_FIFO),
            poll_interval_ms: defaults::ipc::POLL_INTERVAL_MS,
        }
    }
}

impl IpcConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SupervisorConfig {
    pub queue_path: PathBuf,
    /// Program launched for each agent; defaults to the running executable
    pub agent_program: Option<PathBuf>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            queue_path: PathBuf::from(defaults::supervisor::QUEUE_PATH),
            agent_program: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub rent_unit_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            rent_unit_ms: defaults::agent::RENT_UNIT_MS,
        }
    }
}

impl AgentConfig {
    pub fn rent_unit(&self) -> Duration {
        Duration::from_millis(self.rent_unit_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::logging::LEVEL.to_string(),
            json: false,
        }
    }
}

impl HotelConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&HotelConfig::default())
                .context("Failed to build default configuration")?,
        );

        if let Some(path) = path {
            debug!("Loading hotel config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (HOTEL_ prefix)
        builder = builder.add_source(
            Environment::with_prefix("HOTEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Expand `~` and environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        for path in [
            &mut self.ipc.ledger_path,
            &mut self.ipc.request_fifo,
            &mut self.ipc.response_fifo,
            &mut self.supervisor.queue_path,
        ] {
            *path = expand_path(path)?;
        }

        if let Some(program) = &self.supervisor.agent_program {
            self.supervisor.agent_program = Some(expand_path(program)?);
        }

        Ok(())
    }

    /// Reject values the IPC layer cannot work with
    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("ipc.gate_name", &self.ipc.gate_name),
            ("ipc.rendezvous_name", &self.ipc.rendezvous_name),
        ] {
            if !name.starts_with('/') || name.len() < 2 || name[1..].contains('/') {
                bail!("{field} must look like '/name' (got '{name}')");
            }
        }

        if self.ipc.gate_name == self.ipc.rendezvous_name {
            bail!("ipc.gate_name and ipc.rendezvous_name must differ");
        }

        if self.ipc.request_fifo == self.ipc.response_fifo {
            bail!("ipc.request_fifo and ipc.response_fifo must differ");
        }

        if self.ipc.poll_interval_ms == 0 {
            bail!("ipc.poll_interval_ms must be positive");
        }

        Ok(())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded =
        shellexpand::full(&raw).with_context(|| format!("Failed to expand path {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Convenience function: load, expand and validate
pub fn load_config(path: Option<&Path>) -> Result<HotelConfig> {
    let mut config = HotelConfig::load(path)?;
    config.expand_env_vars()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = HotelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.ipc.transport, TransportKind::Mapped);
        assert_eq!(config.agent.rent_unit(), Duration::from_secs(1));
        assert_eq!(config.ipc.poll_interval(), Duration::from_millis(5));
    }

    #[test]
    fn test_load_file_over_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("hotel.toml");

        let config_content = r#"
[ipc]
transport = "brokered"
gate_name = "/test_gate"
request_fifo = "/tmp/test_in"

[agent]
rent_unit_ms = 10

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = HotelConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.ipc.transport, TransportKind::Brokered);
        assert_eq!(config.ipc.gate_name, "/test_gate");
        assert_eq!(config.ipc.request_fifo, PathBuf::from("/tmp/test_in"));
        // untouched keys keep their defaults
        assert_eq!(config.ipc.rendezvous_name, defaults::ipc::RENDEZVOUS_NAME);
        assert_eq!(config.agent.rent_unit_ms, 10);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(HotelConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_serialized_defaults_round_trip_through_toml() {
        let text = toml::to_string(&HotelConfig::default()).unwrap();
        let parsed: HotelConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, HotelConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_semaphore_names() {
        let mut config = HotelConfig::default();
        config.ipc.gate_name = "no_slash".to_string();
        assert!(config.validate().is_err());

        let mut config = HotelConfig::default();
        config.ipc.rendezvous_name = config.ipc.gate_name.clone();
        assert!(config.validate().is_err());

        let mut config = HotelConfig::default();
        config.ipc.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_home_in_paths() {
        let mut config = HotelConfig::default();
        config.supervisor.queue_path = PathBuf::from("~/clients.txt");
        config.expand_env_vars().unwrap();
        assert!(!config.supervisor.queue_path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_transport_kind_parsing() {
        assert_eq!("Mapped".parse::<TransportKind>(), Ok(TransportKind::Mapped));
        assert_eq!("brokered".parse::<TransportKind>(), Ok(TransportKind::Brokered));
        assert!("pipes".parse::<TransportKind>().is_err());
    }
}
