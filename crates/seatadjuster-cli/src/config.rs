//! Service configuration – reads `~/.seatadjuster/config.toml`.
//!
//! Every section and field is optional; anything missing falls back to the
//! defaults below.
//!
//! ```toml
//! [mqtt]
//! host = "mosquitto"
//! port = 1883
//!
//! [topics]
//! requests = ["seatadjuster/setPosition/request"]
//!
//! [simulation]
//! speed = 0.0
//! seat_position = 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use seatadjuster_app::Topics;
use seatadjuster_middleware::MqttConfig;
use seatadjuster_types::SeatError;
use serde::{Deserialize, Serialize};

/// Broker connection section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttSection {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

/// Initial values for the in-process vehicle data broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub seat_position: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub topics: Topics,
    #[serde(default)]
    pub simulation: SimulationSection,
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "SeatAdjusterApp".to_string()
}
fn default_keep_alive_secs() -> u64 {
    30
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            speed: 0.0,
            seat_position: 0,
        }
    }
}

impl Config {
    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            host: self.mqtt.host.clone(),
            port: self.mqtt.port,
            client_id: self.mqtt.client_id.clone(),
            keep_alive_secs: self.mqtt.keep_alive_secs,
            ..MqttConfig::default()
        }
    }
}

/// `$SEATADJUSTER_CONFIG` when set, otherwise `~/.seatadjuster/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SEATADJUSTER_CONFIG") {
        return PathBuf::from(path);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".seatadjuster").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, SeatError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, SeatError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        SeatError::Config(format!("failed to read config at {}: {e}", path.display()))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| SeatError::Config(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// The config the service runs with: the file contents (or defaults when
/// there is no usable file) with environment overrides applied on top.
pub fn effective(file: Option<Config>) -> Config {
    let mut cfg = file.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Apply `SEATADJUSTER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SEATADJUSTER_MQTT_HOST` | `mqtt.host` |
/// | `SEATADJUSTER_MQTT_PORT` | `mqtt.port` |
/// | `SEATADJUSTER_CLIENT_ID` | `mqtt.client_id` |
/// | `SEATADJUSTER_SIM_SPEED` | `simulation.speed` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SEATADJUSTER_MQTT_HOST") {
        cfg.mqtt.host = v;
    }
    if let Ok(v) = std::env::var("SEATADJUSTER_MQTT_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.mqtt.port = port;
    }
    if let Ok(v) = std::env::var("SEATADJUSTER_CLIENT_ID") {
        cfg.mqtt.client_id = v;
    }
    if let Ok(v) = std::env::var("SEATADJUSTER_SIM_SPEED")
        && let Ok(speed) = v.parse::<f64>()
    {
        cfg.simulation.speed = speed;
    }
}
