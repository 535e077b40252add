// SPDX-FileCopyrightText: 2026 rgbctrl contributors
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for rgbctrl-server.
//!
//! This is distinct from `rgbctrl_core::Config` (the persisted LED
//! animation record exposed over the control plane): `ServerConfig` is
//! the process's own startup configuration — which address/port to
//! listen on, which Pixel Sink backend to drive, where to keep the
//! persisted animation record.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rgbctrl_app::{ConfigError, ConfigFile};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub general: GeneralConfig,
    pub listen: ListenConfig,
    pub sink: SinkConfig,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            general: GeneralConfig::default(),
            listen: ListenConfig::default(),
            sink: SinkConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub device_name: String,
    pub log_level: Option<String>,
    /// Explicit `XX:XX:XX:XX:XX:XX` MAC to report from `discover`. When
    /// unset, one is derived deterministically from `device_name`.
    pub mac: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            device_name: "XBOX RGB".to_string(),
            log_level: None,
            mac: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub addr: IpAddr,
    pub port: u16,
    /// Pre-shared key every JSON op must echo back once set. Unset or
    /// empty disables auth entirely.
    pub psk: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 7777,
            psk: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub backend: String,
    pub serial_path: Option<String>,
    pub serial_baud: u32,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            backend: "dummy".to_string(),
            serial_path: None,
            serial_baud: 115_200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_path: PathBuf::from("rgbctrl.db"),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(level) = self.general.log_level.as_deref() {
            match level {
                "trace" | "debug" | "info" | "warn" | "error" => {}
                _ => return Err(format!("[general].log_level '{level}' is invalid")),
            }
        }
        if self.listen.port == 0 {
            return Err("[listen].port must be > 0".to_string());
        }
        if let Some(psk) = &self.listen.psk {
            if psk.is_empty() {
                return Err("[listen].psk must not be empty when set".to_string());
            }
        }
        match self.sink.backend.as_str() {
            "dummy" => {}
            "serial" => {
                if self.sink.serial_path.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(
                        "[sink].serial_path must be set when backend = \"serial\"".to_string(),
                    );
                }
                if self.sink.serial_baud == 0 {
                    return Err("[sink].serial_baud must be > 0".to_string());
                }
            }
            other => {
                return Err(format!(
                    "[sink].backend '{other}' is invalid (expected \"dummy\" or \"serial\")"
                ))
            }
        }
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load_from_default_paths()
    }

    pub fn example_combined_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "rgbctrl-server")]
            inner: ServerConfig,
        }
        toml::to_string_pretty(&Wrapper {
            inner: ServerConfig::default(),
        })
        .unwrap_or_default()
    }
}

impl ConfigFile for ServerConfig {
    fn config_filename() -> &'static str {
        "rgbctrl-server.toml"
    }

    fn combined_key() -> Option<&'static str> {
        Some("rgbctrl-server")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ServerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.listen.port, 7777);
        assert_eq!(cfg.general.device_name, "XBOX RGB");
    }

    #[test]
    fn rejects_zero_port() {
        let mut cfg = ServerConfig::default();
        cfg.listen.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_serial_backend_without_path() {
        let mut cfg = ServerConfig::default();
        cfg.sink.backend = "serial".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_serial_backend_with_path() {
        let mut cfg = ServerConfig::default();
        cfg.sink.backend = "serial".to_string();
        cfg.sink.serial_path = Some("/dev/ttyUSB0".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn example_combined_toml_round_trips() {
        let example = ServerConfig::example_combined_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        let section = toml::to_string(table.get("rgbctrl-server").unwrap()).unwrap();
        let _cfg: ServerConfig = toml::from_str(&section).unwrap();
    }
}
