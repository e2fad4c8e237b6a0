//! Configuration loading and parsing.
//!
//! Parses `mygrid.toml`, looked up in the working directory first and then
//! the platform config dir (`~/.config/mygrid/mygrid.toml` on Unix). All
//! sections and fields are optional; unknown fields are ignored so older
//! binaries tolerate newer files. A file that fails to parse falls back to
//! defaults with a logged warning: configuration is never fatal.
//!
//! CLI flags override anything loaded here; the merge happens in the binary.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_host")]
    pub host: String,
    #[serde(default = "ApiConfig::default_port")]
    pub port: u16,
    /// Path for the command FIFO; `None` disables it unless a CLI flag
    /// supplies one.
    #[serde(default = "ApiConfig::default_fifo_path")]
    pub fifo_path: Option<PathBuf>,
    /// Commands consumed from the API queue per rendered frame.
    #[serde(default = "ApiConfig::default_commands_per_frame")]
    pub commands_per_frame: usize,
}

impl ApiConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }
    fn default_port() -> u16 {
        8765
    }
    fn default_fifo_path() -> Option<PathBuf> {
        Some(PathBuf::from("/tmp/mygrid.fifo"))
    }
    fn default_commands_per_frame() -> usize {
        10
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            fifo_path: Self::default_fifo_path(),
            commands_per_frame: Self::default_commands_per_frame(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RenderConfig {
    /// Frame-rate ceiling for continuous (`--server`) mode.
    #[serde(default = "RenderConfig::default_fps")]
    pub fps: u32,
}

impl RenderConfig {
    fn default_fps() -> u32 {
        20
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: Self::default_fps(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ZonesConfig {
    /// Default buffer capacity for zones created without an explicit cap.
    #[serde(default = "ZonesConfig::default_max_lines")]
    pub default_max_lines: usize,
}

impl ZonesConfig {
    fn default_max_lines() -> usize {
        1000
    }
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            default_max_lines: Self::default_max_lines(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub zones: ZonesConfig,
}

/// Best-effort config path following platform conventions.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("mygrid.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("mygrid").join("mygrid.toml");
    }
    PathBuf::from("mygrid.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<Config>(&content) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                warn!(target: "config", file = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Config::default())
            }
        },
        Err(_) => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.api.port, 8765);
        assert_eq!(cfg.api.commands_per_frame, 10);
        assert_eq!(cfg.render.fps, 20);
        assert_eq!(cfg.zones.default_max_lines, 1000);
    }

    #[test]
    fn parses_partial_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[api]\nport = 9100\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.api.port, 9100);
        assert_eq!(cfg.api.host, "127.0.0.1");
        assert_eq!(cfg.render.fps, 20);
    }

    #[test]
    fn unknown_fields_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[api]\nport = 9200\nfuture_flag = true\n[telemetry]\nenable = 1\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.api.port, 9200);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "this is not { toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn fifo_path_can_be_disabled() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[api]\nfifo_path = \"/run/grid.fifo\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.api.fifo_path, Some(PathBuf::from("/run/grid.fifo")));
    }
}
