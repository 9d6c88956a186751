use std::path::Path;

use net::rate_limiter::LimitConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetSection {
    pub ws_addr: String,
    pub http_addr: String,
}

impl Default for NetSection {
    fn default() -> Self {
        Self {
            ws_addr: "0.0.0.0:4600".to_string(),
            http_addr: "0.0.0.0:4610".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub max_connections_total: usize,
    pub max_connections_per_ip: usize,
    pub max_frame_bytes: usize,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            max_connections_total: 1000,
            max_connections_per_ip: 8,
            max_frame_bytes: 8192,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSection {
    /// Directory with optional room template JSON for the content generator.
    pub content_dir: String,
    /// Base URL clients are pointed at by the `topup` command.
    pub topup_base_url: String,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            topup_base_url: "http://localhost:4610".to_string(),
        }
    }
}

/// Top-level drift server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub net: NetSection,
    pub security: SecuritySection,
    pub game: GameSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn to_limit_config(&self) -> LimitConfig {
        LimitConfig {
            max_connections_total: self.security.max_connections_total,
            max_connections_per_ip: self.security.max_connections_per_ip,
            max_frame_bytes: self.security.max_frame_bytes,
        }
    }
}

/// Parse CLI arguments and load config.
/// Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}
