use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "creator-swipes")]
#[command(about = "Runs the creator swipes service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".creator-swipes")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

/// Resolves the config file and the directory the database lives in.
///
/// An explicit `--config` puts the data next to the config file, otherwise
/// both live under `~/.creator-swipes/`.
pub fn resolve_paths(config_path: Option<String>) -> (PathBuf, PathBuf) {
    match config_path {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

impl App {
    pub fn get_db(&self) -> &str {
        return &self.database;
    }

    pub fn get_port(&self) -> u16 {
        return self.port;
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

fn default_token_ttl_days() -> i64 {
    30
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RateLimit {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    60
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

/// Free-tier ceilings, used when a user record carries no quota of its own.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Quotas {
    #[serde(default = "default_max_collections")]
    pub max_collections: i64,
    #[serde(default = "default_max_swipes_per_collection")]
    pub max_swipes_per_collection: i64,
}

fn default_max_collections() -> i64 {
    5
}

fn default_max_swipes_per_collection() -> i64 {
    20
}

impl Default for Quotas {
    fn default() -> Self {
        Quotas {
            max_collections: default_max_collections(),
            max_swipes_per_collection: default_max_swipes_per_collection(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
    pub auth: Auth,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub quotas: Quotas,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        if config.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("auth.jwt_secret must not be empty");
        }
        Ok(config)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = %var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
