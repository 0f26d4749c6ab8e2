use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub auth: Auth,
    pub log: Log,
    pub notify: Notify,
    pub storage: Storage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    pub token_key: String,
    pub login_path: String,
    pub logout_path: String,
    pub refresh_path: String,
    /// Path prefixes sent without a bearer token.
    pub public_paths: Vec<String>,
    /// 401 messages that must not end the session.
    pub expected_messages: Vec<String>,
    pub login_route: String,
    pub redirect_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notify {
    pub debounce_ms: u64,
    pub success: bool,
    #[serde(default)]
    pub success_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory", "file" or "redis"
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default)]
    pub redis_dsn: Option<String>,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
    #[serde(default)]
    pub redis_ttl_secs: Option<u64>,
}

fn default_storage_path() -> String {
    ".waypoint".to_string()
}

fn default_redis_prefix() -> String {
    "waypoint".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
