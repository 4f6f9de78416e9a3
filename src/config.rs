use anyhow::{anyhow, Result};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::ParticipantRole;
use crate::store::DEFAULT_NOTIFICATION_LIMIT;

pub const ENV_ACK_DELAY_MS: &str = "CLINIC_CHAT_ACK_DELAY_MS";
pub const ENV_LOCAL_ROLE: &str = "CLINIC_CHAT_LOCAL_ROLE";
pub const ENV_LOG_LEVEL: &str = "CLINIC_CHAT_LOG_LEVEL";

/// Session settings, read from `config.json` in the user's config directory
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Delay before a sent message is acknowledged
    pub ack_delay_ms: u64,
    /// Which side of the conversations the local user is on
    pub local_role: ParticipantRole,
    pub notification_limit: usize,
    /// Capacity of the snapshot channel handed to the renderer
    pub snapshot_buffer: usize,
    pub log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            ack_delay_ms: 1000,
            local_role: ParticipantRole::Patient,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
            snapshot_buffer: 100,
            log_level: "info".to_string(),
            seed_file: None,
        }
    }
}

impl ChatConfig {
    pub fn ack_delay(&self) -> Duration {
        Duration::from_millis(self.ack_delay_ms)
    }

    /// Apply `CLINIC_CHAT_*` environment variables on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_ACK_DELAY_MS) {
            match value.trim().parse::<u64>() {
                Ok(ms) => self.ack_delay_ms = ms,
                Err(e) => warn!("Ignoring {}='{}': {}", ENV_ACK_DELAY_MS, value, e),
            }
        }
        if let Some(value) = lookup(ENV_LOCAL_ROLE) {
            match value.parse::<ParticipantRole>() {
                Ok(role) => self.local_role = role,
                Err(e) => warn!("Ignoring {}: {}", ENV_LOCAL_ROLE, e),
            }
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value.trim().to_string();
        }
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Point this process at a different config file. Only the first call wins.
pub fn set_config_path_override(path: PathBuf) {
    if CONFIG_PATH_OVERRIDE.set(path).is_err() {
        warn!("Config path override already set, keeping the first one");
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("clinic-chat");
    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

/// Load the config file (defaults if it does not exist) and apply env overrides
pub fn load_config() -> Result<ChatConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    config.apply_env_overrides();
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<ChatConfig> {
    if !path.exists() {
        info!("No config at {}, using defaults", path.display());
        return Ok(ChatConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: ChatConfig = serde_json::from_str(&contents)
        .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn save_config(config: &ChatConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    info!("Config saved to {}", path.display());
    Ok(())
}
