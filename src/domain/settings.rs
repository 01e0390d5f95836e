use crate::domain::models::ReadProtocol;
use crate::infrastructure::bluetooth::protocol;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "bleio_client".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Device selection
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// When set, connect by address ("aa:bb:cc:dd:ee:ff") instead of by name
    #[serde(default)]
    pub device_address: Option<String>,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Advanced BLE Settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_write_uuid")]
    pub ble_write_char_uuid: String,
    #[serde(default = "default_read_uuid")]
    pub ble_read_char_uuid: String,
    #[serde(default = "default_adc_uuid")]
    pub ble_adc_char_uuid: String,
    #[serde(default)]
    pub read_protocol: ReadProtocol,

    // Legacy single-pin polling
    #[serde(default = "default_poll_max_retries")]
    pub poll_max_retries: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            device_address: None,
            log_settings: LogSettings::default(),
            ble_service_uuid: default_service_uuid(),
            ble_write_char_uuid: default_write_uuid(),
            ble_read_char_uuid: default_read_uuid(),
            ble_adc_char_uuid: default_adc_uuid(),
            read_protocol: ReadProtocol::default(),
            poll_max_retries: default_poll_max_retries(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_device_name() -> String {
    "BLEIO".to_string()
}
fn default_service_uuid() -> String {
    protocol::SERVICE_UUID.to_string()
}
fn default_write_uuid() -> String {
    protocol::WRITE_CHAR_UUID.to_string()
}
fn default_read_uuid() -> String {
    protocol::READ_CHAR_UUID.to_string()
}
fn default_adc_uuid() -> String {
    protocol::ADC_CHAR_UUID.to_string()
}
fn default_poll_max_retries() -> u32 {
    30
}
fn default_poll_interval_ms() -> u64 {
    100
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    /// Load from an explicit path, falling back to defaults if the file is missing or invalid
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("Bleio");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
