use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

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
    #[serde(default = "default_false")]
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
            ansi_colors: default_false(),
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
    "golf_distance_bridge".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint_url: default_endpoint_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint_url() -> String {
    "https://getpantry.cloud/apiv1/pantry/golf-distance/basket/golf_distance".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Wearable SDK
    #[serde(default = "default_access_group")]
    pub keychain_access_group: String,

    // Remote store
    #[serde(default)]
    pub reporter: ReporterSettings,

    // Data files; None means built-in course / config dir defaults
    #[serde(default)]
    pub course_file: Option<PathBuf>,
    #[serde(default)]
    pub club_distances_file: Option<PathBuf>,
    #[serde(default)]
    pub golf_info_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            keychain_access_group: default_access_group(),
            reporter: ReporterSettings::default(),
            course_file: None,
            club_distances_file: None,
            golf_info_file: None,
        }
    }
}

fn default_access_group() -> String {
    "golf-distance-bridge".to_string()
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::config_dir()?.join("settings.json");
        Ok(Self::with_path(settings_path))
    }

    /// Load from an explicit file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("GolfDistanceBridge");
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
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

    /// Where club distances live unless the settings point elsewhere.
    pub fn club_distances_path(&self) -> PathBuf {
        match &self.settings.club_distances_file {
            Some(path) => path.clone(),
            None => self
                .settings_path
                .with_file_name("club_distances.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::with_path(dir.path().join("settings.json"));
        assert_eq!(service.get().log_settings.level, "info");
        assert!(service.get().reporter.enabled);
        assert!(service.get().course_file.is_none());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"reporter": {"enabled": false}}"#).unwrap();

        let service = SettingsService::with_path(path);
        assert!(!service.get().reporter.enabled);
        assert_eq!(service.get().reporter.timeout_secs, 15);
        assert_eq!(service.get().keychain_access_group, "golf-distance-bridge");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut service = SettingsService::with_path(path.clone());
        service.get_mut().log_settings.level = "debug".to_string();
        service.get_mut().golf_info_file = Some(PathBuf::from("info.txt"));
        service.save().unwrap();

        let reloaded = SettingsService::with_path(path);
        assert_eq!(reloaded.get().log_settings.level, "debug");
        assert_eq!(
            reloaded.get().golf_info_file.as_deref(),
            Some(Path::new("info.txt"))
        );
        assert_eq!(
            reloaded.club_distances_path(),
            dir.path().join("nested").join("club_distances.json")
        );
    }
}
