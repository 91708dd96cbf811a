use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::editor::{ActionType, BrushOptions};
use crate::remote::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "retouch";
const APP_CONFIG_FILE: &str = "config.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings from `config.json`; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub brush_size: Option<u32>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn brush_options(&self) -> BrushOptions {
        let defaults = BrushOptions::default();
        BrushOptions::new(
            self.brush_size.unwrap_or(defaults.size()),
            self.action_type.unwrap_or(defaults.action()),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "retouch",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/retouch/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("retouch", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/retouch/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("retouch", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn defaults_apply_when_keys_are_missing() {
        let config: AppConfig = serde_json::from_str("{}").expect("empty object should parse");
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.brush_options(), BrushOptions::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn values_from_file_are_honoured_and_clamped() {
        let config: AppConfig = serde_json::from_str(
            r#"{"endpoint":"http://host/api","brush_size":999,"action_type":"mosaic","request_timeout_secs":5}"#,
        )
        .expect("config should parse");
        assert_eq!(config.endpoint(), "http://host/api");
        assert_eq!(config.brush_options().size(), crate::editor::tools::BRUSH_SIZE_MAX);
        assert_eq!(config.brush_options().action(), ActionType::Mosaic);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn load_falls_back_to_defaults_for_malformed_file() {
        let root = std::env::temp_dir().join("retouch-config-test");
        let dir = root.join(APP_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(APP_CONFIG_FILE), "{not json").unwrap();

        let config = load_app_config_with(Some(&root), None);
        assert!(config.endpoint.is_none());
        let _ = std::fs::remove_dir_all(root);
    }
}
