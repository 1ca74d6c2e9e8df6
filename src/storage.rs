use crate::client::DEFAULT_API_BASE_URL;
use crate::errors::AppError;
use crate::scheduler::{DEFAULT_REFRESH_SECS, clamp_refresh_secs, parse_refresh_secs};
use serde::{Deserialize, Serialize};
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

/// The two persisted preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    #[serde(rename = "apiBaseUrl")]
    pub api_base_url: String,
    #[serde(rename = "refreshInterval")]
    pub refresh_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        let api_base_url = env::var("API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self {
            api_base_url,
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

/// On-disk shape. Either key may be missing; the interval is kept as text
/// because that is what the settings form submits.
#[derive(Debug, Default, Deserialize)]
struct StoredSettings {
    #[serde(rename = "apiBaseUrl")]
    api_base_url: Option<String>,
    #[serde(rename = "refreshInterval")]
    refresh_interval: Option<serde_json::Value>,
}

pub fn resolve_settings_path() -> PathBuf {
    if let Ok(path) = env::var("DASHBOARD_SETTINGS_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/settings.json")
}

pub async fn load_settings(path: &Path, defaults: Settings) -> Settings {
    let stored: StoredSettings = match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(err) => {
                error!("failed to parse settings file: {err}");
                return defaults;
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return defaults,
        Err(err) => {
            error!("failed to read settings file: {err}");
            return defaults;
        }
    };

    let api_base_url = stored
        .api_base_url
        .filter(|url| !url.trim().is_empty())
        .unwrap_or(defaults.api_base_url);
    let refresh_interval_secs = match stored.refresh_interval {
        Some(serde_json::Value::Number(n)) => match n.as_u64() {
            Some(secs) => clamp_refresh_secs(secs),
            // Negative or fractional.
            None => DEFAULT_REFRESH_SECS,
        },
        Some(serde_json::Value::String(raw)) => parse_refresh_secs(&raw),
        _ => defaults.refresh_interval_secs,
    };

    Settings {
        api_base_url,
        refresh_interval_secs,
    }
}

pub async fn persist_settings(path: &Path, settings: &Settings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(settings).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir().join(format!("tasky_settings_{name}_{}_{nanos}.json", std::process::id()))
    }

    fn defaults() -> Settings {
        Settings {
            api_base_url: "http://localhost:8000".into(),
            refresh_interval_secs: 30,
        }
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let settings = load_settings(&temp_path("missing"), defaults()).await;
        assert_eq!(settings, defaults());
    }

    #[tokio::test]
    async fn persisted_settings_load_back() {
        let path = temp_path("persist");
        let saved = Settings {
            api_base_url: "http://tasks.internal:9000".into(),
            refresh_interval_secs: 12,
        };
        persist_settings(&path, &saved).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"apiBaseUrl\""));
        assert!(raw.contains("\"refreshInterval\""));
        assert_eq!(load_settings(&path, defaults()).await, saved);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn partial_and_corrupt_files() {
        let path = temp_path("partial");
        std::fs::write(&path, r#"{"refreshInterval":"45"}"#).unwrap();
        let settings = load_settings(&path, defaults()).await;
        assert_eq!(settings.api_base_url, "http://localhost:8000");
        assert_eq!(settings.refresh_interval_secs, 45);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings(&path, defaults()).await, defaults());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn oversized_interval_is_capped_on_load() {
        let path = temp_path("oversized");
        std::fs::write(&path, r#"{"refreshInterval":18446744073709551615}"#).unwrap();
        let settings = load_settings(&path, defaults()).await;
        assert_eq!(settings.refresh_interval_secs, crate::scheduler::MAX_REFRESH_SECS);

        std::fs::write(&path, r#"{"refreshInterval":-5}"#).unwrap();
        let settings = load_settings(&path, defaults()).await;
        assert_eq!(settings.refresh_interval_secs, DEFAULT_REFRESH_SECS);
        let _ = std::fs::remove_file(&path);
    }
}
