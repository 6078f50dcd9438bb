use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const APP_NAME: &str = "reelname";
pub const APP_TITLE: &str = "Reelname";
pub const APP_SUMMARY: &str = "Create Jellyfin compatible folder names for movies";

/// Fixed token naming the single-instance endpoint
const INSTANCE_TOKEN: &str = "5c0d7e52";

/// Longest socket path every unix accepts (`sun_path` is 104 bytes on macOS)
#[cfg(unix)]
pub const MAX_SOCKET_PATH_LEN: usize = 103;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub instance: InstanceConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_search_pages")]
    pub search_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_true")]
    pub audible_cues: bool,
    #[serde(default = "default_true")]
    pub watch_clipboard: bool,
}

fn default_base_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_search_pages() -> u32 {
    2 // OMDb pages hold 10 results each
}

fn default_connect_timeout_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_accent_color() -> String {
    "cyan".to_string()
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            search_pages: default_search_pages(),
        }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
            audible_cues: true,
            watch_clipboard: true,
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME).ok_or(Error::NoConfigDir)
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|d| d.data_dir().to_path_buf())
        .ok_or(Error::NoDataDir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("log"))
}

/// Home directory, used when the data directory is unusable
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(unix)]
fn socket_path_in(dir: &std::path::Path) -> PathBuf {
    dir.join(format!("{}-{}.sock", APP_NAME, INSTANCE_TOKEN))
}

#[cfg(unix)]
pub fn socket_path_fits(path: &std::path::Path) -> bool {
    path.as_os_str().len() <= MAX_SOCKET_PATH_LEN
}

/// Well-known endpoint the single-instance coordinator connects to or binds.
///
/// Prefers the per-user runtime directory and falls back to the temp
/// directory, which is short enough on macOS where there is no runtime dir.
#[cfg(unix)]
pub fn instance_endpoint() -> Result<PathBuf> {
    let runtime = project_dirs()?.runtime_dir().map(|d| d.to_path_buf());
    let candidates = runtime.into_iter().chain([std::env::temp_dir()]);

    let mut last = None;
    for dir in candidates {
        let path = socket_path_in(&dir);
        if socket_path_fits(&path) {
            std::fs::create_dir_all(&dir)?;
            return Ok(path);
        }
        last = Some(path);
    }

    let path = last.unwrap_or_else(|| socket_path_in(&std::env::temp_dir()));
    tracing::warn!(
        endpoint = %path.display(),
        len = path.as_os_str().len(),
        max = MAX_SOCKET_PATH_LEN,
        "Instance endpoint path is too long for a unix socket, single-instance mode will not work"
    );
    Ok(path)
}

#[cfg(windows)]
pub fn instance_endpoint() -> Result<PathBuf> {
    Ok(PathBuf::from(format!(
        r"\\.\pipe\{}-{}",
        APP_NAME, INSTANCE_TOKEN
    )))
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        if !path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_take_defaults() {
        let config: Config = toml::from_str("[ui]\naccent_color = \"green\"\n").unwrap();
        assert_eq!(config.ui.accent_color, "green");
        assert!(config.ui.audible_cues);
        assert!(config.instance.enabled);
        assert_eq!(config.instance.connect_timeout_ms, 500);
        assert_eq!(config.lookup.base_url, "https://www.omdbapi.com/");
        assert_eq!(config.lookup.search_pages, 2);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.lookup.api_key = "abc123".to_string();
        config.ui.watch_clipboard = false;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.lookup.api_key, "abc123");
        assert!(!loaded.ui.watch_clipboard);
        assert_eq!(loaded.lookup.timeout_secs, 15);
    }

    #[cfg(unix)]
    #[test]
    fn test_instance_endpoint_fits_socket_limit() {
        let path = instance_endpoint().unwrap();
        assert!(socket_path_fits(&path), "{} is too long", path.display());
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "reelname-5c0d7e52.sock"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_path_in_macos_temp_dir_fits() {
        // Typical $TMPDIR on macOS
        let dir = std::path::Path::new("/var/folders/zz/zyxvpxvq6csfxvn_n0000000000000/T/");
        assert!(socket_path_fits(&socket_path_in(dir)));

        let deep = std::path::Path::new(
            "/Users/jappleseed/Library/Application Support/reelname/a/much/deeper/directory/tree",
        );
        assert!(!socket_path_fits(&socket_path_in(deep)));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lookup\napi_key = 1").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
