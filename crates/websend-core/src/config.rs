use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration loaded from `~/.config/websend/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsendConfig {
    /// Seconds the target application gets to acknowledge a JSON-requested command.
    pub request_timeout_secs: u64,
    /// Timeout for the plain command-relay invocation when no leading timeout is given.
    pub default_relay_timeout_secs: u64,
    /// Executable started when the target application is not running.
    /// When unset, a platform default or the target name on `PATH` is used.
    #[serde(default)]
    pub launch_path: Option<PathBuf>,
    /// Milliseconds to wait after starting the target before retrying delivery.
    pub launch_grace_ms: u64,
    /// Directory downloaded files are placed in (defaults to the system temp dir).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Maximum number of HTTP redirects followed per transfer.
    pub max_redirects: u32,
    /// Firefox native-messaging extension ids that start a framed session.
    #[serde(default = "default_firefox_extension_ids")]
    pub firefox_extension_ids: Vec<String>,
}

fn default_firefox_extension_ids() -> Vec<String> {
    vec!["@websend".to_string()]
}

impl Default for WebsendConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            default_relay_timeout_secs: 10,
            launch_path: None,
            launch_grace_ms: 1000,
            download_dir: None,
            connect_timeout_secs: 30,
            max_redirects: 10,
            firefox_extension_ids: default_firefox_extension_ids(),
        }
    }
}

impl WebsendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn launch_grace(&self) -> Duration {
        Duration::from_millis(self.launch_grace_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Directory for downloads: the configured one, else the system temp dir.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("websend")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WebsendConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path (e.g. `--config`).
pub fn load_or_init_at(path: &Path) -> Result<WebsendConfig> {
    if !path.exists() {
        let default_cfg = WebsendConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: WebsendConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = WebsendConfig::default();
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.default_relay_timeout_secs, 10);
        assert_eq!(cfg.launch_grace_ms, 1000);
        assert!(cfg.launch_path.is_none());
        assert_eq!(cfg.firefox_extension_ids, vec!["@websend".to_string()]);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            request_timeout_secs = 3
            default_relay_timeout_secs = 0
            launch_grace_ms = 250
            connect_timeout_secs = 5
            max_redirects = 2
            launch_path = "/opt/praat/praat"
            download_dir = "/var/tmp/websend"
        "#;
        let cfg: WebsendConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.default_relay_timeout_secs, 0);
        assert_eq!(cfg.launch_grace(), Duration::from_millis(250));
        assert_eq!(cfg.launch_path.as_deref(), Some(Path::new("/opt/praat/praat")));
        assert_eq!(cfg.resolved_download_dir(), PathBuf::from("/var/tmp/websend"));
        assert_eq!(cfg.firefox_extension_ids, vec!["@websend".to_string()]);
    }

    #[test]
    fn download_dir_defaults_to_temp_dir() {
        let cfg = WebsendConfig::default();
        assert_eq!(cfg.resolved_download_dir(), std::env::temp_dir());
    }

    #[test]
    fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.request_timeout_secs, 10);

        let reloaded = load_or_init_at(&path).unwrap();
        assert_eq!(reloaded.max_redirects, cfg.max_redirects);
    }
}
