use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configured backend base address.
pub const BACKEND_URL_ENV: &str = "BANKWATCH_BACKEND_URL";

/// Identifier used to compute per-app configuration directories.
#[derive(Clone, Copy)]
pub struct AppId {
    /// Reverse-DNS style qualifier, e.g. `"com"`.
    pub qualifier: &'static str,
    /// Organization or vendor name, e.g. `"local"`.
    pub organization: &'static str,
    /// Application name, e.g. `"bankwatch"`.
    pub application: &'static str,
}

/// Application configuration persisted to `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tracing level to use if `RUST_LOG` is not set (e.g. `"info"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base address of the backend service, scheme and authority only.
    /// Resolved once at process start; [`BACKEND_URL_ENV`] wins over the file.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_backend_url() -> String { "http://127.0.0.1:8000".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self { log_level: default_log_level(), backend_url: default_backend_url() }
    }
}

/// Return the configuration directory for this app, creating it if needed.
pub fn config_dir(app: &AppId) -> Result<PathBuf> {
    let pd = ProjectDirs::from(app.qualifier, app.organization, app.application)
        .ok_or_else(|| anyhow::anyhow!("failed to resolve ProjectDirs"))?;
    let dir = pd.config_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("create config dir {}", dir.display()))?;
    Ok(dir)
}

/// Load `config.toml` from the app config dir, creating a default one on
/// first run, then apply the environment override for the backend address.
pub fn load_or_init(app: &AppId) -> Result<Config> {
    let dir = config_dir(app)?;
    let path = dir.join("config.toml");
    let mut cfg = if path.exists() {
        let txt = fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&txt).with_context(|| format!("parse {}", path.display()))?
    } else {
        let cfg = Config::default();
        save_config(&path, &cfg)?;
        cfg
    };
    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        if !url.trim().is_empty() {
            cfg.backend_url = url;
        }
    }
    Ok(cfg)
}

fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg)?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
