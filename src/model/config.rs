use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "standard-switcher";
const FOLDER_ENV: &str = "STANDARD_SWITCHER_FOLDER";
const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub instances: InstancesConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    pub switcher_folder: String,
}

#[derive(Debug, Deserialize)]
pub struct InstancesConfig {
    pub paths: Vec<String>,
    pub active: usize,
}

#[derive(Debug, Deserialize)]
pub struct UiConfig {
    pub tick_ms: u64,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config → environment.
    pub fn load() -> Result<Self> {
        let mut config = match directories::ProjectDirs::from("", "", APP_NAME) {
            Some(proj_dirs) => Self::layered(&proj_dirs.config_dir().join("config.toml"))?,
            None => Self::defaults()?,
        };

        if let Some(folder) = std::env::var_os(FOLDER_ENV) {
            config.general.switcher_folder = folder.to_string_lossy().into_owned();
        }

        config.resolve_paths()?;
        Ok(config)
    }

    pub fn defaults() -> Result<Self> {
        Ok(toml::from_str(DEFAULTS)?)
    }

    /// Bundled defaults with the user file at `path`, if present, merged on top.
    fn layered(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::defaults();
        }
        let user_str =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::merged(&user_str).with_context(|| format!("parsing {}", path.display()))
    }

    fn merged(user_str: &str) -> Result<Self> {
        let mut base: toml::Table = toml::from_str(DEFAULTS)?;
        let user: toml::Table = toml::from_str(user_str)?;
        merge_tables(&mut base, user);
        Ok(toml::Value::Table(base).try_into()?)
    }

    /// Expand `~` and fill in the data-dir fallback for the switcher folder.
    fn resolve_paths(&mut self) -> Result<()> {
        if self.general.switcher_folder.trim().is_empty() {
            let data_dir = directories::ProjectDirs::from("", "", APP_NAME)
                .map(|d| d.data_dir().to_path_buf())
                .ok_or_else(|| anyhow!("cannot determine data directory"))?;
            self.general.switcher_folder = data_dir
                .join("standardswitcher")
                .to_string_lossy()
                .into_owned();
        }

        self.general.switcher_folder = expand_tilde(&self.general.switcher_folder)?;
        for path in &mut self.instances.paths {
            *path = expand_tilde(path)?;
        }
        Ok(())
    }

    /// The managed directory, always absolute.
    pub fn switcher_folder(&self) -> PathBuf {
        absolute(Path::new(&self.general.switcher_folder))
    }

    pub fn instance_paths(&self) -> Vec<PathBuf> {
        self.instances
            .paths
            .iter()
            .map(|p| absolute(Path::new(p)))
            .collect()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms.max(10))
    }
}

/// Overlay `user` onto `base`, descending into tables key by key.
fn merge_tables(base: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(overlay)) => {
                merge_tables(existing, overlay);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn expand_tilde(raw: &str) -> Result<String> {
    if !raw.starts_with('~') {
        return Ok(raw.to_string());
    }
    let home = directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(raw.replacen('~', &home.to_string_lossy(), 1))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
