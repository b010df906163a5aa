use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "standardsettings.json";
pub const POINTER_FILE: &str = "standardsettings.global";

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("failed to read pointer file {path}")]
    ReadPointer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pointer target {target} is not valid UTF-8")]
    NonUtf8Target { target: PathBuf },
    #[error("failed to write pointer file {path}")]
    WritePointer {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Read-only view of a game instance on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub root: PathBuf,
}

impl Instance {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/config/mcsr`, where standard settings live.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config").join("mcsr")
    }

    pub fn default_settings_path(&self) -> PathBuf {
        self.config_dir().join(DEFAULT_SETTINGS_FILE)
    }

    pub fn pointer_path(&self) -> PathBuf {
        self.config_dir().join(POINTER_FILE)
    }

    /// The settings file currently in effect: the pointer target if a
    /// non-empty pointer exists, the default file otherwise.
    pub fn effective_settings_path(&self) -> Result<PathBuf, InstanceError> {
        let pointer = self.pointer_path();
        if !pointer.is_file() {
            return Ok(self.default_settings_path());
        }

        let raw = fs::read_to_string(&pointer).map_err(|source| InstanceError::ReadPointer {
            path: pointer.clone(),
            source,
        })?;
        let target = raw.trim();
        if target.is_empty() {
            return Ok(self.default_settings_path());
        }

        Ok(PathBuf::from(target))
    }

    /// Point this instance at `target`, overwriting any previous pointer.
    pub fn write_pointer(&self, target: &Path) -> Result<(), InstanceError> {
        let text = target.to_str().ok_or_else(|| InstanceError::NonUtf8Target {
            target: target.to_path_buf(),
        })?;
        let pointer = self.pointer_path();
        let write = || -> io::Result<()> {
            if let Some(parent) = pointer.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&pointer, text)
        };

        write().map_err(|source| InstanceError::WritePointer {
            path: pointer.clone(),
            source,
        })?;
        tracing::info!(
            instance = %self.root.display(),
            target = %target.display(),
            "pointer updated"
        );
        Ok(())
    }
}

/// Supplies the currently active instance, if any.
pub trait InstanceProvider {
    fn active_instance(&self) -> Option<Instance>;
}

/// Instances listed in the configuration, one of which is active.
#[derive(Debug, Default)]
pub struct ConfiguredInstances {
    roots: Vec<PathBuf>,
    active: usize,
}

impl ConfiguredInstances {
    pub fn new(roots: Vec<PathBuf>, active: usize) -> Self {
        let active = active.min(roots.len().saturating_sub(1));
        Self { roots, active }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Move the active cursor by `delta`, wrapping. Returns true if it changed.
    pub fn select_relative(&mut self, delta: isize) -> bool {
        if self.roots.len() < 2 {
            return false;
        }
        let len = self.roots.len() as isize;
        let next = (self.active as isize + delta).rem_euclid(len) as usize;
        let changed = next != self.active;
        self.active = next;
        changed
    }

    pub fn active_root(&self) -> Option<&Path> {
        self.roots.get(self.active).map(PathBuf::as_path)
    }
}

impl InstanceProvider for ConfiguredInstances {
    fn active_instance(&self) -> Option<Instance> {
        let root = self.active_root()?;
        root.is_dir().then(|| Instance::new(root))
    }
}
