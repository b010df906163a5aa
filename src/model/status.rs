use std::path::Path;

use crate::model::snapshot::{SnapshotStore, absolute, clean_name};

pub const LABEL_PREFIX: &str = "Current Standard Settings File: ";
pub const NO_INSTANCE_WARNING: &str = "Please open an instance!";
pub const PATH_UNAVAILABLE_WARNING: &str = "Failed to get standard settings path! (Check logs)";

const MAX_PATH_LABEL: usize = 50;
const PATH_LABEL_TAIL: usize = 47;

/// Derived state of the file an instance is using. Recomputed on every reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub exists: bool,
    pub is_managed: bool,
    pub is_global: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    NoInstance,
    PathUnavailable,
    Ready(StatusView),
}

impl PanelStatus {
    pub fn warning(&self) -> Option<&'static str> {
        match self {
            PanelStatus::NoInstance => Some(NO_INSTANCE_WARNING),
            PanelStatus::PathUnavailable => Some(PATH_UNAVAILABLE_WARNING),
            PanelStatus::Ready(_) => None,
        }
    }

    pub fn current_file_line(&self) -> Option<String> {
        match self {
            PanelStatus::Ready(view) => Some(format!("{LABEL_PREFIX}{}", view.label)),
            _ => None,
        }
    }
}

/// Classify `used` against the managed folder and the instance default.
/// `exists` is passed in so the function stays free of I/O.
pub fn compute_status(
    used: &Path,
    store: &SnapshotStore,
    default_path: &Path,
    exists: bool,
) -> StatusView {
    let is_managed = store.contains(used);
    let is_global = absolute(default_path) != absolute(used);

    let label = if !exists {
        "(Does Not Exist)".to_string()
    } else if !is_global {
        "Non-global".to_string()
    } else if is_managed {
        used.file_name()
            .map(|name| clean_name(&name.to_string_lossy()))
            .unwrap_or_default()
    } else {
        shorten_path(&used.to_string_lossy())
    };

    StatusView {
        exists,
        is_managed,
        is_global,
        label,
    }
}

/// Paths longer than 50 chars keep their last 47, behind an ellipsis.
fn shorten_path(path: &str) -> String {
    let count = path.chars().count();
    if count <= MAX_PATH_LABEL {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - PATH_LABEL_TAIL).collect();
    format!("...{tail}")
}
