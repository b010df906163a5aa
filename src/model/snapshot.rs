use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;

pub const SNAPSHOT_EXTENSION: &str = "json";

/// Characters that may not appear in a snapshot name.
pub const ILLEGAL_NAME_CHARS: [char; 15] = [
    '/', '\n', '\r', '\t', '\0', '\u{c}', '`', '?', '*', '\\', '<', '>', '|', '"', ':',
];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to create switcher folder {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write standard settings file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a candidate snapshot name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameIssue {
    Empty,
    Duplicate,
    Invalid,
}

impl NameIssue {
    /// Warning shown above the name prompt when asking again.
    pub fn warning(self) -> &'static str {
        match self {
            NameIssue::Empty => "Please enter a name!",
            NameIssue::Duplicate => "A file of this name already exists!",
            NameIssue::Invalid => "File name is invalid!",
        }
    }
}

/// Trim a raw answer and check it against the existing snapshot names.
pub fn validate_name(candidate: &str, existing: &[String]) -> Result<String, NameIssue> {
    let name = clean_name(candidate);
    if name.is_empty() {
        return Err(NameIssue::Empty);
    }
    let lower = name.to_lowercase();
    if existing.iter().any(|n| n.to_lowercase() == lower) {
        return Err(NameIssue::Duplicate);
    }
    if name.contains(&ILLEGAL_NAME_CHARS[..]) {
        return Err(NameIssue::Invalid);
    }
    Ok(name)
}

/// Strip a trailing `.json` (if any) and surrounding whitespace.
pub fn clean_name(raw: &str) -> String {
    raw.strip_suffix(&snapshot_suffix())
        .unwrap_or(raw)
        .trim()
        .to_string()
}

fn snapshot_suffix() -> String {
    format!(".{SNAPSHOT_EXTENSION}")
}

/// The managed folder of stored settings files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure(&self) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    /// Stored snapshot names, ordered by file name. A missing folder lists as empty.
    pub fn names(&self) -> Vec<String> {
        let suffix = snapshot_suffix();
        let mut files: Vec<String> = WalkBuilder::new(&self.dir)
            .max_depth(Some(1))
            .standard_filters(false)
            .build()
            .flatten()
            .filter_map(|entry| {
                if entry.path() == self.dir.as_path() {
                    return None;
                }
                let name = entry.file_name().to_str()?.to_string();
                name.ends_with(&suffix).then_some(name)
            })
            .collect();

        files.sort();
        files.iter().map(|f| clean_name(f)).collect()
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
    }

    /// Name of the snapshot `path` refers to, if it lives in this folder.
    pub fn name_of(&self, path: &Path) -> Option<String> {
        if !self.contains(path) {
            return None;
        }
        path.file_name()
            .map(|name| clean_name(&name.to_string_lossy()))
    }

    pub fn contains(&self, path: &Path) -> bool {
        let parent = path.parent().map(absolute);
        parent.as_deref() == Some(absolute(&self.dir).as_path())
    }

    /// Store `contents` verbatim under `name`, returning the new file's path.
    pub fn write(&self, name: &str, contents: &[u8]) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(name);
        fs::write(&path, contents).map_err(|source| SnapshotError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(snapshot = name, path = %path.display(), "snapshot stored");
        Ok(path)
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
