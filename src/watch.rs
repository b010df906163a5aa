use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::msg::Msg;

/// Keeps a notify watcher registered on a changing set of folders.
/// Folders that do not exist yet are picked up by a later `sync`.
pub struct DirWatcher {
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
}

impl DirWatcher {
    /// Forward create/modify/remove events as `Msg::FileChanged`.
    pub fn new(tx: Sender<Msg>) -> notify::Result<Self> {
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) {
                        for path in event.paths {
                            if tx.send(Msg::FileChanged(path)).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => tracing::warn!("file watcher error: {err}"),
            }
        })?;

        Ok(Self {
            watcher,
            watched: BTreeSet::new(),
        })
    }

    /// Watch every folder of `wanted` that exists now and drop the rest.
    pub fn sync(&mut self, wanted: &[PathBuf]) {
        let stale: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|dir| !wanted.contains(dir) || !dir.is_dir())
            .cloned()
            .collect();
        for dir in stale {
            // The backend may already have dropped a removed folder.
            let _ = self.watcher.unwatch(&dir);
            self.watched.remove(&dir);
            tracing::debug!(dir = %dir.display(), "stopped watching");
        }

        for dir in wanted {
            if self.watched.contains(dir) || !dir.is_dir() {
                continue;
            }
            match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    tracing::debug!(dir = %dir.display(), "watching");
                    self.watched.insert(dir.clone());
                }
                Err(err) => tracing::warn!("failed to watch {}: {err}", dir.display()),
            }
        }
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }
}
