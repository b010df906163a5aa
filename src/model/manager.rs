use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::instance::{Instance, InstanceError, InstanceProvider};
use crate::model::snapshot::{self, NameIssue, SnapshotError, SnapshotStore};
use crate::model::status::{PanelStatus, compute_status};
use crate::prompt::{self, Notice, Prompter};

const CREATE_TITLE: &str = "Standard Switcher: Create New File";
const CREATE_MESSAGE: &str = "Your current standard settings will be copied, enter a new name for this standard settings config:";
const SELECT_TITLE: &str = "Standard Switcher: Select file";
const SELECT_MESSAGE: &str = "Select a file:";

#[derive(Debug, Error)]
enum SwitchError {
    #[error("failed to read standard settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Store(#[from] SnapshotError),
    #[error(transparent)]
    Pointer(#[from] InstanceError),
}

impl SwitchError {
    fn notice(&self) -> Notice {
        match self {
            SwitchError::Read { .. } => Notice::ReadFailed,
            SwitchError::Store(_) => Notice::WriteFailed,
            SwitchError::Pointer(_) => Notice::PointerFailed,
        }
    }
}

/// How a create or switch request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The instance now points at this file.
    Applied(PathBuf),
    Cancelled,
    /// No active instance, or its settings path could not be resolved.
    NoInstance,
    Failed(Notice),
}

/// Owns the switcher folder and mediates which stored file an instance uses.
#[derive(Debug)]
pub struct SettingsManager {
    store: SnapshotStore,
    status: PanelStatus,
}

impl SettingsManager {
    /// Create the switcher folder if needed and start with no instance shown.
    pub fn initialize(store: SnapshotStore) -> Result<Self, SnapshotError> {
        store.ensure()?;
        Ok(Self {
            store,
            status: PanelStatus::NoInstance,
        })
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    /// Recompute the panel status from the active instance. Touches no files.
    pub fn reload(&mut self, provider: &dyn InstanceProvider) {
        let Some(instance) = provider.active_instance() else {
            self.status = PanelStatus::NoInstance;
            return;
        };

        let used = match instance.effective_settings_path() {
            Ok(path) => path,
            Err(err) => {
                tracing::error!(instance = %instance.root.display(), error = ?err, "failed to get used standard settings path");
                self.status = PanelStatus::PathUnavailable;
                return;
            }
        };

        let view = compute_status(
            &used,
            &self.store,
            &instance.default_settings_path(),
            used.exists(),
        );
        tracing::debug!(path = %used.display(), label = %view.label, "status reloaded");
        self.status = PanelStatus::Ready(view);
    }

    /// Copy the instance's current settings into a new named file and switch to it.
    pub fn create_snapshot(
        &mut self,
        provider: &dyn InstanceProvider,
        prompter: &mut dyn Prompter,
    ) -> Outcome {
        let Some(instance) = provider.active_instance() else {
            self.reload(provider);
            return Outcome::NoInstance;
        };

        let source = match instance.effective_settings_path() {
            Ok(path) => path,
            Err(err) => {
                tracing::error!(error = ?err, "failed to get used standard settings path");
                self.reload(provider);
                return Outcome::NoInstance;
            }
        };

        let existing = self.store.names();
        let Some(name) = prompt::ask_until_valid(
            prompter,
            CREATE_TITLE,
            CREATE_MESSAGE,
            |answer| snapshot::validate_name(answer, &existing),
            |issue: &NameIssue| issue.warning(),
        ) else {
            return Outcome::Cancelled;
        };

        match self.copy_and_point(&instance, &source, &name) {
            Ok(target) => {
                self.reload(provider);
                Outcome::Applied(target)
            }
            Err(err) => {
                tracing::error!(snapshot = %name, error = ?err, "failed to create standard settings file");
                let notice = err.notice();
                prompter.notify(notice);
                Outcome::Failed(notice)
            }
        }
    }

    fn copy_and_point(
        &self,
        instance: &Instance,
        source: &Path,
        name: &str,
    ) -> Result<PathBuf, SwitchError> {
        let contents = fs::read(source).map_err(|source_err| SwitchError::Read {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        let target = snapshot::absolute(&self.store.write(name, &contents)?);

        // The stored copy stays even if the pointer cannot be written.
        if let Err(err) = instance.write_pointer(&target) {
            tracing::warn!(orphan = %target.display(), "snapshot kept without pointer update");
            return Err(err.into());
        }
        Ok(target)
    }

    /// Point the instance at another stored file chosen by the user.
    pub fn switch_snapshot(
        &mut self,
        provider: &dyn InstanceProvider,
        prompter: &mut dyn Prompter,
    ) -> Outcome {
        let Some(instance) = provider.active_instance() else {
            self.reload(provider);
            return Outcome::NoInstance;
        };

        let names = self.store.names();
        if names.is_empty() {
            prompter.notify(Notice::NoFilesStored);
            return Outcome::Failed(Notice::NoFilesStored);
        }

        let current = instance
            .effective_settings_path()
            .ok()
            .and_then(|used| self.store.name_of(&used));
        let default = current
            .and_then(|name| names.iter().position(|n| *n == name))
            .unwrap_or(0);

        let Some(choice) = prompter.choose(SELECT_TITLE, SELECT_MESSAGE, &names, default) else {
            return Outcome::Cancelled;
        };

        let target = snapshot::absolute(&self.store.path_for(&choice));
        let outcome = match instance.write_pointer(&target) {
            Ok(()) => Outcome::Applied(target),
            Err(err) => {
                tracing::error!(error = ?err, "failed to set standardsettings.global");
                prompter.notify(Notice::PointerFailed);
                Outcome::Failed(Notice::PointerFailed)
            }
        };

        self.reload(provider);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::instance::ConfiguredInstances;
    use crate::prompt::scripted::{Answer, Asked, ScriptedPrompter};

    struct Fixture {
        _tmp: tempfile::TempDir,
        switcher: PathBuf,
        instance: Instance,
        provider: ConfiguredInstances,
        manager: SettingsManager,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let switcher = tmp.path().join("standardswitcher");
            let root = tmp.path().join("instance");
            let instance = Instance::new(&root);
            fs::create_dir_all(instance.config_dir()).unwrap();
            let provider = ConfiguredInstances::new(vec![root], 0);
            let manager = SettingsManager::initialize(SnapshotStore::new(&switcher)).unwrap();
            Self {
                _tmp: tmp,
                switcher,
                instance,
                provider,
                manager,
            }
        }

        fn with_default_settings(self, contents: &str) -> Self {
            fs::write(self.instance.default_settings_path(), contents).unwrap();
            self
        }

        fn store_file(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.switcher.join(format!("{name}.json"));
            fs::write(&path, contents).unwrap();
            path
        }

        fn reload(&mut self) {
            self.manager.reload(&self.provider);
        }

        fn label(&self) -> Option<String> {
            match self.manager.status() {
                PanelStatus::Ready(view) => Some(view.label.clone()),
                _ => None,
            }
        }

        fn pointer(&self) -> Option<String> {
            fs::read_to_string(self.instance.pointer_path()).ok()
        }

        fn switcher_listing(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(&self.switcher)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
    }

    #[test]
    fn initialize_creates_switcher_folder() {
        let fx = Fixture::new();
        assert!(fx.switcher.is_dir());
        assert_eq!(fx.manager.status(), &PanelStatus::NoInstance);
    }

    #[test]
    fn reload_without_instance_shows_warning() {
        let mut fx = Fixture::new();
        fx.manager.reload(&ConfiguredInstances::default());
        assert_eq!(fx.manager.status(), &PanelStatus::NoInstance);
    }

    #[test]
    fn no_pointer_means_non_global() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.reload();
        let PanelStatus::Ready(view) = fx.manager.status() else {
            panic!("expected ready status");
        };
        assert!(!view.is_global);
        assert_eq!(view.label, "Non-global");
    }

    #[test]
    fn missing_effective_file_reports_does_not_exist() {
        let mut fx = Fixture::new();
        fx.instance
            .write_pointer(&fx.switcher.join("gone.json"))
            .unwrap();
        fx.reload();
        assert_eq!(fx.label().as_deref(), Some("(Does Not Exist)"));
    }

    #[test]
    fn unreadable_pointer_reports_path_failure() {
        let mut fx = Fixture::new();
        // Reading a non-UTF-8 pointer fails.
        fs::write(fx.instance.pointer_path(), [0xff, 0xfe, 0xfd]).unwrap();
        fx.reload();
        assert_eq!(fx.manager.status(), &PanelStatus::PathUnavailable);
    }

    #[test]
    fn reload_is_idempotent_and_read_only() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.store_file("practice", "{}");
        fx.reload();
        let first = fx.manager.status().clone();
        let listing = fx.switcher_listing();
        fx.reload();
        assert_eq!(fx.manager.status(), &first);
        assert_eq!(fx.switcher_listing(), listing);
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn create_copies_bytes_and_points_at_new_file() {
        let mut fx = Fixture::new().with_default_settings("{\"a\":1}");
        fx.reload();
        let mut prompter = ScriptedPrompter::texts(&["My Config"]);

        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);

        let created = fx.switcher.join("My Config.json");
        assert_eq!(outcome, Outcome::Applied(created.clone()));
        assert_eq!(fs::read_to_string(&created).unwrap(), "{\"a\":1}");
        assert_eq!(fx.pointer(), Some(created.to_string_lossy().into_owned()));
        assert_eq!(fx.label().as_deref(), Some("My Config"));
        assert!(prompter.notices.is_empty());
    }

    #[test]
    fn create_reasks_for_each_rejection_without_touching_disk() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.store_file("Speedrun", "{}");
        let mut prompter = ScriptedPrompter::new([
            Answer::Text("  ".to_string()),
            Answer::Text("speedrun".to_string()),
            Answer::Text("bad/name".to_string()),
            Answer::Cancel,
        ]);

        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);

        assert_eq!(outcome, Outcome::Cancelled);
        let warnings: Vec<Option<String>> = prompter
            .asked
            .iter()
            .map(|a| match a {
                Asked::Text { warning } => warning.clone(),
                Asked::Choice { .. } => panic!("unexpected choice"),
            })
            .collect();
        assert_eq!(
            warnings,
            vec![
                None,
                Some("Please enter a name!".to_string()),
                Some("A file of this name already exists!".to_string()),
                Some("File name is invalid!".to_string()),
            ]
        );
        assert_eq!(fx.switcher_listing(), vec!["Speedrun.json".to_string()]);
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn create_accepts_name_after_invalid_attempt() {
        let mut fx = Fixture::new().with_default_settings("{}");
        let mut prompter = ScriptedPrompter::texts(&["bad/name", "good name.json"]);
        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);
        assert_eq!(outcome, Outcome::Applied(fx.switcher.join("good name.json")));
        assert_eq!(fx.switcher_listing(), vec!["good name.json".to_string()]);
    }

    #[test]
    fn create_without_instance_prompts_nothing() {
        let mut fx = Fixture::new();
        let mut prompter = ScriptedPrompter::texts(&["x"]);
        let outcome = fx
            .manager
            .create_snapshot(&ConfiguredInstances::default(), &mut prompter);
        assert_eq!(outcome, Outcome::NoInstance);
        assert!(prompter.asked.is_empty());
        assert_eq!(fx.manager.status(), &PanelStatus::NoInstance);
    }

    #[test]
    fn create_with_unreadable_source_creates_nothing() {
        let mut fx = Fixture::new();
        let mut prompter = ScriptedPrompter::texts(&["copy"]);
        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);
        assert_eq!(outcome, Outcome::Failed(Notice::ReadFailed));
        assert_eq!(prompter.notices, vec![Notice::ReadFailed]);
        assert!(fx.switcher_listing().is_empty());
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn create_write_failure_leaves_pointer_alone() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fs::remove_dir(&fx.switcher).unwrap();
        let mut prompter = ScriptedPrompter::texts(&["copy"]);
        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);
        assert_eq!(outcome, Outcome::Failed(Notice::WriteFailed));
        assert_eq!(prompter.notices, vec![Notice::WriteFailed]);
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn create_pointer_failure_keeps_stored_copy() {
        let mut fx = Fixture::new().with_default_settings("{\"keep\":true}");
        fs::create_dir(fx.instance.pointer_path()).unwrap();
        let mut prompter = ScriptedPrompter::texts(&["orphan"]);

        let outcome = fx.manager.create_snapshot(&fx.provider, &mut prompter);

        assert_eq!(outcome, Outcome::Failed(Notice::PointerFailed));
        assert_eq!(prompter.notices, vec![Notice::PointerFailed]);
        assert_eq!(
            fs::read_to_string(fx.switcher.join("orphan.json")).unwrap(),
            "{\"keep\":true}"
        );
    }

    #[test]
    fn switch_with_empty_folder_notifies_without_prompt() {
        let mut fx = Fixture::new().with_default_settings("{}");
        let mut prompter = ScriptedPrompter::new([Answer::Default]);
        let outcome = fx.manager.switch_snapshot(&fx.provider, &mut prompter);
        assert_eq!(outcome, Outcome::Failed(Notice::NoFilesStored));
        assert_eq!(prompter.notices, vec![Notice::NoFilesStored]);
        assert!(prompter.asked.is_empty());
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn switch_preselects_current_file() {
        let mut fx = Fixture::new();
        fx.store_file("speedrun", "{}");
        let practice = fx.store_file("practice", "{}");
        fx.instance.write_pointer(&practice).unwrap();
        fx.reload();
        let listing = fx.switcher_listing();
        let mut prompter = ScriptedPrompter::new([Answer::Default]);

        let outcome = fx.manager.switch_snapshot(&fx.provider, &mut prompter);

        assert_eq!(outcome, Outcome::Applied(practice.clone()));
        assert_eq!(
            prompter.asked,
            vec![Asked::Choice {
                options: vec!["practice".to_string(), "speedrun".to_string()],
                default: "practice".to_string(),
            }]
        );
        assert_eq!(fx.pointer(), Some(practice.to_string_lossy().into_owned()));
        assert_eq!(fx.label().as_deref(), Some("practice"));
        assert_eq!(fx.switcher_listing(), listing);
    }

    #[test]
    fn switch_defaults_to_first_when_unmanaged() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.store_file("zeta", "{}");
        fx.store_file("alpha", "{}");
        let mut prompter = ScriptedPrompter::new([Answer::Pick("zeta".to_string())]);

        let outcome = fx.manager.switch_snapshot(&fx.provider, &mut prompter);

        let Asked::Choice { default, .. } = &prompter.asked[0] else {
            panic!("expected choice");
        };
        assert_eq!(default, "alpha");
        assert_eq!(outcome, Outcome::Applied(fx.switcher.join("zeta.json")));
        assert_eq!(fx.label().as_deref(), Some("zeta"));
    }

    #[test]
    fn switch_cancel_changes_nothing() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.store_file("alpha", "{}");
        let mut prompter = ScriptedPrompter::new([Answer::Cancel]);
        let outcome = fx.manager.switch_snapshot(&fx.provider, &mut prompter);
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(fx.pointer(), None);
    }

    #[test]
    fn pointer_errors_map_to_pointer_notice() {
        let err = SwitchError::from(InstanceError::NonUtf8Target {
            target: PathBuf::from("/stored/x.json"),
        });
        assert_eq!(err.notice(), Notice::PointerFailed);
    }

    #[test]
    fn switch_pointer_failure_notifies_and_reloads() {
        let mut fx = Fixture::new().with_default_settings("{}");
        fx.store_file("alpha", "{}");
        fs::create_dir(fx.instance.pointer_path()).unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::Default]);

        let outcome = fx.manager.switch_snapshot(&fx.provider, &mut prompter);

        assert_eq!(outcome, Outcome::Failed(Notice::PointerFailed));
        assert_eq!(prompter.notices, vec![Notice::PointerFailed]);
        assert_eq!(fx.label().as_deref(), Some("Non-global"));
    }
}
