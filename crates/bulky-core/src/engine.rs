use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::conflict::{self, ProposedRename};
use crate::identity::{Entry, Identity};
use crate::ordering;
use crate::preferences::{PreferenceStore, LAST_OPERATION_KEY, LAST_SCOPE_KEY};
use crate::scope::{self, Scope};
use crate::storage::{Storage, StorageError};
use crate::transform::{NameTransform, TransformConfig};
use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Previewing,
    Clean,
    Blocked,
    Committing,
    PartiallyFailed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Previewing => "previewing",
            EngineState::Clean => "clean",
            EngineState::Blocked => "blocked",
            EngineState::Committing => "committing",
            EngineState::PartiallyFailed => "partially failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub added: Vec<Identity>,
    pub duplicates: Vec<Identity>,
    pub rejected: Vec<(Identity, StorageError)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFailure {
    pub identity: Identity,
    pub original_name: String,
    pub proposed_name: String,
    pub error: StorageError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitResult {
    pub succeeded: Vec<Identity>,
    pub failed_at: Option<CommitFailure>,
}

impl CommitResult {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}

pub struct RenameEngine<S: Storage, P: PreferenceStore> {
    storage: S,
    preferences: P,
    entries: Vec<Entry>,
    config: TransformConfig,
    scope: Scope,
    preview: Vec<ProposedRename>,
    state: EngineState,
}

impl<S: Storage, P: PreferenceStore> RenameEngine<S, P> {
    pub fn new(storage: S, preferences: P) -> Self {
        let scope = preferences.last_scope().unwrap_or_default();
        Self {
            storage,
            preferences,
            entries: Vec::new(),
            config: TransformConfig::default(),
            scope,
            preview: Vec::new(),
            state: EngineState::Idle,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn preview(&self) -> &[ProposedRename] {
        &self.preview
    }

    pub fn can_commit(&self) -> bool {
        self.state == EngineState::Clean
    }

    pub fn add_entries<I, T>(&mut self, identities: I) -> LoadReport
    where
        I: IntoIterator<Item = T>,
        T: Into<Identity>,
    {
        let mut report = LoadReport::default();
        for identity in identities.into_iter().map(Into::into) {
            if self.entries.iter().any(|e| e.identity == identity) {
                debug!("{} is already loaded, ignoring", identity);
                report.duplicates.push(identity);
                continue;
            }
            match self.storage.query(&identity) {
                Ok(info) if info.exists => {
                    debug!("Loaded {} ({})", identity, info.display_name);
                    self.entries.push(Entry::from_info(identity.clone(), info));
                    report.added.push(identity);
                }
                Ok(_) => {
                    warn!("Cannot load {}: {}", identity, StorageError::NotFound);
                    report.rejected.push((identity, StorageError::NotFound));
                }
                Err(e) => {
                    warn!("Cannot load {}: {}", identity, e);
                    report.rejected.push((identity, e));
                }
            }
        }
        self.compute_preview();
        report
    }

    pub fn set_entries<I, T>(&mut self, identities: I) -> LoadReport
    where
        I: IntoIterator<Item = T>,
        T: Into<Identity>,
    {
        self.entries.clear();
        self.add_entries(identities)
    }

    pub fn remove_entries<I, T>(&mut self, identities: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Into<Identity>,
    {
        let doomed: HashSet<Identity> = identities.into_iter().map(Into::into).collect();
        let before = self.entries.len();
        self.entries.retain(|e| !doomed.contains(&e.identity));
        let removed = before - self.entries.len();
        self.compute_preview();
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.compute_preview();
    }

    pub fn sort_entries_by_name(&mut self) {
        self.entries
            .sort_by(|a, b| ordering::collate(&a.display_name, &b.display_name));
        self.compute_preview();
    }

    pub fn set_transform_config(&mut self, config: TransformConfig) {
        self.preferences
            .set(LAST_OPERATION_KEY, config.kind().as_str());
        self.config = config;
        self.compute_preview();
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.preferences.set(LAST_SCOPE_KEY, scope.as_str());
        self.scope = scope;
        self.compute_preview();
    }

    pub fn compute_preview(&mut self) -> EngineState {
        if self.entries.is_empty() {
            self.preview.clear();
            self.state = EngineState::Idle;
            return self.state;
        }

        self.state = EngineState::Previewing;
        let transform = NameTransform::new(&self.config);
        let scope = self.scope;
        let storage = &self.storage;

        let mut proposals: Vec<ProposedRename> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let sequence_index = position + 1;
                let proposed_name = scope::apply_scope(scope, &entry.display_name, |part| {
                    transform.apply(sequence_index, part)
                });
                let proposed_identity = if proposed_name == entry.display_name {
                    entry.identity.clone()
                } else {
                    storage.pending_identity(&entry.identity, &proposed_name)
                };
                ProposedRename::new(entry.clone(), proposed_name, proposed_identity)
            })
            .collect();

        conflict::validate(&mut proposals);

        let flagged = proposals.iter().filter(|p| !p.status.is_ok()).count();
        let changes = proposals.iter().filter(|p| p.is_change()).count();
        self.state = if flagged == 0 && changes > 0 {
            EngineState::Clean
        } else {
            EngineState::Blocked
        };
        debug!(
            "Preview: {} entries, {} changes, {} flagged -> {}",
            proposals.len(),
            changes,
            flagged,
            self.state
        );

        self.preview = proposals;
        self.state
    }

    /// Stops at the first failing rename; renames already performed are kept.
    pub fn commit(&mut self) -> Result<CommitResult, EngineError> {
        if self.state != EngineState::Clean {
            return Err(EngineError::NotCommittable { state: self.state });
        }
        self.state = EngineState::Committing;

        let pending: Vec<usize> = self
            .preview
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_change())
            .map(|(index, _)| index)
            .collect();
        let candidates: Vec<Entry> = pending.iter().map(|&i| self.entries[i].clone()).collect();
        let order = ordering::order(&self.storage, &candidates);

        info!("Committing {} renames", pending.len());
        let mut renamed = Vec::with_capacity(pending.len());
        let mut failed_at = None;

        for position in order {
            let index = pending[position];
            let current = self.entries[index].identity.clone();
            let original_name = self.entries[index].display_name.clone();
            let proposed_name = self.preview[index].proposed_name.clone();

            match self.storage.rename(&current, &proposed_name) {
                Ok(new_identity) => {
                    info!("Renamed '{}' -> '{}'", original_name, proposed_name);
                    self.apply_rename(index, &current, &new_identity, proposed_name);
                    renamed.push(index);
                }
                Err(error) => {
                    warn!("Failed to rename '{}' -> '{}': {}", original_name, proposed_name, error);
                    failed_at = Some(CommitFailure {
                        identity: current,
                        original_name,
                        proposed_name,
                        error,
                    });
                    break;
                }
            }
        }

        // Later directory renames rebase earlier entries, so read identities back here.
        let result = CommitResult {
            succeeded: renamed
                .iter()
                .map(|&index| self.entries[index].identity.clone())
                .collect(),
            failed_at,
        };

        if result.is_complete() {
            info!("Renamed {} of {}", result.succeeded.len(), pending.len());
            self.preview.clear();
            self.state = EngineState::Idle;
        } else {
            warn!(
                "Commit stopped after {} of {} renames",
                result.succeeded.len(),
                pending.len()
            );
            self.state = EngineState::PartiallyFailed;
        }
        Ok(result)
    }

    fn apply_rename(&mut self, index: usize, old: &Identity, new: &Identity, new_name: String) {
        let entry = &mut self.entries[index];
        entry.identity = new.clone();
        entry.display_name = new_name;
        match self.storage.query(new) {
            Ok(info) => entry.refresh(info),
            Err(e) => warn!("Could not refresh {} after rename: {}", new, e),
        }

        if entry.is_directory {
            for (other, descendant) in self.entries.iter_mut().enumerate() {
                if other == index {
                    continue;
                }
                if let Some(rebased) = descendant.identity.rebase(old, new) {
                    debug!("Rebased {} -> {}", descendant.identity, rebased);
                    descendant.identity = rebased;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;
    use crate::storage::EntryInfo;
    use crate::transform::{CaseMode, InsertConfig, ReplaceConfig};
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, Copy)]
    struct Node {
        is_directory: bool,
        writable: bool,
    }

    #[derive(Default)]
    struct MemoryStorage {
        nodes: BTreeMap<String, Node>,
        failures: HashMap<String, StorageError>,
        renames: Vec<(String, String)>,
    }

    impl MemoryStorage {
        fn with(paths: &[(&str, bool)]) -> Self {
            let mut storage = MemoryStorage::default();
            for (path, is_directory) in paths {
                storage.nodes.insert(
                    path.to_string(),
                    Node {
                        is_directory: *is_directory,
                        writable: true,
                    },
                );
            }
            storage
        }

        fn exists(&self, path: &str) -> bool {
            self.nodes.contains_key(path)
        }
    }

    impl Storage for MemoryStorage {
        fn query(&self, identity: &Identity) -> Result<EntryInfo, StorageError> {
            let node = self.nodes.get(identity.as_str()).ok_or(StorageError::NotFound)?;
            let parent_writable = identity
                .parent()
                .and_then(|p| self.nodes.get(p.as_str()).map(|n| n.writable))
                .unwrap_or(true);
            Ok(EntryInfo {
                exists: true,
                is_directory: node.is_directory,
                writable: node.writable,
                parent_writable,
                display_name: identity.file_name().to_string(),
            })
        }

        fn rename(&mut self, identity: &Identity, new_name: &str) -> Result<Identity, StorageError> {
            if let Some(error) = self.failures.get(identity.as_str()) {
                return Err(error.clone());
            }
            if !self.exists(identity.as_str()) {
                return Err(StorageError::NotFound);
            }
            let target = identity.with_file_name(new_name);
            if self.exists(target.as_str()) {
                return Err(StorageError::AlreadyExists);
            }

            let moved: Vec<String> = self
                .nodes
                .keys()
                .filter(|k| {
                    k.as_str() == identity.as_str() || Identity::from(k.as_str()).has_path_prefix(identity)
                })
                .cloned()
                .collect();
            for key in moved {
                if let Some(node) = self.nodes.remove(&key) {
                    let new_key = format!("{}{}", target.as_str(), &key[identity.as_str().len()..]);
                    self.nodes.insert(new_key, node);
                }
            }
            self.renames.push((identity.to_string(), target.to_string()));
            Ok(target)
        }
    }

    fn engine(paths: &[(&str, bool)]) -> RenameEngine<MemoryStorage, MemoryPreferences> {
        RenameEngine::new(MemoryStorage::with(paths), MemoryPreferences::new())
    }

    fn replace(find: &str, replace_with: &str) -> TransformConfig {
        TransformConfig::Replace(ReplaceConfig {
            find: find.to_string(),
            replace_with: replace_with.to_string(),
            ..ReplaceConfig::default()
        })
    }

    fn prefix(text: &str) -> TransformConfig {
        TransformConfig::Insert(InsertConfig {
            text: text.to_string(),
            ..InsertConfig::default()
        })
    }

    fn proposed_names(engine: &RenameEngine<MemoryStorage, MemoryPreferences>) -> Vec<String> {
        engine.preview().iter().map(|p| p.proposed_name.clone()).collect()
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = engine(&[]);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(!engine.can_commit());
        assert!(engine.preview().is_empty());
    }

    #[test]
    fn test_replace_preserves_extension_case() {
        let mut engine = engine(&[("/d", true), ("/d/report.TXT", false), ("/d/report.txt", false)]);
        engine.set_entries(["/d/report.TXT", "/d/report.txt"]);
        engine.set_scope(Scope::NameOnly);
        engine.set_transform_config(replace("report", "summary"));

        assert_eq!(proposed_names(&engine), vec!["summary.TXT", "summary.txt"]);
        assert!(engine.preview().iter().all(|p| p.status.is_ok()));
        assert_eq!(engine.state(), EngineState::Clean);
        assert!(engine.can_commit());
    }

    #[test]
    fn test_collision_blocks_commit() {
        let mut engine = engine(&[("/d/a.txt", false), ("/d/b.txt", false)]);
        engine.set_entries(["/d/a.txt", "/d/b.txt"]);
        engine.set_transform_config(replace("?", "same"));

        let statuses: Vec<_> = engine.preview().iter().map(|p| p.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                conflict::RenameStatus::CollidesWith(Identity::from("/d/b.txt")),
                conflict::RenameStatus::CollidesWith(Identity::from("/d/a.txt")),
            ]
        );
        assert_eq!(engine.state(), EngineState::Blocked);
        assert!(!engine.can_commit());
        assert!(matches!(
            engine.commit(),
            Err(EngineError::NotCommittable { state: EngineState::Blocked })
        ));
    }

    #[test]
    fn test_no_changes_is_blocked() {
        let mut engine = engine(&[("/d/a.txt", false)]);
        engine.set_entries(["/d/a.txt"]);
        engine.set_transform_config(replace("zzz", "y"));
        assert_eq!(engine.state(), EngineState::Blocked);
    }

    #[test]
    fn test_unwritable_entry_blocks_whole_commit() {
        let mut storage = MemoryStorage::with(&[("/d/a.txt", false), ("/d/b.txt", false)]);
        storage.nodes.get_mut("/d/a.txt").unwrap().writable = false;
        let mut engine = RenameEngine::new(storage, MemoryPreferences::new());
        engine.set_entries(["/d/a.txt", "/d/b.txt"]);
        engine.set_transform_config(prefix("x-"));

        assert_eq!(engine.preview()[0].status, conflict::RenameStatus::SourceNotWritable);
        assert!(engine.preview()[1].status.is_ok());
        assert!(!engine.can_commit());
    }

    #[test]
    fn test_load_report() {
        let mut engine = engine(&[("/d/a.txt", false)]);
        let report = engine.add_entries(["/d/a.txt", "/d/a.txt", "/d/missing.txt"]);

        assert_eq!(report.added, vec![Identity::from("/d/a.txt")]);
        assert_eq!(report.duplicates, vec![Identity::from("/d/a.txt")]);
        assert_eq!(
            report.rejected,
            vec![(Identity::from("/d/missing.txt"), StorageError::NotFound)]
        );
        assert_eq!(engine.entries().len(), 1);
    }

    #[test]
    fn test_remove_and_clear_recompute_preview() {
        let mut engine = engine(&[("/d/a.txt", false), ("/d/b.txt", false)]);
        engine.set_entries(["/d/a.txt", "/d/b.txt"]);
        engine.set_transform_config(replace("?", "same"));
        assert_eq!(engine.state(), EngineState::Blocked);

        assert_eq!(engine.remove_entries(["/d/b.txt", "/d/nothing"]), 1);
        assert_eq!(engine.state(), EngineState::Clean);
        assert_eq!(proposed_names(&engine), vec!["same.txt"]);

        engine.clear();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.preview().is_empty());
    }

    #[test]
    fn test_sequence_numbers_follow_visible_order() {
        let mut engine = engine(&[("/d/b.jpg", false), ("/d/a.jpg", false), ("/d/C.jpg", false)]);
        engine.set_entries(["/d/b.jpg", "/d/a.jpg", "/d/C.jpg"]);
        engine.set_transform_config(prefix("%0n-"));
        assert_eq!(proposed_names(&engine), vec!["01-b.jpg", "02-a.jpg", "03-C.jpg"]);

        engine.sort_entries_by_name();
        assert_eq!(proposed_names(&engine), vec!["01-a.jpg", "02-b.jpg", "03-C.jpg"]);
    }

    #[test]
    fn test_scope_all_and_extension() {
        let mut engine = engine(&[("/d/photo.jpeg", false)]);
        engine.set_entries(["/d/photo.jpeg"]);
        engine.set_transform_config(TransformConfig::ChangeCase(CaseMode::Upper));

        engine.set_scope(Scope::ExtensionOnly);
        assert_eq!(proposed_names(&engine), vec!["photo.JPEG"]);

        engine.set_scope(Scope::All);
        assert_eq!(proposed_names(&engine), vec!["PHOTO.JPEG"]);
    }

    #[test]
    fn test_preferences_record_choices() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(LAST_SCOPE_KEY, "all");
        let mut engine = RenameEngine::new(MemoryStorage::default(), prefs);
        assert_eq!(engine.scope(), Scope::All);

        engine.set_transform_config(TransformConfig::ChangeCase(CaseMode::Lower));
        engine.set_scope(Scope::ExtensionOnly);
        assert_eq!(engine.preferences().last_scope(), Some(Scope::ExtensionOnly));
        assert_eq!(
            engine.preferences().last_operation(),
            Some(crate::transform::OperationKind::ChangeCase)
        );
    }

    #[test]
    fn test_commit_success_updates_working_set() {
        let mut engine = engine(&[("/d/a.txt", false), ("/d/b.txt", false)]);
        engine.set_entries(["/d/a.txt", "/d/b.txt"]);
        engine.set_transform_config(prefix("new-"));

        let result = engine.commit().unwrap();
        assert!(result.is_complete());
        assert_eq!(
            result.succeeded,
            vec![Identity::from("/d/new-a.txt"), Identity::from("/d/new-b.txt")]
        );
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.entries()[0].identity, Identity::from("/d/new-a.txt"));
        assert_eq!(engine.entries()[0].display_name, "new-a.txt");
        assert!(engine.storage().exists("/d/new-b.txt"));
    }

    #[test]
    fn test_commit_stops_at_first_failure() {
        let mut engine = engine(&[
            ("/d/a.txt", false),
            ("/d/b.txt", false),
            ("/d/c.txt", false),
            ("/d/new-b.txt", false),
        ]);
        engine.set_entries(["/d/a.txt", "/d/b.txt", "/d/c.txt"]);
        engine.set_transform_config(prefix("new-"));
        assert!(engine.can_commit());

        let result = engine.commit().unwrap();

        assert_eq!(result.succeeded, vec![Identity::from("/d/new-a.txt")]);
        let failure = result.failed_at.unwrap();
        assert_eq!(failure.identity, Identity::from("/d/b.txt"));
        assert_eq!(failure.proposed_name, "new-b.txt");
        assert_eq!(failure.error, StorageError::AlreadyExists);

        assert_eq!(engine.state(), EngineState::PartiallyFailed);
        assert_eq!(engine.entries()[0].identity, Identity::from("/d/new-a.txt"));
        assert_eq!(engine.entries()[1].identity, Identity::from("/d/b.txt"));
        assert_eq!(engine.entries()[2].identity, Identity::from("/d/c.txt"));
        assert!(engine.storage().exists("/d/c.txt"));
        assert!(!engine.can_commit());
    }

    #[test]
    fn test_commit_reports_storage_errors() {
        let mut storage = MemoryStorage::with(&[("/d/a.txt", false)]);
        storage.failures.insert("/d/a.txt".to_string(), StorageError::NameTooLong);
        let mut engine = RenameEngine::new(storage, MemoryPreferences::new());
        engine.set_entries(["/d/a.txt"]);
        engine.set_transform_config(prefix("x"));

        let result = engine.commit().unwrap();
        assert_eq!(result.failed_at.unwrap().error, StorageError::NameTooLong);
        assert!(result.succeeded.is_empty());
        assert_eq!(engine.state(), EngineState::PartiallyFailed);
    }

    #[test]
    fn test_commit_nested_renames_children_first() {
        let mut engine = engine(&[
            ("/r", true),
            ("/r/dir", true),
            ("/r/dir/sub", true),
            ("/r/dir/sub/file.txt", false),
        ]);
        engine.set_entries(["/r/dir", "/r/dir/sub", "/r/dir/sub/file.txt"]);
        engine.set_transform_config(prefix("x-"));

        let result = engine.commit().unwrap();
        assert!(result.is_complete());
        assert_eq!(
            result.succeeded,
            vec![
                Identity::from("/r/x-dir/x-sub/x-file.txt"),
                Identity::from("/r/x-dir/x-sub"),
                Identity::from("/r/x-dir"),
            ]
        );
        assert!(result.succeeded.iter().all(|id| engine.storage().exists(id.as_str())));
        assert_eq!(
            engine.storage().renames,
            vec![
                ("/r/dir/sub/file.txt".to_string(), "/r/dir/sub/x-file.txt".to_string()),
                ("/r/dir/sub".to_string(), "/r/dir/x-sub".to_string()),
                ("/r/dir".to_string(), "/r/x-dir".to_string()),
            ]
        );

        let identities: Vec<&str> = engine.entries().iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(
            identities,
            vec!["/r/x-dir", "/r/x-dir/x-sub", "/r/x-dir/x-sub/x-file.txt"]
        );
        assert!(engine.storage().exists("/r/x-dir/x-sub/x-file.txt"));
    }

    #[test]
    fn test_rename_refreshes_writability() {
        let mut engine = engine(&[("/d/a.txt", false)]);
        engine.set_entries(["/d/a.txt"]);
        engine.set_transform_config(prefix("b-"));
        engine.commit().unwrap();

        let entry = &engine.entries()[0];
        assert!(entry.writable);
        assert_eq!(entry.display_name, "b-a.txt");
    }

    #[test]
    fn test_invalid_regex_keeps_names() {
        let mut engine = engine(&[("/d/a.txt", false)]);
        engine.set_entries(["/d/a.txt"]);
        engine.set_transform_config(TransformConfig::Replace(ReplaceConfig {
            find: "(".to_string(),
            replace_with: "x".to_string(),
            use_regex: true,
            ..ReplaceConfig::default()
        }));
        assert_eq!(proposed_names(&engine), vec!["a.txt"]);
        assert!(engine.preview()[0].status.is_ok());
        assert_eq!(engine.state(), EngineState::Blocked);
    }

    #[test]
    fn test_preview_recomputed_after_partial_failure() {
        let mut engine = engine(&[("/d/a.txt", false), ("/d/b.txt", false), ("/d/new-b.txt", false)]);
        engine.set_entries(["/d/a.txt", "/d/b.txt"]);
        engine.set_transform_config(prefix("new-"));
        engine.commit().unwrap();
        assert_eq!(engine.state(), EngineState::PartiallyFailed);

        engine.set_transform_config(prefix("old-"));
        assert_eq!(proposed_names(&engine), vec!["old-new-a.txt", "old-b.txt"]);
        assert_eq!(engine.state(), EngineState::Clean);
    }
}
