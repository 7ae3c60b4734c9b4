use tracing::info;

pub mod conflict;
pub mod engine;
pub mod identity;
pub mod ordering;
pub mod preferences;
pub mod scope;
pub mod sequence;
pub mod storage;
pub mod transform;

pub use conflict::{ProposedRename, RenameStatus};
pub use engine::{CommitFailure, CommitResult, EngineState, LoadReport, RenameEngine};
pub use identity::{Entry, Identity};
pub use preferences::{MemoryPreferences, PreferenceStore};
pub use scope::Scope;
pub use storage::{EntryInfo, LocalStorage, Storage, StorageError};
pub use transform::{
    CaseMode, InsertConfig, NameTransform, OperationKind, RemoveConfig, ReplaceConfig,
    TransformConfig,
};

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Nothing to commit: preview is {state}")]
    NotCommittable { state: EngineState },
}

pub fn preview_names<'a, I>(config: &TransformConfig, scope: Scope, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let transform = NameTransform::new(config);
    let renamed: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(position, name)| {
            scope::apply_scope(scope, name, |part| transform.apply(position + 1, part))
        })
        .collect();
    info!("Computed {} names with {} in scope {}", renamed.len(), config.kind(), scope);
    renamed
}
