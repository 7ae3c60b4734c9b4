use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::identity::Identity;

const MAX_NAME_BYTES: usize = 255;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("No such file or directory")]
    NotFound,
    #[error("Permission denied")]
    Denied,
    #[error("File name too long")]
    NameTooLong,
    #[error("A file with that name already exists")]
    AlreadyExists,
    #[error("{0}")]
    Unknown(String),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            io::ErrorKind::PermissionDenied => StorageError::Denied,
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists,
            _ => StorageError::Unknown(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub exists: bool,
    pub is_directory: bool,
    pub writable: bool,
    pub parent_writable: bool,
    pub display_name: String,
}

pub trait Storage {
    fn query(&self, identity: &Identity) -> Result<EntryInfo, StorageError>;

    fn rename(&mut self, identity: &Identity, new_name: &str) -> Result<Identity, StorageError>;

    fn has_path_prefix(&self, identity: &Identity, ancestor: &Identity) -> bool {
        identity.has_path_prefix(ancestor)
    }

    fn scheme_of(&self, identity: &Identity) -> String {
        identity.scheme().to_ascii_lowercase()
    }

    fn pending_identity(&self, identity: &Identity, new_name: &str) -> Identity {
        identity.with_file_name(new_name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn local_path(identity: &Identity) -> Result<PathBuf, StorageError> {
        if !identity.is_local() {
            return Err(StorageError::Unknown(format!(
                "Unsupported location scheme '{}'",
                identity.scheme()
            )));
        }
        Ok(PathBuf::from(identity.path_part()))
    }

    fn identity_for(original: &Identity, path: &Path) -> Identity {
        if original.as_str().contains("://") {
            Identity::new(format!("file://{}", path.display()))
        } else {
            Identity::from(path)
        }
    }
}

impl Storage for LocalStorage {
    fn query(&self, identity: &Identity) -> Result<EntryInfo, StorageError> {
        let path = Self::local_path(identity)?;
        let metadata = fs::symlink_metadata(&path)?;
        let is_directory = path.is_dir();
        let writable = can_write(&path, &metadata);
        let parent_writable = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::metadata(parent)
                .map(|m| can_write(parent, &m))
                .unwrap_or(false),
            Some(_) => fs::metadata(".")
                .map(|m| can_write(Path::new("."), &m))
                .unwrap_or(false),
            None => false,
        };
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(
            "Queried {:?}: dir={} writable={} parent_writable={}",
            path, is_directory, writable, parent_writable
        );

        Ok(EntryInfo {
            exists: true,
            is_directory,
            writable,
            parent_writable,
            display_name,
        })
    }

    fn rename(&mut self, identity: &Identity, new_name: &str) -> Result<Identity, StorageError> {
        let path = Self::local_path(identity)?;
        if new_name.is_empty() || new_name.contains('/') || new_name.contains('\0') {
            return Err(StorageError::Unknown(format!("Invalid file name '{}'", new_name)));
        }
        if new_name.len() > MAX_NAME_BYTES {
            return Err(StorageError::NameTooLong);
        }

        let new_path = match path.parent() {
            Some(parent) => parent.join(new_name),
            None => return Err(StorageError::Denied),
        };
        if new_path == path {
            return Ok(identity.clone());
        }
        if fs::symlink_metadata(&new_path).is_ok() && !same_file(&path, &new_path) {
            return Err(StorageError::AlreadyExists);
        }

        fs::rename(&path, &new_path)?;
        debug!("Renamed {:?} -> {:?}", path, new_path);
        Ok(Self::identity_for(identity, &new_path))
    }

    fn has_path_prefix(&self, identity: &Identity, ancestor: &Identity) -> bool {
        match (Self::local_path(identity), Self::local_path(ancestor)) {
            (Ok(path), Ok(base)) => path != base && path.starts_with(&base),
            _ => identity.has_path_prefix(ancestor),
        }
    }
}

fn can_write(path: &Path, metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly() && has_write_access(path)
}

#[cfg(unix)]
fn has_write_access(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    match CString::new(path.as_os_str().as_bytes()) {
        Ok(c_path) => unsafe { libc::access(c_path.as_ptr(), libc::W_OK) == 0 },
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn has_write_access(_path: &Path) -> bool {
    true
}

/// Case-only renames on case-insensitive filesystems resolve the destination
/// to the source itself.
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
