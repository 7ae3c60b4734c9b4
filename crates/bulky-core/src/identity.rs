use std::fmt;
use std::path::Path;

use crate::storage::EntryInfo;

const LOCAL_SCHEME: &str = "file";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        match self.0.find("://") {
            Some(idx) => &self.0[..idx],
            None => LOCAL_SCHEME,
        }
    }

    pub fn is_local(&self) -> bool {
        self.scheme().eq_ignore_ascii_case(LOCAL_SCHEME)
    }

    pub fn path_part(&self) -> &str {
        match self.0.find("://") {
            Some(idx) => &self.0[idx + 3..],
            None => &self.0,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path_part().split('/').filter(|s| !s.is_empty())
    }

    pub fn file_name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    pub fn parent(&self) -> Option<Identity> {
        let trimmed = self.0.trim_end_matches('/');
        let idx = trimmed.rfind('/')?;
        let parent = &trimmed[..idx];
        if parent.is_empty() {
            Some(Identity("/".to_string()))
        } else if parent.ends_with("://") || parent.ends_with(":/") {
            Some(Identity(trimmed[..=idx].to_string()))
        } else {
            Some(Identity(parent.to_string()))
        }
    }

    /// True when `self` lies strictly below `ancestor`. Equal identities are
    /// not prefixes of each other.
    pub fn has_path_prefix(&self, ancestor: &Identity) -> bool {
        let base = ancestor.0.trim_end_matches('/');
        if base.is_empty() || base.len() >= self.0.len() {
            return false;
        }
        if !self.0.starts_with(base) {
            return false;
        }
        let rest = &self.0[base.len()..];
        rest.starts_with('/') && !rest.trim_matches('/').is_empty()
    }

    pub fn with_file_name(&self, name: &str) -> Identity {
        let trimmed = self.0.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) => Identity(format!("{}{}", &trimmed[..=idx], name)),
            None => Identity(name.to_string()),
        }
    }

    pub fn rebase(&self, from: &Identity, to: &Identity) -> Option<Identity> {
        if !self.has_path_prefix(from) {
            return None;
        }
        let rest = &self.0[from.0.trim_end_matches('/').len()..];
        Some(Identity(format!("{}{}", to.0.trim_end_matches('/'), rest)))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity(value.to_string())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Identity(value)
    }
}

impl From<&Path> for Identity {
    fn from(value: &Path) -> Self {
        Identity(value.to_string_lossy().into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub identity: Identity,
    pub display_name: String,
    pub is_directory: bool,
    pub writable: bool,
    pub parent_writable: bool,
}

impl Entry {
    pub fn from_info(identity: Identity, info: EntryInfo) -> Self {
        Self {
            identity,
            display_name: info.display_name,
            is_directory: info.is_directory,
            writable: info.writable,
            parent_writable: info.parent_writable,
        }
    }

    pub fn refresh(&mut self, info: EntryInfo) {
        self.display_name = info.display_name;
        self.is_directory = info.is_directory;
        self.writable = info.writable;
        self.parent_writable = info.parent_writable;
    }
}
