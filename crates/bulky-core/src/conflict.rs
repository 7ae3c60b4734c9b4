use std::collections::HashMap;

use tracing::debug;

use crate::identity::{Entry, Identity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameStatus {
    Ok,
    CollidesWith(Identity),
    SourceNotWritable,
    ParentNotWritable,
    TransformError(String),
}

impl RenameStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, RenameStatus::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedRename {
    pub entry: Entry,
    pub original_name: String,
    pub proposed_name: String,
    pub proposed_identity: Identity,
    pub status: RenameStatus,
}

impl ProposedRename {
    pub fn new(entry: Entry, proposed_name: String, proposed_identity: Identity) -> Self {
        Self {
            original_name: entry.display_name.clone(),
            entry,
            proposed_name,
            proposed_identity,
            status: RenameStatus::Ok,
        }
    }

    pub fn is_change(&self) -> bool {
        self.proposed_name != self.original_name
    }

    pub fn message(&self) -> Option<String> {
        match &self.status {
            RenameStatus::Ok => None,
            RenameStatus::CollidesWith(_) => {
                Some(format!("Name collision on '{}'.", self.entry.identity))
            }
            RenameStatus::ParentNotWritable => {
                let parent = self
                    .entry
                    .identity
                    .parent()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| self.entry.identity.to_string());
                Some(format!("'{}' is not writeable.", parent))
            }
            RenameStatus::SourceNotWritable => {
                Some(format!("'{}' is not writeable.", self.entry.identity))
            }
            RenameStatus::TransformError(reason) => {
                Some(format!("Invalid name '{}': {}", self.proposed_name, reason))
            }
        }
    }
}

pub fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name is reserved")
    } else if name.contains('/') {
        Some("name contains '/'")
    } else if name.contains('\0') {
        Some("name contains a NUL character")
    } else {
        None
    }
}

/// Annotates every proposal with its status, in working-set order.
///
/// Colliding proposals are flagged on both sides: the later one points at
/// the first proposal that claimed the destination, and that first proposal
/// points at the first later one. Status precedence is collision, invalid
/// name, unwritable parent, unwritable source.
pub fn validate(proposals: &mut [ProposedRename]) {
    let mut collisions: Vec<Option<Identity>> = vec![None; proposals.len()];
    let mut first_seen: HashMap<&Identity, usize> = HashMap::new();

    for (index, proposal) in proposals.iter().enumerate() {
        match first_seen.get(&proposal.proposed_identity) {
            Some(&winner) => {
                collisions[index] = Some(proposals[winner].entry.identity.clone());
                if collisions[winner].is_none() {
                    collisions[winner] = Some(proposal.entry.identity.clone());
                }
            }
            None => {
                first_seen.insert(&proposal.proposed_identity, index);
            }
        }
    }

    for (proposal, collision) in proposals.iter_mut().zip(collisions) {
        proposal.status = if let Some(other) = collision {
            RenameStatus::CollidesWith(other)
        } else if let Some(reason) = proposal
            .is_change()
            .then(|| invalid_name_reason(&proposal.proposed_name))
            .flatten()
        {
            RenameStatus::TransformError(reason.to_string())
        } else if !proposal.entry.parent_writable {
            RenameStatus::ParentNotWritable
        } else if !proposal.entry.writable {
            RenameStatus::SourceNotWritable
        } else {
            RenameStatus::Ok
        };

        if !proposal.status.is_ok() {
            debug!(
                "Flagged '{}' -> '{}': {:?}",
                proposal.original_name, proposal.proposed_name, proposal.status
            );
        }
    }
}
