//! Commit ordering for renames that may touch nested paths.
//!
//! Renaming a directory invalidates every identity below it, so the order is:
//! non-directories first, then descendants before their ancestors, grouped by
//! storage scheme, with a collated comparison of path components breaking the
//! remaining ties.

use std::cmp::Ordering;

use crate::identity::Entry;
use crate::storage::Storage;

pub fn order<S: Storage + ?Sized>(storage: &S, entries: &[Entry]) -> Vec<usize> {
    let schemes: Vec<String> = entries.iter().map(|e| storage.scheme_of(&e.identity)).collect();
    let mut indices: Vec<usize> = (0..entries.len()).collect();
    indices.sort_by(|&a, &b| compare(storage, &entries[a], &schemes[a], &entries[b], &schemes[b]));
    indices
}

fn compare<S: Storage + ?Sized>(
    storage: &S,
    a: &Entry,
    a_scheme: &str,
    b: &Entry,
    b_scheme: &str,
) -> Ordering {
    a.is_directory
        .cmp(&b.is_directory)
        .then_with(|| {
            if storage.has_path_prefix(&a.identity, &b.identity) {
                Ordering::Less
            } else if storage.has_path_prefix(&b.identity, &a.identity) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a_scheme.cmp(b_scheme))
        .then_with(|| compare_components(a.identity.segments(), b.identity.segments()))
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Component-wise collation where a path sorts after everything below it.
fn compare_components<'a>(
    mut a: impl Iterator<Item = &'a str>,
    mut b: impl Iterator<Item = &'a str>,
) -> Ordering {
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) => match collate(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
