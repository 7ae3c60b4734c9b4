use anyhow::Result;
use bulky_core::{CommitResult, ProposedRename};
use inquire::Confirm;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Renders both names with the characters that differ highlighted: removed
/// characters in the original, added characters in the proposal.
pub fn highlight_names(original: &str, proposed: &str) -> Result<(String, String)> {
    let diff = TextDiff::from_chars(original, proposed);
    let mut old = String::new();
    let mut new = String::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => write!(old, "{}{}{}", RED, change.value(), RESET)?,
            ChangeTag::Insert => write!(new, "{}{}{}", GREEN, change.value(), RESET)?,
            ChangeTag::Equal => {
                old.push_str(change.value());
                new.push_str(change.value());
            }
        }
    }

    Ok((old, new))
}

pub fn render_row(proposal: &ProposedRename) -> Result<String> {
    let mut row = String::new();
    if proposal.is_change() {
        let (old, new) = highlight_names(&proposal.original_name, &proposal.proposed_name)?;
        write!(row, "  {} -> {}", old, new)?;
    } else {
        write!(row, "  {} (unchanged)", proposal.original_name)?;
    }
    if let Some(message) = proposal.message() {
        write!(row, "\n    {}! {}{}", YELLOW, message, RESET)?;
    }
    Ok(row)
}

pub fn print_preview(preview: &[ProposedRename]) -> Result<()> {
    println!("\n📁 Preview:");
    for proposal in preview {
        println!("{}", render_row(proposal)?);
    }
    Ok(())
}

pub fn confirm_commit(changes: usize) -> Result<bool> {
    let apply = Confirm::new(&format!("Apply {} renames?", changes))
        .with_default(true)
        .prompt()?;

    Ok(apply)
}

pub fn print_commit_result(result: &CommitResult, attempted: usize) {
    println!("Renamed {} of {}", result.succeeded.len(), attempted);
    if let Some(failure) = &result.failed_at {
        println!(
            "  {}Failed: '{}' -> '{}': {}{}",
            RED, failure.original_name, failure.proposed_name, failure.error, RESET
        );
        println!("  Remaining renames were not attempted.");
    }
}
