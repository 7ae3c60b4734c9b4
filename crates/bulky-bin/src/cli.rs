use bulky_core::{CaseMode, InsertConfig, RemoveConfig, ReplaceConfig, Scope, TransformConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bulky")]
#[command(version)]
#[command(about = "Rename many files and directories at once")]
#[command(long_about = "A CLI tool that previews a batch rename (replace, remove, insert or change case), flags collisions and permission problems, and applies the renames children-first so nested paths stay valid.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Replace text matching a wildcard or regular expression")]
    Replace {
        #[arg(help = "Text to find ('*' matches one or more characters, '?' exactly one)")]
        find: String,

        #[arg(help = "Replacement text; '%n', '%0n', '%00n'... insert a sequence number")]
        replace_with: String,

        #[arg(long, help = "Treat the find text as a regular expression")]
        regex: bool,

        #[arg(long, help = "Match case when finding text")]
        case_sensitive: bool,

        #[arg(long, default_value_t = 1, allow_hyphen_values = true, help = "First sequence number")]
        start: i64,

        #[arg(long, default_value_t = 1, allow_hyphen_values = true, help = "Sequence number step")]
        increment: i64,

        #[command(flatten)]
        target: TargetArgs,
    },

    #[command(about = "Remove a range of characters")]
    Remove {
        #[arg(long, default_value_t = 1, help = "First character to remove (1-based)")]
        from: usize,

        #[arg(long, default_value_t = 1, help = "Last character to remove (1-based, inclusive)")]
        to: usize,

        #[arg(long, help = "Count --from from the end of the name")]
        from_end: bool,

        #[arg(long, help = "Count --to from the end of the name")]
        to_end: bool,

        #[command(flatten)]
        target: TargetArgs,
    },

    #[command(about = "Insert or overwrite text at a position")]
    Insert {
        #[arg(help = "Text to insert; '%n', '%0n', '%00n'... insert a sequence number")]
        text: String,

        #[arg(long, default_value_t = 1, help = "Insertion position (1-based)")]
        at: usize,

        #[arg(long, help = "Count the position from the end of the name")]
        from_end: bool,

        #[arg(long, help = "Overwrite existing characters instead of shifting them")]
        overwrite: bool,

        #[arg(long, default_value_t = 1, allow_hyphen_values = true, help = "First sequence number")]
        start: i64,

        #[arg(long, default_value_t = 1, allow_hyphen_values = true, help = "Sequence number step")]
        increment: i64,

        #[command(flatten)]
        target: TargetArgs,
    },

    #[command(about = "Change letter case or transliterate to ASCII")]
    Case {
        #[arg(value_enum, help = "Case to apply")]
        mode: CaseArg,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Arguments shared by every rename operation.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[arg(required = true, num_args = 1.., help = "Files and directories to rename")]
    pub paths: Vec<PathBuf>,

    #[arg(long, value_enum, env = "BULKY_SCOPE", help = "Part of each name to transform")]
    pub scope: Option<ScopeArg>,

    #[arg(long, help = "Show the preview without renaming anything")]
    pub dry_run: bool,

    #[arg(short, long, help = "Interactive mode - confirm before renaming")]
    pub interactive: bool,

    #[arg(long, help = "Number entries in name order instead of argument order")]
    pub sort: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeArg {
    Name,
    Extension,
    All,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Name => Scope::NameOnly,
            ScopeArg::Extension => Scope::ExtensionOnly,
            ScopeArg::All => Scope::All,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseArg {
    Title,
    Lower,
    Upper,
    CapitalizeFirst,
    Ascii,
}

impl From<CaseArg> for CaseMode {
    fn from(value: CaseArg) -> Self {
        match value {
            CaseArg::Title => CaseMode::Title,
            CaseArg::Lower => CaseMode::Lower,
            CaseArg::Upper => CaseMode::Upper,
            CaseArg::CapitalizeFirst => CaseMode::CapitalizeFirst,
            CaseArg::Ascii => CaseMode::TransliterateToAscii,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Commands {
    /// Splits the command into the transform it describes and its targets.
    pub fn into_parts(self) -> (TransformConfig, TargetArgs) {
        match self {
            Commands::Replace {
                find,
                replace_with,
                regex,
                case_sensitive,
                start,
                increment,
                target,
            } => (
                TransformConfig::Replace(ReplaceConfig {
                    find,
                    replace_with,
                    use_regex: regex,
                    case_sensitive,
                    start_number: start,
                    increment,
                }),
                target,
            ),
            Commands::Remove {
                from,
                to,
                from_end,
                to_end,
                target,
            } => (
                TransformConfig::Remove(RemoveConfig {
                    from_index: from,
                    to_index: to,
                    from_is_from_end: from_end,
                    to_is_from_end: to_end,
                }),
                target,
            ),
            Commands::Insert {
                text,
                at,
                from_end,
                overwrite,
                start,
                increment,
                target,
            } => (
                TransformConfig::Insert(InsertConfig {
                    text,
                    at_position: at,
                    from_end,
                    overwrite,
                    start_number: start,
                    increment,
                }),
                target,
            ),
            Commands::Case { mode, target } => (TransformConfig::ChangeCase(mode.into()), target),
        }
    }
}
