use std::fmt;

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::sequence;

/// Without `use_regex`, `find` is a wildcard pattern: `*` matches one or
/// more characters, `?` exactly one, everything else literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceConfig {
    pub find: String,
    pub replace_with: String,
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub start_number: i64,
    pub increment: i64,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            find: String::new(),
            replace_with: String::new(),
            use_regex: false,
            case_sensitive: false,
            start_number: 1,
            increment: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveConfig {
    pub from_index: usize,
    pub to_index: usize,
    pub from_is_from_end: bool,
    pub to_is_from_end: bool,
}

impl Default for RemoveConfig {
    fn default() -> Self {
        Self {
            from_index: 1,
            to_index: 1,
            from_is_from_end: false,
            to_is_from_end: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertConfig {
    pub text: String,
    pub at_position: usize,
    pub from_end: bool,
    pub overwrite: bool,
    pub start_number: i64,
    pub increment: i64,
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            at_position: 1,
            from_end: false,
            overwrite: false,
            start_number: 1,
            increment: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseMode {
    #[default]
    Title,
    Lower,
    Upper,
    CapitalizeFirst,
    TransliterateToAscii,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformConfig {
    Replace(ReplaceConfig),
    Remove(RemoveConfig),
    Insert(InsertConfig),
    ChangeCase(CaseMode),
}

impl TransformConfig {
    pub fn kind(&self) -> OperationKind {
        match self {
            TransformConfig::Replace(_) => OperationKind::Replace,
            TransformConfig::Remove(_) => OperationKind::Remove,
            TransformConfig::Insert(_) => OperationKind::Insert,
            TransformConfig::ChangeCase(_) => OperationKind::ChangeCase,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig::Replace(ReplaceConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Replace,
    Remove,
    Insert,
    ChangeCase,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Replace => "replace",
            OperationKind::Remove => "remove",
            OperationKind::Insert => "insert",
            OperationKind::ChangeCase => "case",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "replace" => Some(OperationKind::Replace),
            "remove" => Some(OperationKind::Remove),
            "insert" => Some(OperationKind::Insert),
            "case" => Some(OperationKind::ChangeCase),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Operation {
    Replace {
        pattern: Option<Regex>,
        expand: bool,
        replace_with: String,
        start_number: i64,
        increment: i64,
    },
    Remove(RemoveConfig),
    Insert(InsertConfig),
    ChangeCase(CaseMode),
}

pub struct NameTransform {
    operation: Operation,
}

impl NameTransform {
    pub fn new(config: &TransformConfig) -> Self {
        let operation = match config {
            TransformConfig::Replace(replace) => Operation::Replace {
                pattern: compile_find_pattern(replace),
                expand: replace.use_regex,
                replace_with: replace.replace_with.clone(),
                start_number: replace.start_number,
                increment: replace.increment,
            },
            TransformConfig::Remove(remove) => Operation::Remove(*remove),
            TransformConfig::Insert(insert) => Operation::Insert(insert.clone()),
            TransformConfig::ChangeCase(mode) => Operation::ChangeCase(*mode),
        };
        Self { operation }
    }

    pub fn apply(&self, sequence_index: usize, input: &str) -> String {
        match &self.operation {
            Operation::Replace {
                pattern,
                expand,
                replace_with,
                start_number,
                increment,
            } => {
                let Some(pattern) = pattern else {
                    return input.to_string();
                };
                let value = sequence::counter(sequence_index, *start_number, *increment);
                let replacement = sequence::inject(value, replace_with);
                if *expand {
                    pattern.replace_all(input, replacement.as_str()).into_owned()
                } else {
                    pattern.replace_all(input, NoExpand(&replacement)).into_owned()
                }
            }
            Operation::Remove(remove) => remove_range(remove, input),
            Operation::Insert(insert) => {
                let value = sequence::counter(sequence_index, insert.start_number, insert.increment);
                let text = sequence::inject(value, &insert.text);
                insert_text(insert, &text, input)
            }
            Operation::ChangeCase(mode) => change_case(*mode, input),
        }
    }
}

fn compile_find_pattern(config: &ReplaceConfig) -> Option<Regex> {
    if config.find.is_empty() {
        return None;
    }
    let source = if config.use_regex {
        config.find.clone()
    } else {
        wildcard_to_regex(&config.find)
    };
    match RegexBuilder::new(&source)
        .case_insensitive(!config.case_sensitive)
        .build()
    {
        Ok(pattern) => {
            debug!("Compiled find pattern: '{}' -> /{}/", config.find, source);
            Some(pattern)
        }
        Err(e) => {
            warn!("Ignoring invalid find pattern '{}': {}", config.find, e);
            None
        }
    }
}

fn wildcard_to_regex(find: &str) -> String {
    let mut pattern = String::with_capacity(find.len() * 2);
    for c in find.chars() {
        match c {
            '*' => pattern.push_str(".+"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern
}

fn remove_range(config: &RemoveConfig, input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let last = chars.len() - 1;
    let mut from = config.from_index.saturating_sub(1).min(last);
    let mut to = config.to_index.saturating_sub(1).min(last);
    if config.from_is_from_end {
        from = last - from;
    }
    if config.to_is_from_end {
        to = last - to;
    }
    let end = (to + 1).max(from);
    chars[..from].iter().chain(chars[end..].iter()).collect()
}

fn insert_text(config: &InsertConfig, text: &str, input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let length = chars.len();
    let position = config.at_position.saturating_sub(1);
    let point = if config.from_end {
        length.saturating_sub(position)
    } else {
        position.min(length)
    };
    let resume = if config.overwrite {
        (point + text.chars().count()).min(length)
    } else {
        point
    };

    let mut output: String = chars[..point].iter().collect();
    output.push_str(text);
    output.extend(chars[resume..].iter());
    output
}

fn change_case(mode: CaseMode, input: &str) -> String {
    match mode {
        CaseMode::Title => title_case(input),
        CaseMode::Lower => input.to_lowercase(),
        CaseMode::Upper => input.to_uppercase(),
        CaseMode::CapitalizeFirst => capitalize_first(input),
        CaseMode::TransliterateToAscii => transliterate(input),
    }
}

fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                output.extend(c.to_lowercase());
            } else {
                output.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            output.push(c);
            in_word = false;
        }
    }
    output
}

fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => {
            let mut output: String = first.to_uppercase().collect();
            output.push_str(&chars.as_str().to_lowercase());
            output
        }
        None => String::new(),
    }
}

fn transliterate(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii() {
            output.push(c);
            continue;
        }
        let decomposed: String = c.nfkd().filter(|d| !is_combining_mark(*d)).collect();
        if !decomposed.is_empty() && decomposed.is_ascii() {
            output.push_str(&decomposed);
        } else if let Some(replacement) = ascii_fallback(c) {
            output.push_str(replacement);
        } else {
            output.push(c);
        }
    }
    output
}

/// Letters that have no canonical decomposition into ASCII.
fn ascii_fallback(c: char) -> Option<&'static str> {
    let replacement = match c {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'đ' => "d",
        'Đ' => "D",
        'ð' => "d",
        'Ð' => "D",
        'þ' => "th",
        'Þ' => "Th",
        'ł' => "l",
        'Ł' => "L",
        'ı' => "i",
        'ħ' => "h",
        'Ħ' => "H",
        '‘' | '’' => "'",
        '“' | '”' => "\"",
        '–' | '—' => "-",
        _ => return None,
    };
    Some(replacement)
}
