use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    NameOnly,
    ExtensionOnly,
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::NameOnly => "name",
            Scope::ExtensionOnly => "extension",
            Scope::All => "all",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Scope::NameOnly),
            "extension" => Ok(Scope::ExtensionOnly),
            "all" => Ok(Scope::All),
            other => Err(format!("Unknown scope '{}'. Use: name, extension, all", other)),
        }
    }
}

/// Splits a display name into `(stem, extension)`.
///
/// The extension is whatever follows the last `.`, provided it is non-empty
/// and the dot is not part of the leading run of dots (`.bashrc` has no
/// extension). A trailing dot stays with the stem so that splitting and
/// joining is lossless.
pub fn split(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name.rfind('.') {
        Some(idx) if idx >= leading_dots && idx + 1 < name.len() => (&name[..idx], &name[idx + 1..]),
        _ => (name, ""),
    }
}

pub fn join(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    }
}

pub fn apply_scope<F>(scope: Scope, name: &str, mut transform: F) -> String
where
    F: FnMut(&str) -> String,
{
    match scope {
        Scope::NameOnly => {
            let (stem, extension) = split(name);
            join(&transform(stem), extension)
        }
        Scope::ExtensionOnly => {
            let (stem, extension) = split(name);
            join(stem, &transform(extension))
        }
        Scope::All => transform(name),
    }
}
