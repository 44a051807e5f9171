//! Programming language labels and fence-tag matching.

use std::fmt;

use serde::{Serialize, Serializer};

/// Languages offered by the interactive front end.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "Python",
    "JavaScript",
    "C++",
    "Java",
    "C#",
    "Go",
    "Swift",
    "Kotlin",
];

/// Rendered form of [`LanguageLabel::Unknown`].
pub const UNKNOWN: &str = "Unknown";

/// Groups of names that refer to the same language in fence tags.
const ALIASES: &[&[&str]] = &[
    &["javascript", "js", "node"],
    &["typescript", "ts"],
    &["python", "py", "python3"],
    &["c++", "cpp", "cxx"],
    &["c#", "csharp", "cs"],
    &["go", "golang"],
    &["rust", "rs"],
    &["kotlin", "kt"],
    &["shell", "sh", "bash"],
];

/// Name of a programming language, or the `Unknown` sentinel.
///
/// A `Known` label always holds a trimmed, non-empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LanguageLabel {
    /// A detected or requested language.
    Known(String),
    /// The language could not be determined.
    #[default]
    Unknown,
}

impl LanguageLabel {
    /// Builds a label, mapping blank input and the literal `unknown` to
    /// [`LanguageLabel::Unknown`].
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        if name.is_empty() || name.eq_ignore_ascii_case(UNKNOWN) {
            Self::Unknown
        } else {
            Self::Known(name.to_string())
        }
    }

    /// Returns `true` for the `Unknown` sentinel.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns the label text; `"Unknown"` for the sentinel.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(name) => name,
            Self::Unknown => UNKNOWN,
        }
    }

    /// Whether a fence tag names this language.
    ///
    /// The sentinel never matches.
    pub fn matches_tag(&self, tag: &str) -> bool {
        match self {
            Self::Known(name) => names_match(name, tag),
            Self::Unknown => false,
        }
    }
}

impl From<&str> for LanguageLabel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LanguageLabel {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Option<String>> for LanguageLabel {
    fn from(name: Option<String>) -> Self {
        name.map_or(Self::Unknown, Self::new)
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Case-insensitive comparison of two language names, honouring aliases.
pub fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    ALIASES
        .iter()
        .any(|group| group.contains(&a.as_str()) && group.contains(&b.as_str()))
}
