//! Language codes and the friendly names used as remote column headers.
//!
//! The remote table names its text columns after languages ("Source: English",
//! "Target: French"), so every code read from a file needs a stable name and
//! every header read back needs to map to a code again.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

lazy_static! {
    /// Base language subtag -> English name.
    static ref NAME_TABLE: BTreeMap<&'static str, &'static str> = {
        let mut m = BTreeMap::new();
        for (code, name) in [
            ("af", "Afrikaans"), ("ar", "Arabic"), ("be", "Belarusian"), ("bg", "Bulgarian"),
            ("bn", "Bangla"), ("bs", "Bosnian"), ("ca", "Catalan"), ("cs", "Czech"),
            ("cy", "Welsh"), ("da", "Danish"), ("de", "German"), ("el", "Greek"),
            ("en", "English"), ("es", "Spanish"), ("et", "Estonian"), ("eu", "Basque"),
            ("fa", "Persian"), ("fi", "Finnish"), ("fil", "Filipino"), ("fr", "French"),
            ("ga", "Irish"), ("gl", "Galician"), ("gu", "Gujarati"), ("he", "Hebrew"),
            ("hi", "Hindi"), ("hr", "Croatian"), ("hu", "Hungarian"), ("hy", "Armenian"),
            ("id", "Indonesian"), ("is", "Icelandic"), ("it", "Italian"), ("ja", "Japanese"),
            ("ka", "Georgian"), ("kk", "Kazakh"), ("km", "Khmer"), ("kn", "Kannada"),
            ("ko", "Korean"), ("lo", "Lao"), ("lt", "Lithuanian"), ("lv", "Latvian"),
            ("mk", "Macedonian"), ("ml", "Malayalam"), ("mn", "Mongolian"), ("mr", "Marathi"),
            ("ms", "Malay"), ("my", "Burmese"), ("nb", "Norwegian Bokmål"), ("ne", "Nepali"),
            ("nl", "Dutch"), ("nn", "Norwegian Nynorsk"), ("no", "Norwegian"), ("pa", "Punjabi"),
            ("pl", "Polish"), ("pt", "Portuguese"), ("ro", "Romanian"), ("ru", "Russian"),
            ("si", "Sinhala"), ("sk", "Slovak"), ("sl", "Slovenian"), ("sq", "Albanian"),
            ("sr", "Serbian"), ("sv", "Swedish"), ("sw", "Swahili"), ("ta", "Tamil"),
            ("te", "Telugu"), ("th", "Thai"), ("tl", "Tagalog"), ("tr", "Turkish"),
            ("uk", "Ukrainian"), ("ur", "Urdu"), ("uz", "Uzbek"), ("vi", "Vietnamese"),
            ("zh", "Chinese"), ("zu", "Zulu"),
        ] {
            m.insert(code, name);
        }
        m
    };
}

/// Lookup between language codes and human-readable names.
///
/// Implementations must be inverse of each other for every code they know:
/// `code_for(&name_for(code)) == Some(code)`.
pub trait LanguageNames {
    fn name_for(&self, code: &str) -> String;
    fn code_for(&self, name: &str) -> Option<String>;
}

/// Static English-name table covering the common app store locales.
///
/// Region and script subtags are appended in parentheses, so `pt-BR` becomes
/// `Portuguese (BR)`. Unknown codes are used verbatim as their own name.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLanguageNames;

impl LanguageNames for BuiltinLanguageNames {
    fn name_for(&self, code: &str) -> String {
        let Ok(id) = normalize_code(code) else {
            return code.to_string();
        };
        let base = id.language.as_str().to_string();
        let Some(name) = NAME_TABLE.get(base.as_str()) else {
            return code.to_string();
        };
        let mut qualifiers = Vec::new();
        if let Some(script) = id.script {
            qualifiers.push(script.as_str().to_string());
        }
        if let Some(region) = id.region {
            qualifiers.push(region.as_str().to_string());
        }
        if qualifiers.is_empty() {
            name.to_string()
        } else {
            format!("{} ({})", name, qualifiers.join("-"))
        }
    }

    fn code_for(&self, name: &str) -> Option<String> {
        let name = name.trim();
        let (base_name, qualifiers) = match name.split_once(" (") {
            Some((base, rest)) => (base, rest.strip_suffix(')')),
            None => (name, None),
        };
        let base = NAME_TABLE
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(base_name))
            .map(|(code, _)| code.to_string())
            .or_else(|| normalize_code(name).ok().map(|id| id.to_string()))?;
        match qualifiers {
            Some(q) => Some(format!("{}-{}", base, q)),
            None => Some(base),
        }
    }
}

/// Parses a code, accepting underscores as separators (`pt_BR`).
pub fn normalize_code(code: &str) -> Result<LanguageIdentifier, Error> {
    let canonical = code.trim().replace('_', "-");
    if canonical.is_empty() {
        return Err(Error::InvalidLanguage(code.to_string()));
    }
    LanguageIdentifier::from_str(&canonical).map_err(|_| Error::InvalidLanguage(code.to_string()))
}

/// A language code paired with its friendly name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new(code: impl Into<String>, names: &dyn LanguageNames) -> Self {
        let code = code.into();
        let name = names.name_for(&code);
        Self { code, name }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Source and target language of a file or unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: Language,
    pub target: Language,
}

impl LanguagePair {
    pub fn new(source: Language, target: Language) -> Self {
        Self { source, target }
    }

    /// Whether target and source are the same language (the development language file).
    pub fn is_identity(&self) -> bool {
        self.source.code == self.target.code
    }
}
