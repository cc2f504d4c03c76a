//! Core types for locsync.
//! Loaders decode files into these; the reconciler and rewriter work on them.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    escape::has_placeholders,
    language::{Language, LanguagePair},
};

/// Format-specific part of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UnitKind {
    /// Android `<string name="...">`: one element per unit, nothing beyond the text.
    FlatKeyValue,

    /// XLIFF `<trans-unit>`.
    Interchange {
        /// The source text when it is safe to show as an example (no placeholders).
        example: String,
        /// The `original` attribute of the enclosing `<file>`.
        file_path: String,
    },

    /// .NET resx `<data name="...">`.
    Resource,
}

/// One translatable string plus what is known about it in both languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Join key against the remote table. Never changes once the unit exists.
    identifier: String,

    pub languages: LanguagePair,

    /// Text in the source language; `None` until a source file match was found.
    #[serde(default)]
    pub source_text: Option<String>,

    /// Text in the target language; empty means untranslated.
    #[serde(default)]
    pub target_text: String,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,

    #[serde(flatten)]
    pub kind: UnitKind,
}

impl TranslationUnit {
    pub fn flat_key_value(
        identifier: impl Into<String>,
        target_text: impl Into<String>,
        languages: LanguagePair,
    ) -> Self {
        let target_text = target_text.into();
        let source_text = languages.is_identity().then(|| target_text.clone());
        Self {
            identifier: identifier.into(),
            languages,
            source_text,
            target_text,
            notes: Vec::new(),
            kind: UnitKind::FlatKeyValue,
        }
    }

    pub fn interchange(
        identifier: impl Into<String>,
        source_text: impl Into<String>,
        target_text: impl Into<String>,
        note: &str,
        file_path: impl Into<String>,
        languages: LanguagePair,
    ) -> Self {
        let source_text = source_text.into();
        let example = if has_placeholders(&source_text) {
            String::new()
        } else {
            source_text.clone()
        };
        Self {
            identifier: identifier.into(),
            languages,
            source_text: Some(source_text),
            target_text: target_text.into(),
            notes: split_notes(note),
            kind: UnitKind::Interchange {
                example,
                file_path: file_path.into(),
            },
        }
    }

    pub fn resource(
        identifier: impl Into<String>,
        target_text: impl Into<String>,
        comment: &str,
        languages: LanguagePair,
    ) -> Self {
        let target_text = target_text.into();
        let source_text = languages.is_identity().then(|| target_text.clone());
        Self {
            identifier: identifier.into(),
            languages,
            source_text,
            target_text,
            notes: split_notes(comment),
            kind: UnitKind::Resource,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// A unit is translated when its target text has non-whitespace content.
    pub fn is_translated(&self) -> bool {
        !self.target_text.trim().is_empty()
    }

    pub fn notes_text(&self) -> String {
        self.notes.join(", ")
    }

    /// The unit as a remote row, in the column order of its format's layout.
    pub fn record_fields(&self) -> Vec<String> {
        let source = self.source_text.clone().unwrap_or_default();
        match &self.kind {
            UnitKind::FlatKeyValue | UnitKind::Resource => {
                vec![source, self.target_text.clone(), self.identifier.clone()]
            }
            UnitKind::Interchange { example, file_path } => vec![
                source,
                self.target_text.clone(),
                example.clone(),
                self.notes_text(),
                self.identifier.clone(),
                file_path.clone(),
            ],
        }
    }

    /// Re-points a unit copied from the source language file at another target
    /// language, clearing its target text.
    pub fn retarget(&mut self, target: Language) {
        self.languages.target = target;
        self.target_text.clear();
    }
}

impl Display for TranslationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = self.source_text.as_deref().unwrap_or("");
        if self.is_translated() {
            write!(f, "{} ==> {}", source, self.target_text)?;
        } else {
            write!(f, "{} ==> NO_TRANSLATION", source)?;
        }
        if self.notes.is_empty() {
            Ok(())
        } else {
            write!(f, " ({})", self.notes_text())
        }
    }
}

fn split_notes(note: &str) -> Vec<String> {
    note.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
