//! All error types for the locsync crate.
//!
//! Unit-level problems (`NoContentFound`, `NoSourceMatch`) are collected and
//! reported by the loader; everything else is returned from the fallible
//! operation that hit it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("no content found for `{identifier}`: {reason}")]
    NoContentFound { identifier: String, reason: String },

    #[error("`{identifier}` not found in source language file")]
    NoSourceMatch { identifier: String },

    #[error("duplicate identifier `{identifier}`, keeping the first occurrence")]
    DuplicateIdentifier { identifier: String },

    #[error("remote store unavailable for {group}: {source}")]
    RemoteUnavailable {
        group: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("no file found for development language `{language}`")]
    NoDevelopmentLanguageFile { language: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid language code `{0}`")]
    InvalidLanguage(String),

    #[error("build tool failed: {0}")]
    BuildTool(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new remote-store error, wrapping the adapter's own failure.
    pub fn remote_unavailable(
        group: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::RemoteUnavailable {
            group: group.into(),
            source: source.into(),
        }
    }

    pub fn no_content(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NoContentFound {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error only affects one unit and the surrounding load may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NoContentFound { .. }
                | Error::NoSourceMatch { .. }
                | Error::DuplicateIdentifier { .. }
        )
    }

    /// Whether this error must stop the whole run rather than a single file.
    pub fn is_global(&self) -> bool {
        matches!(self, Error::NoDevelopmentLanguageFile { .. })
    }
}
