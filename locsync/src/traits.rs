//! Traits for format-agnostic loading and rewriting in locsync.

use std::path::Path;

use crate::{
    error::Error,
    escape::Escaping,
    formats::{AppendPoint, Node, SourceText},
};

/// A parsed localization document: the located units of one file.
///
/// Documents never own a tree of the file; they only remember where every
/// unit's payload lives in the raw text, so the rewriter can splice new
/// payloads in without touching any other byte.
///
/// # Example
///
/// ```rust
/// use locsync::traits::Document;
/// use locsync::formats::AndroidStringsDocument;
///
/// let text = r#"<resources><string name="hello">Hi</string></resources>"#;
/// let doc = AndroidStringsDocument::parse(text)?;
/// assert_eq!(doc.nodes()[0].identifier, "hello");
/// assert_eq!(doc.nodes()[0].raw(text), "Hi");
/// # Ok::<(), locsync::Error>(())
/// ```
pub trait Document {
    /// Parse from the full document text.
    fn parse(content: &str) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path, returning the decoded text alongside.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<(SourceText, Self), Error>
    where
        Self: Sized,
    {
        let source = SourceText::read_from(path)?;
        let document = Self::parse(&source.text)?;
        Ok((source, document))
    }

    /// How payloads of this format are escaped on disk.
    fn escaping(&self) -> Escaping;

    /// Translatable units in document order.
    fn nodes(&self) -> &[Node];

    /// Where brand-new units go; `None` when the format cannot grow new units.
    fn append_point(&self) -> Option<&AppendPoint>;

    /// Unit-level problems found while parsing; the affected units were skipped.
    fn issues(&self) -> &[Error];

    /// Moves the parse issues out, leaving none behind.
    fn take_issues(&mut self) -> Vec<Error>;

    /// Identifiers present in the file but excluded from translation
    /// (`translatable="false"`). They are never rewritten or appended.
    fn excluded(&self) -> &[String] {
        &[]
    }

    /// Finds a node by identifier.
    fn node(&self, identifier: &str) -> Option<&Node> {
        self.nodes().iter().find(|n| n.identifier == identifier)
    }
}
