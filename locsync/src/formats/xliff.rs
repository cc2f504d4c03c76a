//! Support for XLIFF 1.2 files as produced by `xcodebuild -exportLocalizations`.
//!
//! Each `<trans-unit>` carries its own source text, so an XLIFF file never
//! needs the development language file to be complete. The set of units is
//! owned by the exporting project: documents have no append point.

use std::{collections::HashSet, ops::Range};

use quick_xml::{Reader, events::Event};

use crate::{
    error::Error,
    escape::Escaping,
    formats::{
        AppendPoint, Node, PayloadSpan, attribute, detect_newline, line_indent, local_name,
        next_event, open_tag_of_empty, skip_to_end,
    },
    language::{Language, LanguageNames, LanguagePair},
    traits::Document as _,
    types::TranslationUnit,
};

#[derive(Debug, Default)]
pub struct Document {
    source_language: Option<String>,
    target_language: Option<String>,
    nodes: Vec<Node>,
    /// Parallel to `nodes`.
    parts: Vec<UnitParts>,
    issues: Vec<Error>,
}

#[derive(Debug)]
struct UnitParts {
    source: Range<usize>,
    note: Option<Range<usize>>,
    file_path: String,
}

impl crate::traits::Document for Document {
    fn parse(content: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(content);
        let mut doc = Document::default();
        let mut seen = HashSet::new();
        let mut file_path = String::new();
        let newline = detect_newline(content);

        loop {
            let (event, span) = next_event(&mut reader)?;
            match event {
                Event::Start(e) if local_name(&e) == b"file" => {
                    if doc.source_language.is_none() {
                        doc.source_language = attribute(&e, b"source-language")?;
                    }
                    if doc.target_language.is_none() {
                        doc.target_language = attribute(&e, b"target-language")?;
                    }
                    file_path = attribute(&e, b"original")?.unwrap_or_default();
                }
                Event::Start(e) if local_name(&e) == b"trans-unit" => {
                    let identifier = attribute(&e, b"id")?;
                    let spans = TransUnitSpans::read(&mut reader, content)?;
                    doc.push(identifier, spans, &file_path, newline, &mut seen);
                }
                Event::Empty(e) if local_name(&e) == b"trans-unit" => {
                    let identifier = attribute(&e, b"id")?.unwrap_or_default();
                    doc.issues
                        .push(Error::no_content(identifier, "empty <trans-unit>"));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(doc)
    }

    fn escaping(&self) -> Escaping {
        Escaping::Xliff
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn append_point(&self) -> Option<&AppendPoint> {
        None
    }

    fn issues(&self) -> &[Error] {
        &self.issues
    }

    fn take_issues(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.issues)
    }
}

impl Document {
    fn push(
        &mut self,
        identifier: Option<String>,
        spans: TransUnitSpans,
        file_path: &str,
        newline: &str,
        seen: &mut HashSet<String>,
    ) {
        let Some(identifier) = identifier else {
            self.issues
                .push(Error::no_content("<trans-unit>", "missing `id` attribute"));
            return;
        };
        let Some(source) = spans.source else {
            self.issues
                .push(Error::no_content(identifier, "missing <source>"));
            return;
        };
        if !seen.insert(identifier.clone()) {
            self.issues.push(Error::DuplicateIdentifier { identifier });
            return;
        }
        let payload = match spans.target {
            Some(target) => target,
            None => PayloadSpan::Missing {
                replace: source.end_tag_end..source.end_tag_end,
                open: match &source.indent {
                    Some(indent) => format!("{}{}<target>", newline, indent),
                    None => "<target>".to_string(),
                },
                close: "</target>".to_string(),
            },
        };
        self.nodes.push(Node {
            identifier,
            payload,
        });
        self.parts.push(UnitParts {
            source: source.content,
            note: spans.note,
            file_path: file_path.to_string(),
        });
    }

    /// The `source-language` attribute of the first `<file>`.
    pub fn source_language(&self) -> Option<&str> {
        self.source_language.as_deref()
    }

    /// The `target-language` attribute of the first `<file>`.
    pub fn target_language(&self) -> Option<&str> {
        self.target_language.as_deref()
    }

    /// Languages declared by the document. A development language export has
    /// no `target-language`; its target is its source.
    pub fn languages(&self, names: &dyn LanguageNames) -> Result<LanguagePair, Error> {
        let source = self.source_language.as_deref().ok_or_else(|| {
            Error::MalformedDocument("<file> is missing `source-language`".to_string())
        })?;
        let target = self.target_language.as_deref().unwrap_or(source);
        Ok(LanguagePair::new(
            Language::new(source, names),
            Language::new(target, names),
        ))
    }

    pub fn units(&self, content: &str, languages: &LanguagePair) -> Vec<TranslationUnit> {
        let escaping = self.escaping();
        self.nodes
            .iter()
            .zip(&self.parts)
            .map(|(node, parts)| {
                let note = parts
                    .note
                    .as_ref()
                    .map(|range| escaping.decode(&content[range.clone()]))
                    .unwrap_or_default();
                TranslationUnit::interchange(
                    node.identifier.clone(),
                    escaping.decode(&content[parts.source.clone()]),
                    escaping.decode(node.raw(content)),
                    &note,
                    parts.file_path.clone(),
                    languages.clone(),
                )
            })
            .collect()
    }
}

struct SourceSpan {
    content: Range<usize>,
    end_tag_end: usize,
    indent: Option<String>,
}

#[derive(Default)]
struct TransUnitSpans {
    source: Option<SourceSpan>,
    target: Option<PayloadSpan>,
    note: Option<Range<usize>>,
}

impl TransUnitSpans {
    /// Reads the children of a `<trans-unit>` whose start tag was just consumed.
    fn read(reader: &mut Reader<&[u8]>, content: &str) -> Result<Self, Error> {
        let mut spans = TransUnitSpans::default();
        loop {
            let (event, span) = next_event(reader)?;
            match event {
                Event::Start(e) => {
                    let (inner, end) = skip_to_end(reader, span.end)?;
                    match local_name(&e).as_slice() {
                        b"source" => {
                            spans.source = Some(SourceSpan {
                                content: inner,
                                end_tag_end: end.end,
                                indent: line_indent(content, span.start).map(str::to_string),
                            })
                        }
                        b"target" => spans.target = Some(PayloadSpan::Content(inner)),
                        b"note" if spans.note.is_none() => spans.note = Some(inner),
                        _ => {}
                    }
                }
                Event::Empty(e) => match local_name(&e).as_slice() {
                    b"source" => {
                        spans.source = Some(SourceSpan {
                            content: span.end..span.end,
                            end_tag_end: span.end,
                            indent: line_indent(content, span.start).map(str::to_string),
                        })
                    }
                    b"target" => {
                        spans.target = Some(PayloadSpan::Missing {
                            open: format!("{}>", open_tag_of_empty(content, &span)),
                            close: "</target>".to_string(),
                            replace: span,
                        })
                    }
                    _ => {}
                },
                Event::End(_) => return Ok(spans),
                Event::Eof => {
                    return Err(Error::MalformedDocument(
                        "unexpected end of document inside <trans-unit>".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::BuiltinLanguageNames;
    use crate::traits::Document as _;
    use crate::types::UnitKind;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xliff xmlns="urn:oasis:names:tc:xliff:document:1.2" version="1.2">
  <file original="App/en.lproj/Localizable.strings" source-language="en" target-language="fr" datatype="plaintext">
    <body>
      <trans-unit id="hello" xml:space="preserve">
        <source>Hello</source>
        <target>Bonjour</target>
        <note>Greeting on the home screen</note>
      </trans-unit>
      <trans-unit id="count" xml:space="preserve">
        <source>%d items &amp; more</source>
        <note>No comment provided by engineer.</note>
      </trans-unit>
      <trans-unit id="empty" xml:space="preserve">
        <source>Empty</source>
        <target/>
      </trans-unit>
    </body>
  </file>
</xliff>
"#;

    #[test]
    fn test_parse_languages() {
        let doc = Document::parse(EXPORT).unwrap();
        assert_eq!(doc.source_language(), Some("en"));
        assert_eq!(doc.target_language(), Some("fr"));
        let languages = doc.languages(&BuiltinLanguageNames).unwrap();
        assert_eq!(languages.target.name, "French");
        assert!(!languages.is_identity());
    }

    #[test]
    fn test_parse_units() {
        let doc = Document::parse(EXPORT).unwrap();
        let languages = doc.languages(&BuiltinLanguageNames).unwrap();
        let units = doc.units(EXPORT, &languages);
        assert_eq!(units.len(), 3);

        assert_eq!(units[0].identifier(), "hello");
        assert_eq!(units[0].source_text.as_deref(), Some("Hello"));
        assert_eq!(units[0].target_text, "Bonjour");
        assert_eq!(units[0].notes, vec!["Greeting on the home screen"]);
        assert!(matches!(
            &units[0].kind,
            UnitKind::Interchange { example, file_path }
                if example == "Hello" && file_path == "App/en.lproj/Localizable.strings"
        ));

        assert_eq!(units[1].source_text.as_deref(), Some("%d items & more"));
        assert!(!units[1].is_translated());
        assert!(matches!(&units[1].kind, UnitKind::Interchange { example, .. } if example.is_empty()));
    }

    #[test]
    fn test_missing_target_inserts_after_source() {
        let doc = Document::parse(EXPORT).unwrap();
        let node = doc.node("count").unwrap();
        match &node.payload {
            PayloadSpan::Missing {
                replace,
                open,
                close,
            } => {
                assert!(replace.is_empty());
                assert!(EXPORT[..replace.start].ends_with("</source>"));
                assert_eq!(open, "\n        <target>");
                assert_eq!(close, "</target>");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_missing_target_follows_crlf_line_endings() {
        let content = EXPORT.replace('\n', "\r\n");
        let doc = Document::parse(&content).unwrap();
        match &doc.node("count").unwrap().payload {
            PayloadSpan::Missing { open, .. } => assert_eq!(open, "\r\n        <target>"),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_empty_target_element_is_replaced() {
        let doc = Document::parse(EXPORT).unwrap();
        match &doc.node("empty").unwrap().payload {
            PayloadSpan::Missing { replace, open, .. } => {
                assert_eq!(&EXPORT[replace.clone()], "<target/>");
                assert_eq!(open, "<target>");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_unit_without_source_is_skipped() {
        let xml = r#"<xliff><file original="a" source-language="en"><body>
<trans-unit id="broken"><target>x</target></trans-unit>
<trans-unit id="ok"><source>Ok</source></trans-unit>
</body></file></xliff>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes().len(), 1);
        assert_eq!(doc.issues().len(), 1);
        assert!(doc.issues()[0].is_recoverable());
    }

    #[test]
    fn test_development_language_export_targets_itself() {
        let xml = r#"<xliff><file original="a" source-language="en"><body>
<trans-unit id="ok"><source>Ok</source></trans-unit>
</body></file></xliff>"#;
        let doc = Document::parse(xml).unwrap();
        let languages = doc.languages(&BuiltinLanguageNames).unwrap();
        assert!(languages.is_identity());
    }

    #[test]
    fn test_missing_source_language_is_malformed() {
        let xml = r#"<xliff><file original="a"><body/></file></xliff>"#;
        let doc = Document::parse(xml).unwrap();
        assert!(matches!(
            doc.languages(&BuiltinLanguageNames),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_no_append_point() {
        let doc = Document::parse(EXPORT).unwrap();
        assert!(doc.append_point().is_none());
    }
}
