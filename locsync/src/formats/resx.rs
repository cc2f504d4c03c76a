//! Support for .NET `*.resx` resource files.
//!
//! Units are the `<data name="...">` elements holding a `<value>` and an
//! optional `<comment>`. Entries with a `type` or `mimetype` attribute are
//! embedded objects (images, serialized types) and are not text.

use std::{collections::HashSet, ops::Range};

use quick_xml::{Reader, events::Event};

use crate::{
    error::Error,
    escape::Escaping,
    formats::{
        AppendPoint, DEFAULT_INDENT, ExpandRoot, Node, PayloadSpan, UnitTemplate,
        append_point_before, attribute, detect_newline, line_indent, local_name, next_event,
        open_tag_of_empty, skip_to_end,
    },
    language::LanguagePair,
    traits::Document as _,
    types::TranslationUnit,
};

#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    /// Parallel to `nodes`.
    comments: Vec<Option<Range<usize>>>,
    append_point: Option<AppendPoint>,
    issues: Vec<Error>,
}

impl crate::traits::Document for Document {
    fn parse(content: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(content);
        let mut doc = Document::default();
        let mut seen = HashSet::new();
        let mut indent: Option<String> = None;
        let mut depth = 0usize;

        loop {
            let (event, span) = next_event(&mut reader)?;
            match event {
                Event::Start(e) if depth == 1 && local_name(&e) == b"data" => {
                    if indent.is_none() {
                        indent = line_indent(content, span.start).map(str::to_string);
                    }
                    let name = attribute(&e, b"name")?;
                    let binary =
                        attribute(&e, b"type")?.is_some() || attribute(&e, b"mimetype")?.is_some();
                    let children = DataChildren::read(&mut reader, content)?;
                    if !binary {
                        doc.push(name, children, &mut seen);
                    }
                }
                Event::Empty(e) if depth == 1 && local_name(&e) == b"data" => {
                    let name = attribute(&e, b"name")?.unwrap_or_default();
                    doc.issues.push(Error::no_content(name, "missing <value>"));
                }
                Event::Empty(e) if depth == 0 && local_name(&e) == b"root" => {
                    doc.append_point = Some(AppendPoint {
                        at: span.start,
                        indent: "  ".to_string(),
                        needs_newline: false,
                        newline: detect_newline(content),
                        template: UnitTemplate::ResxData,
                        expand_root: Some(ExpandRoot {
                            open_tag: open_tag_of_empty(content, &span),
                            element: span,
                            name: "root".to_string(),
                        }),
                    });
                }
                Event::Start(_) => depth += 1,
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && e.local_name().as_ref() == b"root" {
                        let indent = indent.as_deref().unwrap_or(DEFAULT_INDENT);
                        doc.append_point = Some(append_point_before(
                            content,
                            span.start,
                            indent,
                            UnitTemplate::ResxData,
                        ));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(doc)
    }

    fn escaping(&self) -> Escaping {
        Escaping::Resx
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn append_point(&self) -> Option<&AppendPoint> {
        self.append_point.as_ref()
    }

    fn issues(&self) -> &[Error] {
        &self.issues
    }

    fn take_issues(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.issues)
    }
}

impl Document {
    fn push(&mut self, name: Option<String>, children: DataChildren, seen: &mut HashSet<String>) {
        let Some(identifier) = name else {
            self.issues
                .push(Error::no_content("<data>", "missing `name` attribute"));
            return;
        };
        let Some(payload) = children.value else {
            self.issues
                .push(Error::no_content(identifier, "missing <value>"));
            return;
        };
        if !seen.insert(identifier.clone()) {
            self.issues.push(Error::DuplicateIdentifier { identifier });
            return;
        }
        self.nodes.push(Node {
            identifier,
            payload,
        });
        self.comments.push(children.comment);
    }

    /// Decodes every node into a unit. Languages come from the file name.
    pub fn units(&self, content: &str, languages: &LanguagePair) -> Vec<TranslationUnit> {
        let escaping = self.escaping();
        self.nodes
            .iter()
            .zip(&self.comments)
            .map(|(node, comment)| {
                let comment = comment
                    .as_ref()
                    .map(|range| escaping.decode(&content[range.clone()]))
                    .unwrap_or_default();
                TranslationUnit::resource(
                    node.identifier.clone(),
                    escaping.decode(node.raw(content)),
                    &comment,
                    languages.clone(),
                )
            })
            .collect()
    }
}

#[derive(Default)]
struct DataChildren {
    value: Option<PayloadSpan>,
    comment: Option<Range<usize>>,
}

impl DataChildren {
    fn read(reader: &mut Reader<&[u8]>, content: &str) -> Result<Self, Error> {
        let mut children = DataChildren::default();
        loop {
            let (event, span) = next_event(reader)?;
            match event {
                Event::Start(e) => {
                    let (inner, _) = skip_to_end(reader, span.end)?;
                    match local_name(&e).as_slice() {
                        b"value" => children.value = Some(PayloadSpan::Content(inner)),
                        b"comment" => children.comment = Some(inner),
                        _ => {}
                    }
                }
                Event::Empty(e) if local_name(&e) == b"value" => {
                    children.value = Some(PayloadSpan::Missing {
                        open: format!("{}>", open_tag_of_empty(content, &span)),
                        close: "</value>".to_string(),
                        replace: span,
                    });
                }
                Event::End(_) => return Ok(children),
                Event::Eof => {
                    return Err(Error::MalformedDocument(
                        "unexpected end of document inside <data>".to_string(),
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
    use crate::language::{BuiltinLanguageNames, Language};
    use crate::traits::Document as _;
    use indoc::indoc;

    const RESX: &str = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <root>
          <resheader name="resmimetype">
            <value>text/microsoft-resx</value>
          </resheader>
          <data name="Greeting" xml:space="preserve">
            <value>Hallo &amp; willkommen</value>
            <comment>Shown on start</comment>
          </data>
          <data name="Logo" type="System.Drawing.Bitmap, System.Drawing" mimetype="application/x-microsoft.net.object.bytearray.base64">
            <value>iVBORw0KGgo=</value>
          </data>
          <data name="Empty" xml:space="preserve">
            <value />
          </data>
        </root>
    "#};

    fn de() -> LanguagePair {
        let names = BuiltinLanguageNames;
        LanguagePair::new(Language::new("en", &names), Language::new("de", &names))
    }

    #[test]
    fn test_parse_text_entries_only() {
        let doc = Document::parse(RESX).unwrap();
        let ids: Vec<_> = doc.nodes().iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["Greeting", "Empty"]);
        assert!(doc.issues().is_empty());
    }

    #[test]
    fn test_units_carry_comment() {
        let doc = Document::parse(RESX).unwrap();
        let units = doc.units(RESX, &de());
        assert_eq!(units[0].target_text, "Hallo & willkommen");
        assert_eq!(units[0].notes, vec!["Shown on start"]);
        assert!(!units[1].is_translated());
    }

    #[test]
    fn test_empty_value_is_replaced_whole() {
        let doc = Document::parse(RESX).unwrap();
        match &doc.node("Empty").unwrap().payload {
            PayloadSpan::Missing { replace, open, .. } => {
                assert_eq!(&RESX[replace.clone()], "<value />");
                assert_eq!(open, "<value>");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_data_without_value_is_skipped() {
        let xml = r#"<root><data name="NoValue"><comment>c</comment></data></root>"#;
        let doc = Document::parse(xml).unwrap();
        assert!(doc.nodes().is_empty());
        assert_eq!(doc.issues().len(), 1);
    }

    #[test]
    fn test_append_point_before_root_end() {
        let doc = Document::parse(RESX).unwrap();
        let point = doc.append_point().unwrap();
        assert_eq!(point.indent, "  ");
        assert_eq!(point.at, RESX.find("</root>").unwrap());
        assert_eq!(point.template, UnitTemplate::ResxData);
    }
}
