//! Support for Android `strings.xml` localization files.
//!
//! Only singular `<string>` elements directly under `<resources>` are units.
//! `<plurals>` and `<string-array>` are left untouched. Strings marked
//! `translatable="false"` are excluded from synchronization.

use std::collections::HashSet;

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
    excluded: Vec<String>,
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
                Event::Start(e) if depth == 1 && local_name(&e) == b"string" => {
                    if indent.is_none() {
                        indent = line_indent(content, span.start).map(str::to_string);
                    }
                    let (inner, _) = skip_to_end(&mut reader, span.end)?;
                    let element = StringElement::from_attributes(&e)?;
                    doc.push(element, PayloadSpan::Content(inner), &mut seen);
                }
                Event::Empty(e) if depth == 1 && local_name(&e) == b"string" => {
                    if indent.is_none() {
                        indent = line_indent(content, span.start).map(str::to_string);
                    }
                    let element = StringElement::from_attributes(&e)?;
                    let payload = PayloadSpan::Missing {
                        open: format!("{}>", open_tag_of_empty(content, &span)),
                        close: "</string>".to_string(),
                        replace: span,
                    };
                    doc.push(element, payload, &mut seen);
                }
                Event::Empty(e) if depth == 0 && local_name(&e) == b"resources" => {
                    doc.append_point = Some(AppendPoint {
                        at: span.start,
                        indent: DEFAULT_INDENT.to_string(),
                        needs_newline: false,
                        newline: detect_newline(content),
                        template: UnitTemplate::AndroidString,
                        expand_root: Some(ExpandRoot {
                            open_tag: open_tag_of_empty(content, &span),
                            element: span,
                            name: "resources".to_string(),
                        }),
                    });
                }
                Event::Start(_) => depth += 1,
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && e.local_name().as_ref() == b"resources" {
                        let indent = indent.as_deref().unwrap_or(DEFAULT_INDENT);
                        doc.append_point = Some(append_point_before(
                            content,
                            span.start,
                            indent,
                            UnitTemplate::AndroidString,
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
        Escaping::Android
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

    fn excluded(&self) -> &[String] {
        &self.excluded
    }
}

impl Document {
    fn push(&mut self, element: StringElement, payload: PayloadSpan, seen: &mut HashSet<String>) {
        let Some(identifier) = element.name else {
            self.issues
                .push(Error::no_content("<string>", "missing `name` attribute"));
            return;
        };
        if !seen.insert(identifier.clone()) {
            self.issues.push(Error::DuplicateIdentifier { identifier });
            return;
        }
        if element.translatable {
            self.nodes.push(Node { identifier, payload });
        } else {
            self.excluded.push(identifier);
        }
    }

    /// Decodes every node into a unit. Android files carry no language
    /// metadata, so the caller supplies it (usually from the `values-*` folder).
    pub fn units(&self, content: &str, languages: &LanguagePair) -> Vec<TranslationUnit> {
        self.nodes
            .iter()
            .map(|node| {
                TranslationUnit::flat_key_value(
                    node.identifier.clone(),
                    self.escaping().decode(node.raw(content)),
                    languages.clone(),
                )
            })
            .collect()
    }
}

struct StringElement {
    name: Option<String>,
    translatable: bool,
}

impl StringElement {
    fn from_attributes(e: &quick_xml::events::BytesStart<'_>) -> Result<Self, Error> {
        let name = attribute(e, b"name")?;
        let translatable = attribute(e, b"translatable")?
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        Ok(StringElement { name, translatable })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{BuiltinLanguageNames, Language};
    use crate::traits::Document as _;

    fn fr() -> LanguagePair {
        let names = BuiltinLanguageNames;
        LanguagePair::new(Language::new("en", &names), Language::new("fr", &names))
    }

    #[test]
    fn test_parse_basic_strings_xml() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="hello">Hello</string>
    <string name="bye" translatable="false">Goodbye</string>
    <string name="empty"></string>
</resources>
"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes().len(), 2);
        assert_eq!(doc.nodes()[0].identifier, "hello");
        assert_eq!(doc.nodes()[0].raw(xml), "Hello");
        assert_eq!(doc.nodes()[1].raw(xml), "");
        assert_eq!(doc.excluded(), &["bye".to_string()]);
        assert!(doc.issues().is_empty());
    }

    #[test]
    fn test_payload_span_covers_nested_markup() {
        let xml = r#"<resources><string name="rich">Tap <b>here</b> &amp; go</string></resources>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes()[0].raw(xml), "Tap <b>here</b> &amp; go");
        let units = doc.units(xml, &fr());
        assert_eq!(units[0].target_text, "Tap <b>here</b> & go");
    }

    #[test]
    fn test_parse_plurals_ignored() {
        let xml = r#"
        <resources>
            <string name="hello">Hello</string>
            <plurals name="apples">
                <item quantity="one">One apple</item>
                <item quantity="other">%d apples</item>
            </plurals>
        </resources>
        "#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes().len(), 1);
        assert_eq!(doc.nodes()[0].identifier, "hello");
    }

    #[test]
    fn test_missing_name_attribute_is_skipped() {
        let xml = r#"
        <resources>
            <string>No name attr</string>
            <string name="ok">Fine</string>
        </resources>
        "#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes().len(), 1);
        assert_eq!(doc.issues().len(), 1);
        assert!(doc.issues()[0].to_string().contains("missing `name`"));
    }

    #[test]
    fn test_duplicate_identifier_keeps_first() {
        let xml = r#"<resources>
    <string name="a">First</string>
    <string name="a">Second</string>
</resources>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.nodes().len(), 1);
        assert_eq!(doc.nodes()[0].raw(xml), "First");
        assert!(matches!(
            &doc.issues()[0],
            Error::DuplicateIdentifier { identifier } if identifier == "a"
        ));
    }

    #[test]
    fn test_self_closing_string_has_missing_payload() {
        let xml = r#"<resources><string name="a"/></resources>"#;
        let doc = Document::parse(xml).unwrap();
        match &doc.nodes()[0].payload {
            PayloadSpan::Missing {
                replace,
                open,
                close,
            } => {
                assert_eq!(&xml[replace.clone()], r#"<string name="a"/>"#);
                assert_eq!(open, r#"<string name="a">"#);
                assert_eq!(close, "</string>");
            }
            other => panic!("unexpected payload {:?}", other),
        }
        assert_eq!(doc.nodes()[0].raw(xml), "");
    }

    #[test]
    fn test_append_point_uses_detected_indent() {
        let xml = "<resources>\n\t<string name=\"a\">A</string>\n</resources>\n";
        let doc = Document::parse(xml).unwrap();
        let point = doc.append_point().unwrap();
        assert_eq!(point.indent, "\t");
        assert_eq!(point.at, xml.find("</resources>").unwrap());
    }

    #[test]
    fn test_self_closing_root_expands() {
        let xml = "<?xml version=\"1.0\"?>\n<resources/>\n";
        let doc = Document::parse(xml).unwrap();
        let point = doc.append_point().unwrap();
        let root = point.expand_root.as_ref().unwrap();
        assert_eq!(root.open_tag, "<resources");
        assert_eq!(&xml[root.element.clone()], "<resources/>");
    }

    #[test]
    fn test_units_decode_android_escapes() {
        let xml = r#"<resources><string name="q">Don\'t \"quote\"</string></resources>"#;
        let doc = Document::parse(xml).unwrap();
        let units = doc.units(xml, &fr());
        assert_eq!(units[0].target_text, "Don't \"quote\"");
        assert_eq!(units[0].source_text, None);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = "<resources><string name=\"a\">A</resources>";
        assert!(Document::parse(xml).is_err());
    }
}
