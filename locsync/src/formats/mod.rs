//! All supported localization file formats for locsync.
//!
//! Every format parses its document into a list of [`Node`]s: byte spans into
//! the original text, so that rewriting can splice new payloads in and leave
//! every other byte alone.

pub mod android_strings;
pub mod resx;
pub mod xliff;

use std::{
    fmt::{Display, Formatter},
    io::Read,
    ops::Range,
    path::Path,
    str::FromStr,
};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

pub use android_strings::Document as AndroidStringsDocument;
pub use resx::Document as ResxDocument;
pub use xliff::Document as XliffDocument;

use crate::{error::Error, escape::escape_attribute, language::normalize_code};

/// Represents all supported localization file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Android `res/values*/strings.xml`.
    AndroidStrings,
    /// XLIFF 1.2 as exported by `xcodebuild -exportLocalizations`.
    Xliff,
    /// .NET `*.resx`.
    Resx,
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// The string doubles as the platform name of the remote table:
/// - `AndroidStrings` → `"android"`
/// - `Xliff` → `"ios"`
/// - `Resx` → `"dotnet"`
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.platform())
    }
}

/// Accepts platform or format names, case-insensitively.
///
/// ```rust
/// use locsync::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("android").unwrap(), FormatType::AndroidStrings);
/// assert_eq!(FormatType::from_str("XLIFF").unwrap(), FormatType::Xliff);
/// assert_eq!(FormatType::from_str("resx").unwrap(), FormatType::Resx);
/// assert!(FormatType::from_str("strings").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "android" | "androidstrings" | "xml" => Ok(FormatType::AndroidStrings),
            "ios" | "xliff" | "xlf" => Ok(FormatType::Xliff),
            "dotnet" | "resx" => Ok(FormatType::Resx),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Whether every unit of this format carries its own source text, so the
    /// development language file is not needed to fill it in.
    pub fn carries_source_text(&self) -> bool {
        matches!(self, FormatType::Xliff)
    }

    /// Platform name used to group remote tables.
    pub fn platform(&self) -> &'static str {
        match self {
            FormatType::AndroidStrings => "android",
            FormatType::Xliff => "ios",
            FormatType::Resx => "dotnet",
        }
    }
}

/// Infers a [`FormatType`] from a file path's extension.
///
/// ```rust
/// use locsync::formats::{FormatType, infer_format_from_extension};
/// assert_eq!(infer_format_from_extension("res/values/strings.xml"), Some(FormatType::AndroidStrings));
/// assert_eq!(infer_format_from_extension("fr.xliff"), Some(FormatType::Xliff));
/// assert_eq!(infer_format_from_extension("Strings.de.resx"), Some(FormatType::Resx));
/// assert_eq!(infer_format_from_extension("foo.txt"), None);
/// ```
pub fn infer_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    match path.as_ref().extension().and_then(|s| s.to_str()) {
        Some("xml") => Some(FormatType::AndroidStrings),
        Some("xliff") | Some("xlf") => Some(FormatType::Xliff),
        Some("resx") => Some(FormatType::Resx),
        _ => None,
    }
}

/// Infers the target language of a file from its location.
///
/// - Android: the `values-*` directory holding the file (`values-fr` → `fr`,
///   `values-pt-rBR` → `pt-BR`, `values-b+zh+Hans` → `zh-Hans`); a bare
///   `values` directory yields `None`, meaning the development language.
/// - resx: the culture suffix of the file name (`Strings.fr.resx` → `fr`).
/// - XLIFF declares its languages inside the document, so this returns `None`.
///
/// ```rust
/// use locsync::formats::{FormatType, infer_language_from_path};
/// assert_eq!(infer_language_from_path("res/values-es/strings.xml", FormatType::AndroidStrings), Some("es".to_string()));
/// assert_eq!(infer_language_from_path("res/values-zh-rCN/strings.xml", FormatType::AndroidStrings), Some("zh-CN".to_string()));
/// assert_eq!(infer_language_from_path("res/values/strings.xml", FormatType::AndroidStrings), None);
/// assert_eq!(infer_language_from_path("Resources/Strings.de-AT.resx", FormatType::Resx), Some("de-AT".to_string()));
/// assert_eq!(infer_language_from_path("Resources/Strings.resx", FormatType::Resx), None);
/// assert_eq!(infer_language_from_path("Resources/App.Strings.resx", FormatType::Resx), None);
/// ```
pub fn infer_language_from_path<P: AsRef<Path>>(path: P, format: FormatType) -> Option<String> {
    let path = path.as_ref();
    match format {
        FormatType::AndroidStrings => {
            let dir = path.parent()?.file_name()?.to_str()?;
            parse_android_values_lang(dir)
        }
        FormatType::Resx => split_resx_culture(path.file_stem()?.to_str()?).1,
        FormatType::Xliff => None,
    }
}

/// Splits a resx file stem into its resource set name and culture:
/// `Strings.fr` → (`Strings`, `Some("fr")`), `App.Strings` → (`App.Strings`, `None`).
///
/// Only a last dotted segment whose language subtag has two or three letters
/// counts as a culture; unic-langid alone would accept any 5 to 8 letter word.
pub fn split_resx_culture(stem: &str) -> (&str, Option<String>) {
    let culture = stem.rsplit_once('.').and_then(|(base, suffix)| {
        let id = normalize_code(suffix).ok()?;
        (2..=3).contains(&id.language.as_str().len()).then(|| (base, id.to_string()))
    });
    match culture {
        Some((base, code)) => (base, Some(code)),
        None => (stem, None),
    }
}

// values-zh-rCN → zh-CN; values-es → es; values-b+zh+Hans+CN → zh-Hans-CN
fn parse_android_values_lang(values_component: &str) -> Option<String> {
    let rest = values_component.strip_prefix("values-")?;
    if rest.is_empty() {
        return None;
    }
    if let Some(b_rest) = rest.strip_prefix("b+") {
        let lang = b_rest.split('+').collect::<Vec<_>>().join("-");
        return normalize_code(&lang).ok().map(|id| id.to_string());
    }

    let mut lang: Option<&str> = None;
    let mut region: Option<&str> = None;
    for token in rest.split('-') {
        if token.is_empty() {
            continue;
        }
        match token.strip_prefix('r') {
            Some(r) if r.len() == 2 && r.chars().all(|c| c.is_ascii_uppercase()) => {
                region = Some(r)
            }
            _ if lang.is_none() && normalize_code(token).is_ok() => lang = Some(token),
            _ => {}
        }
    }
    let tag = match (lang, region) {
        (Some(l), Some(r)) => format!("{}-{}", l, r),
        (Some(l), None) => l.to_string(),
        // Fall back to the last hyphen-delimited token.
        (None, _) => rest.rsplit('-').next()?.to_string(),
    };
    Some(tag)
}

/// Where the payload of one unit lives in the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSpan {
    /// Raw bytes between the payload element's start and end tag.
    Content(Range<usize>),
    /// The payload element is empty (`<target/>`) or absent. Writing a payload
    /// replaces `replace` (an empty range for an insertion) with `open`, the
    /// payload and `close`.
    Missing {
        replace: Range<usize>,
        open: String,
        close: String,
    },
}

/// A located translation unit in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub identifier: String,
    pub payload: PayloadSpan,
}

impl Node {
    /// The raw payload as it is on disk; empty when the payload element is missing.
    pub fn raw<'a>(&self, content: &'a str) -> &'a str {
        match &self.payload {
            PayloadSpan::Content(range) => &content[range.clone()],
            PayloadSpan::Missing { .. } => "",
        }
    }
}

/// Where new nodes are added: just before the root element's end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPoint {
    /// Byte offset new lines are inserted at.
    pub at: usize,
    /// Indentation of existing child nodes.
    pub indent: String,
    /// Whether a line break must precede the inserted lines.
    pub needs_newline: bool,
    /// Line ending used by the document.
    pub newline: &'static str,
    pub template: UnitTemplate,
    /// Set when the root is self-closing (`<resources/>`) and must be expanded
    /// into a start and end tag around the new content.
    pub expand_root: Option<ExpandRoot>,
}

/// Markup used for brand-new units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitTemplate {
    /// `<string name="id">payload</string>`
    AndroidString,
    /// `<data name="id" xml:space="preserve"><value>payload</value></data>`
    ResxData,
}

impl AppendPoint {
    /// Renders one brand-new unit as complete lines.
    pub fn render_unit(&self, identifier: &str, payload: &str) -> String {
        let indent = &self.indent;
        let nl = self.newline;
        let name = escape_attribute(identifier);
        match self.template {
            UnitTemplate::AndroidString => {
                format!("{indent}<string name=\"{name}\">{payload}</string>{nl}")
            }
            UnitTemplate::ResxData => format!(
                "{indent}<data name=\"{name}\" xml:space=\"preserve\">{nl}\
                 {indent}{indent}<value>{payload}</value>{nl}\
                 {indent}</data>{nl}"
            ),
        }
    }

    /// Renders the marker comment line. Runs of `-` collapse to one, since
    /// `--` may not appear inside an XML comment.
    pub fn render_marker(&self, marker: &str) -> String {
        let mut text = String::with_capacity(marker.len());
        for c in marker.chars() {
            if c == '-' && text.ends_with('-') {
                continue;
            }
            text.push(c);
        }
        format!("{}<!-- {} -->{}", self.indent, text, self.newline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandRoot {
    pub element: Range<usize>,
    pub open_tag: String,
    pub name: String,
}

/// Raw document text plus what is needed to write it back the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    /// The encoding named by the file's byte order mark, if it had one.
    pub bom: Option<&'static Encoding>,
}

impl SourceText {
    /// Reads a file, decoding UTF-16 and stripping a byte order mark if present.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        let bom = Encoding::for_bom(&bytes).map(|(encoding, _)| encoding);
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(bytes.as_slice());
        let mut text = String::new();
        decoder.read_to_string(&mut text)?;
        Ok(SourceText { text, bom })
    }

    pub fn has_bom(&self) -> bool {
        self.bom.is_some()
    }

    /// Encodes `text` the way the file was read: same encoding, same mark.
    pub fn to_bytes(&self, text: &str) -> Vec<u8> {
        let Some(encoding) = self.bom else {
            return text.as_bytes().to_vec();
        };
        let mut out = Vec::with_capacity(text.len() * 2 + 3);
        if encoding == UTF_16LE {
            out.extend_from_slice(&[0xFF, 0xFE]);
            out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        } else if encoding == UTF_16BE {
            out.extend_from_slice(&[0xFE, 0xFF]);
            out.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        } else {
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
            out.extend_from_slice(text.as_bytes());
        }
        out
    }
}

/// Current byte offset of the reader in the text it was created from.
pub(crate) fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Reads one event and returns it with the byte range it covers.
pub(crate) fn next_event<'a>(
    reader: &mut Reader<&'a [u8]>,
) -> Result<(Event<'a>, Range<usize>), Error> {
    let start = position(reader);
    let event = reader.read_event()?;
    let end = position(reader);
    Ok((event, start..end))
}

/// Reads events up to the end tag matching an already consumed start tag.
/// Returns the byte range of the inner content and of the end tag.
pub(crate) fn skip_to_end<'a>(
    reader: &mut Reader<&'a [u8]>,
    content_start: usize,
) -> Result<(Range<usize>, Range<usize>), Error> {
    let mut depth = 0usize;
    loop {
        let (event, span) = next_event(reader)?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok((content_start..span.start, span)),
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(Error::MalformedDocument(
                    "unexpected end of document".to_string(),
                ));
            }
            _ => {}
        }
    }
}

pub(crate) fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, Error> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::MalformedDocument(e.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.to_string()));
        }
    }
    Ok(None)
}

pub(crate) fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_vec()
}

/// Whitespace between the start of the line holding `offset` and `offset`,
/// or `None` if other text precedes it on that line.
pub(crate) fn line_indent(content: &str, offset: usize) -> Option<&str> {
    let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &content[line_start..offset];
    prefix
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(prefix)
}

/// Builds the append point in front of a root end tag starting at `end_tag_start`.
pub(crate) fn append_point_before(
    content: &str,
    end_tag_start: usize,
    indent: &str,
    template: UnitTemplate,
) -> AppendPoint {
    let (at, needs_newline) = match line_indent(content, end_tag_start) {
        Some(prefix) => (end_tag_start - prefix.len(), false),
        None => (end_tag_start, true),
    };
    AppendPoint {
        at,
        indent: indent.to_string(),
        needs_newline,
        newline: detect_newline(content),
        template,
        expand_root: None,
    }
}

/// `"\r\n"` when the document already uses CRLF line endings, `"\n"` otherwise.
pub(crate) fn detect_newline(content: &str) -> &'static str {
    if content.contains("\r\n") { "\r\n" } else { "\n" }
}

/// The raw start tag text of an empty element without its closing `/>`.
pub(crate) fn open_tag_of_empty(content: &str, span: &Range<usize>) -> String {
    content[span.clone()]
        .trim_end_matches('>')
        .trim_end_matches('/')
        .trim_end()
        .to_string()
}

pub(crate) const DEFAULT_INDENT: &str = "    ";
