//! Conversion between on-disk payloads and the canonical text kept in units
//! and in the remote table.
//!
//! Canonical text has character and entity references resolved, keeps nested
//! markup (`<b>`, `<xliff:g>`) literally and, for Android, drops the backslash
//! in front of quotes, `@` and `?` and the double quotes delimiting a whole
//! value. Encoding goes the other way and is format-specific:
//!
//! - Android strings with printf placeholders are fully escaped (markup becomes
//!   `&lt;b&gt;`), since `getString(id, args)` would strip real markup.
//! - Android strings without placeholders keep markup as real elements when the
//!   fragment is well-formed XML, and fall back to full escaping otherwise.
//! - XLIFF and resx text is always fully escaped.

use std::ops::Range;

use lazy_static::lazy_static;
use quick_xml::{Reader, events::Event};
use regex::Regex;

lazy_static! {
    /// Start, end and empty-element tags, plus comments, as they appear inside a payload.
    static ref MARKUP_TOKEN: Regex =
        Regex::new(r"<!--[\s\S]*?-->|</?[A-Za-z_][\w:.\-]*(?:\s[^<>]*)?/?>").unwrap();
}

/// One printf-style directive found in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub index: Option<usize>,
    pub kind: char,
    /// Byte range of the whole directive, `%` included.
    pub span: Range<usize>,
}

impl PlaceholderToken {
    pub fn to_signature(&self) -> String {
        match self.index {
            Some(i) => format!("{}${}", i, self.kind),
            None => format!("{}", self.kind),
        }
    }
}

const CONVERSIONS: &[u8] = b"diouxXeEfFgGaAcsSpn@";
const FLAGS: &[u8] = b"-+#0,";

/// Extracts placeholder tokens in occurrence order.
///
/// Recognizes `%[position$][flags][width][.precision][length]conversion`, where the
/// conversion may also be Apple's `%@`. `%%` is a literal percent sign.
pub fn extract_placeholders(input: &str) -> Vec<PlaceholderToken> {
    let bytes = input.as_bytes();
    let mut i = 0;
    let mut out = Vec::new();

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if i + 1 < bytes.len() && bytes[i + 1] == b'%' {
            i += 2;
            continue;
        }

        let mut j = i + 1;

        // Optional positional index: digits followed by '$'
        let mut index: Option<usize> = None;
        let start_digits = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j < bytes.len() && j > start_digits && bytes[j] == b'$' {
            index = input[start_digits..j].parse::<usize>().ok();
            j += 1;
        } else {
            j = i + 1;
        }

        while j < bytes.len() && FLAGS.contains(&bytes[j]) {
            j += 1;
        }
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'.' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
        }
        while j < bytes.len() && matches!(bytes[j], b'h' | b'l' | b'L' | b'q' | b'j' | b'z' | b't')
        {
            j += 1;
        }

        if j < bytes.len() && CONVERSIONS.contains(&bytes[j]) {
            out.push(PlaceholderToken {
                index,
                kind: canonical_kind_char(bytes[j] as char),
                span: i..j + 1,
            });
            i = j + 1;
            continue;
        }

        // Not a recognized placeholder; skip this '%'
        i += 1;
    }

    out
}

/// Whether the string contains at least one printf-style directive.
pub fn has_placeholders(input: &str) -> bool {
    !extract_placeholders(input).is_empty()
}

/// Normalized placeholder signature, for comparing a translation against its source.
pub fn signature(input: &str) -> Vec<String> {
    extract_placeholders(input)
        .into_iter()
        .map(|t| t.to_signature())
        .collect()
}

fn canonical_kind_char(ch: char) -> char {
    match ch {
        '@' | 'S' => 's',
        'i' => 'd',
        c => c.to_ascii_lowercase(),
    }
}

/// Length of the character or entity reference at the start of `s`, if any.
fn reference_len(s: &str) -> Option<usize> {
    let rest = s.strip_prefix('&')?;
    let end = rest.find(';')?;
    let body = &rest[..end];
    let valid = match body {
        "lt" | "gt" | "amp" | "quot" | "apos" => true,
        _ => match body.strip_prefix('#') {
            Some(hex) if hex.starts_with(['x', 'X']) => {
                hex.len() > 1 && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
            }
            Some(dec) => !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit()),
            None => false,
        },
    };
    valid.then_some(end + 2)
}

fn resolve_reference(reference: &str) -> Option<char> {
    let body = &reference[1..reference.len() - 1];
    match body {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = body.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Replaces every valid character or entity reference with the character it names.
/// A lone `&` that does not start a reference is kept as is.
pub fn resolve_references(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match reference_len(rest).and_then(|len| resolve_reference(&rest[..len]).map(|c| (len, c)))
        {
            Some((len, c)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes `&`, `<` and `>` for XML text content.
///
/// An `&` that already starts a valid reference is left alone, so escaping an
/// already escaped string collapses instead of producing `&amp;lt;`.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if reference_len(&s[i..]).is_some() => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a value for use inside a double-quoted attribute.
pub fn escape_attribute(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

fn escape_bare_ampersands(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == '&' && reference_len(&s[i..]).is_none() {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether `fragment` parses as XML content (text and balanced elements) on its own.
pub fn is_well_formed_fragment(fragment: &str) -> bool {
    let wrapped = format!("<fragment>{}</fragment>", fragment);
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().check_end_names = true;
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

/// Keeps markup tags verbatim and escapes the text between them; falls back to
/// escaping everything when the result would not be well-formed.
fn encode_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in MARKUP_TOKEN.find_iter(s) {
        out.push_str(&escape_text(&s[last..m.start()]));
        out.push_str(&escape_bare_ampersands(m.as_str()));
        last = m.end();
    }
    out.push_str(&escape_text(&s[last..]));

    if is_well_formed_fragment(&out) {
        out
    } else {
        escape_text(s)
    }
}

fn preceded_by_odd_backslashes(bytes: &[u8], pos: usize) -> bool {
    bytes[..pos].iter().rev().take_while(|&&b| b == b'\\').count() % 2 == 1
}

fn is_android_special(c: char) -> bool {
    matches!(c, '\'' | '"' | '@' | '?')
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\\', count));
}

/// Backslash-protects the characters Android resource compilation treats specially:
/// quotes anywhere, `@` and `?` at the start of the string. A literal backslash run
/// in front of one of those characters is doubled. Text with leading or trailing
/// whitespace is wrapped in double quotes so aapt keeps the whitespace.
fn escape_android_specials(s: &str) -> String {
    let quoted = s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace);
    let mut out = String::with_capacity(s.len() + 4);
    if quoted {
        out.push('"');
    }
    let mut run = 0;
    for (i, c) in s.char_indices() {
        if c == '\\' {
            run += 1;
            continue;
        }
        if is_android_special(c) {
            push_backslashes(&mut out, run * 2);
        } else {
            push_backslashes(&mut out, run);
        }
        run = 0;
        match c {
            '\'' | '"' => out.push('\\'),
            '@' | '?' if i == 0 => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    // The closing quote is special too.
    push_backslashes(&mut out, if quoted { run * 2 } else { run });
    if quoted {
        out.push('"');
    }
    out
}

/// The content between an opening and a closing unescaped double quote.
fn strip_quote_delimiters(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    let quoted = bytes.len() >= 2
        && bytes[0] == b'"'
        && bytes[bytes.len() - 1] == b'"'
        && !preceded_by_odd_backslashes(bytes, bytes.len() - 1);
    quoted.then(|| &raw[1..raw.len() - 1])
}

/// Inverse of [`escape_android_specials`]. Backslash runs before `'`, `"`, `@` and
/// `?` are halved and an odd backslash escapes the character; other escapes such
/// as `\n` or `\u2026` are meaningful to translators and stay verbatim.
fn unescape_android_specials(raw: &str) -> String {
    let (body, quoted) = match strip_quote_delimiters(raw) {
        Some(inner) => (inner, true),
        None => (raw, false),
    };
    let mut out = String::with_capacity(body.len());
    let mut run = 0;
    for c in body.chars() {
        if c == '\\' {
            run += 1;
            continue;
        }
        if is_android_special(c) {
            push_backslashes(&mut out, run / 2);
        } else {
            push_backslashes(&mut out, run);
        }
        run = 0;
        out.push(c);
    }
    push_backslashes(&mut out, if quoted { run / 2 } else { run });
    out
}

/// Format-specific payload codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    Android,
    Xliff,
    Resx,
}

impl Escaping {
    /// On-disk payload -> canonical text.
    pub fn decode(&self, raw: &str) -> String {
        match self {
            Escaping::Android => resolve_references(&unescape_android_specials(raw)),
            Escaping::Xliff | Escaping::Resx => resolve_references(raw),
        }
    }

    /// Canonical text -> on-disk payload.
    pub fn encode(&self, canonical: &str) -> String {
        match self {
            Escaping::Android => {
                let protected = escape_android_specials(canonical);
                if has_placeholders(canonical) {
                    escape_text(&protected)
                } else {
                    encode_markup(&protected)
                }
            }
            Escaping::Xliff | Escaping::Resx => escape_text(canonical),
        }
    }

    /// Whether an on-disk payload already represents `canonical`.
    pub fn matches(&self, raw: &str, canonical: &str) -> bool {
        self.decode(raw) == canonical
    }
}
