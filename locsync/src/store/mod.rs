//! The remote translation table: adapter trait, column layouts and snapshots.
//!
//! One table exists per (platform, target language) pair. Rows are plain
//! header -> value maps; [`ColumnLayout`] turns them into [`RemoteRecord`]s
//! for one file's format and languages.

pub mod csv_store;

use std::{
    collections::HashMap,
    fmt::Display,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    file::LocalizationFile,
    formats::FormatType,
    language::{BuiltinLanguageNames, Language, LanguageNames, LanguagePair, normalize_code},
    types::TranslationUnit,
};

pub use self::csv_store::CsvStore;

/// One remote row, keyed by column header.
pub type Row = HashMap<String, String>;

/// Names one remote table and the headers it is created with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub platform: String,
    /// Friendly name of the target language.
    pub language: String,
    pub headers: Vec<String>,
}

impl GroupKey {
    pub fn new(format: FormatType, languages: &LanguagePair) -> Self {
        GroupKey {
            platform: format.platform().to_string(),
            language: languages.target.name.clone(),
            headers: ColumnLayout::new(format, languages).headers,
        }
    }

    pub fn for_file(file: &LocalizationFile) -> Self {
        Self::new(file.format, &file.languages)
    }

    /// `"French_localizations"`
    pub fn table_name(&self) -> String {
        format!("{}_localizations", self.language)
    }

    /// `"android_strings"`
    pub fn sheet_name(&self) -> String {
        format!("{}_strings", self.platform)
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.table_name(), self.sheet_name())
    }
}

/// Adapter to a tabular translation store.
///
/// Implementations create missing tables on demand and must map a column
/// header naming a language to that language's text column. Failures are
/// reported as [`Error::RemoteUnavailable`].
pub trait RemoteStore {
    /// All rows of a table, in table order. A table that does not exist yet is empty.
    fn get_records(&self, group: &GroupKey) -> Result<Vec<Row>, Error>;

    /// Appends rows given in the order of `group.headers`.
    fn append_records(&mut self, group: &GroupKey, rows: Vec<Vec<String>>) -> Result<(), Error>;
}

/// A remote row decoded for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub identifier: String,
    pub source_text: String,
    pub target_text: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub example: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub comment: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub file_path: String,
}

impl RemoteRecord {
    pub fn is_translated(&self) -> bool {
        !self.target_text.trim().is_empty()
    }
}

const SOURCE_PREFIX: &str = "Source";
const TARGET_PREFIX: &str = "Target";

/// Column headers of a format's remote table and how to read rows back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    format: FormatType,
    source: Language,
    target: Language,
    headers: Vec<String>,
}

impl ColumnLayout {
    pub fn new(format: FormatType, languages: &LanguagePair) -> Self {
        let mut headers = vec![
            format!("{}: {}", SOURCE_PREFIX, languages.source.name),
            format!("{}: {}", TARGET_PREFIX, languages.target.name),
        ];
        match format {
            FormatType::AndroidStrings | FormatType::Resx => headers.push("String ID".to_string()),
            FormatType::Xliff => headers.extend(
                ["Example", "Comment", "String Key", "File Path"]
                    .iter()
                    .map(|h| h.to_string()),
            ),
        }
        ColumnLayout {
            format,
            source: languages.source.clone(),
            target: languages.target.clone(),
            headers,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn identifier_header(&self) -> &'static str {
        match self.format {
            FormatType::AndroidStrings | FormatType::Resx => "String ID",
            FormatType::Xliff => "String Key",
        }
    }

    /// The unit as a row in header order.
    pub fn row_for(&self, unit: &TranslationUnit) -> Vec<String> {
        unit.record_fields()
    }

    /// Decodes a row; `None` when it has no identifier. Missing columns read as "".
    pub fn record(&self, row: &Row) -> Option<RemoteRecord> {
        let identifier = cell(row, self.identifier_header()).trim().to_string();
        if identifier.is_empty() {
            return None;
        }
        Some(RemoteRecord {
            identifier,
            source_text: language_cell(row, SOURCE_PREFIX, &self.source).to_string(),
            target_text: language_cell(row, TARGET_PREFIX, &self.target).to_string(),
            example: cell(row, "Example").to_string(),
            comment: cell(row, "Comment").to_string(),
            file_path: cell(row, "File Path").to_string(),
        })
    }
}

fn cell<'a>(row: &'a Row, header: &str) -> &'a str {
    row.get(header).map(String::as_str).unwrap_or("")
}

/// Finds the text column of `language`: `"Target: French"` first, then the
/// same prefix with the language code, then a bare header equal to the
/// language name or code. Failing that, any `"Target: <name>"` header whose
/// name resolves to the same code (`"Target: french"`, `"Target: Portuguese (BR)"`
/// for `pt_BR`).
fn language_cell<'a>(row: &'a Row, prefix: &str, language: &Language) -> &'a str {
    let candidates = [
        format!("{}: {}", prefix, language.name),
        format!("{}: {}", prefix, language.code),
        language.name.clone(),
        language.code.clone(),
    ];
    candidates
        .iter()
        .find_map(|header| row.get(header))
        .or_else(|| {
            let wanted = normalize_code(&language.code).ok()?;
            row.iter().find_map(|(header, value)| {
                let name = header.strip_prefix(prefix)?.strip_prefix(':')?;
                let code = BuiltinLanguageNames.code_for(name)?;
                (normalize_code(&code).ok()? == wanted).then_some(value)
            })
        })
        .map(String::as_str)
        .unwrap_or("")
}

/// Remote records for one file, indexed by identifier. Refetched on every pass.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    records: Vec<RemoteRecord>,
    index: HashMap<String, usize>,
}

impl RemoteSnapshot {
    /// Builds a snapshot from raw rows. Rows without an identifier are
    /// ignored; on duplicate identifiers the first row wins.
    pub fn from_rows(rows: &[Row], layout: &ColumnLayout) -> Self {
        let mut snapshot = RemoteSnapshot::default();
        for record in rows.iter().filter_map(|row| layout.record(row)) {
            if snapshot.index.contains_key(&record.identifier) {
                continue;
            }
            snapshot
                .index
                .insert(record.identifier.clone(), snapshot.records.len());
            snapshot.records.push(record);
        }
        snapshot
    }

    /// Fetches and decodes the table of `file`.
    pub fn fetch(store: &dyn RemoteStore, file: &LocalizationFile) -> Result<Self, Error> {
        let group = GroupKey::for_file(file);
        let rows = store.get_records(&group)?;
        let layout = ColumnLayout::new(file.format, &file.languages);
        Ok(Self::from_rows(&rows, &layout))
    }

    /// Replaces each record's source text with the development language
    /// file's text for the same identifier, when there is one.
    pub fn with_source_texts(mut self, source: &LocalizationFile) -> Self {
        for record in &mut self.records {
            if let Some(unit) = source.unit(&record.identifier) {
                record.source_text = unit.target_text.clone();
            }
        }
        self
    }

    pub fn get(&self, identifier: &str) -> Option<&RemoteRecord> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    /// Records in table order.
    pub fn records(&self) -> &[RemoteRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// In-memory store, keyed by table and sheet name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<(String, String), Vec<Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw row, whatever its headers.
    pub fn insert_row(&mut self, group: &GroupKey, row: Row) {
        self.tables
            .entry((group.table_name(), group.sheet_name()))
            .or_default()
            .push(row);
    }
}

impl RemoteStore for MemoryStore {
    fn get_records(&self, group: &GroupKey) -> Result<Vec<Row>, Error> {
        Ok(self
            .tables
            .get(&(group.table_name(), group.sheet_name()))
            .cloned()
            .unwrap_or_default())
    }

    fn append_records(&mut self, group: &GroupKey, rows: Vec<Vec<String>>) -> Result<(), Error> {
        for fields in rows {
            let row = group.headers.iter().cloned().zip(fields).collect();
            self.insert_row(group, row);
        }
        Ok(())
    }
}
