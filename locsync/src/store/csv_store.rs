//! A [`RemoteStore`] kept as CSV files on disk.
//!
//! Layout: `<root>/<Language>_localizations/<platform>_strings.csv`, one header
//! row followed by the records, sorted by their first column after every append.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    error::Error,
    rewrite::atomic_write,
    store::{GroupKey, RemoteStore, Row},
};

#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        CsvStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file backing one table.
    pub fn path_for(&self, group: &GroupKey) -> PathBuf {
        self.root
            .join(group.table_name())
            .join(format!("{}.csv", group.sheet_name()))
    }

    fn read_table(path: &Path) -> Result<Option<Table>, csv::Error> {
        if !path.is_file() {
            return Ok(None);
        }
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for result in rdr.records() {
            rows.push(result?.iter().map(str::to_string).collect());
        }
        Ok(Some(Table { headers, rows }))
    }

    fn write_table(path: &Path, table: &Table) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(path, &bytes)?;
        Ok(())
    }
}

impl RemoteStore for CsvStore {
    fn get_records(&self, group: &GroupKey) -> Result<Vec<Row>, Error> {
        let path = self.path_for(group);
        let Some(table) =
            Self::read_table(&path).map_err(|e| Error::remote_unavailable(group.to_string(), e))?
        else {
            debug!(table = %group, "no table yet");
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .into_iter()
            .map(|fields| table.headers.iter().cloned().zip(fields).collect())
            .collect())
    }

    fn append_records(&mut self, group: &GroupKey, rows: Vec<Vec<String>>) -> Result<(), Error> {
        if rows.is_empty() {
            return Ok(());
        }
        let path = self.path_for(group);
        let mut table = Self::read_table(&path)
            .map_err(|e| Error::remote_unavailable(group.to_string(), e))?
            .unwrap_or_else(|| Table {
                headers: group.headers.clone(),
                rows: Vec::new(),
            });

        // Map each incoming column onto the table's own header order, adding
        // columns the table does not have yet.
        let positions: Vec<usize> = group
            .headers
            .iter()
            .map(|header| match table.headers.iter().position(|h| h == header) {
                Some(i) => i,
                None => {
                    table.headers.push(header.clone());
                    table.headers.len() - 1
                }
            })
            .collect();
        let width = table.headers.len();
        let count = rows.len();
        for fields in rows {
            let mut row = vec![String::new(); width];
            for (field, &i) in fields.into_iter().zip(&positions) {
                row[i] = field;
            }
            table.rows.push(row);
        }
        table.rows.sort_by(|a, b| a.first().cmp(&b.first()));

        Self::write_table(&path, &table)
            .map_err(|e| Error::remote_unavailable(group.to_string(), e))?;
        info!(table = %group, added = count, "appended records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        formats::FormatType,
        language::{BuiltinLanguageNames, Language, LanguagePair},
    };

    fn group() -> GroupKey {
        let names = BuiltinLanguageNames;
        let languages = LanguagePair::new(Language::new("en", &names), Language::new("fr", &names));
        GroupKey::new(FormatType::AndroidStrings, &languages)
    }

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_missing_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        assert!(store.get_records(&group()).unwrap().is_empty());
        assert!(!store.path_for(&group()).exists());
    }

    #[test]
    fn test_append_creates_table_with_headers_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        let group = group();
        store
            .append_records(&group, vec![fields(&["Hi", "", "hello"])])
            .unwrap();
        store
            .append_records(&group, vec![fields(&["Bye", "Au revoir", "bye"])])
            .unwrap();

        let path = store.path_for(&group);
        assert!(path.ends_with("French_localizations/android_strings.csv"));
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Source: English,Target: French,String ID\n"));

        let rows = store.get_records(&group).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["String ID"], "bye");
        assert_eq!(rows[1]["Source: English"], "Hi");
    }

    #[test]
    fn test_append_maps_onto_existing_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        let group = group();
        let path = store.path_for(&group);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "String ID,Target: French\nhello,Bonjour\n").unwrap();

        store
            .append_records(&group, vec![fields(&["Yes", "Oui", "yes"])])
            .unwrap();

        let rows = store.get_records(&group).unwrap();
        let yes = rows.iter().find(|r| r["String ID"] == "yes").unwrap();
        assert_eq!(yes["Target: French"], "Oui");
        assert_eq!(yes["Source: English"], "Yes");
        let hello = rows.iter().find(|r| r["String ID"] == "hello").unwrap();
        assert_eq!(hello.get("Source: English"), None);
    }

    #[test]
    fn test_quoted_cells_survive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        let group = group();
        store
            .append_records(&group, vec![fields(&["Say \"hi\", then go", "", "say"])])
            .unwrap();
        let rows = store.get_records(&group).unwrap();
        assert_eq!(rows[0]["Source: English"], "Say \"hi\", then go");
    }
}
