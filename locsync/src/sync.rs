//! Driving push and pull over a set of localization files.
//!
//! Files are handled one after another. A failure in one file is logged,
//! recorded in its [`FileReport`] and the run moves on; only a missing
//! development language file stops the whole run.

use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    build_tool::BuildTool,
    error::Error,
    file::LocalizationFile,
    formats::FormatType,
    language::LanguageNames,
    reconcile::{ReconcileReport, reconcile},
    rewrite::{DEFAULT_MARKER, RewriteOptions, RewriteOutcome, rewrite_file},
    store::{ColumnLayout, GroupKey, RemoteSnapshot, RemoteStore},
    types::TranslationUnit,
};

/// What to do with each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Upload units the remote table lacks.
    Export,
    /// Pull remote translations into the file.
    Import,
    /// Export, then import.
    Sync,
}

impl Operation {
    fn pushes(&self) -> bool {
        matches!(self, Operation::Export | Operation::Sync)
    }

    fn pulls(&self) -> bool {
        matches!(self, Operation::Import | Operation::Sync)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operation::Export => "export",
            Operation::Import => "import",
            Operation::Sync => "sync",
        })
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export" | "1" => Ok(Operation::Export),
            "import" | "2" => Ok(Operation::Import),
            "sync" | "export&import" | "3" => Ok(Operation::Sync),
            other => Err(Error::Config(format!("unknown operation `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub operation: Operation,
    /// Code of the development language, e.g. `en`.
    pub dev_language: String,
    pub marker: String,
    /// Plan only: neither files nor the store are written.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            operation: Operation::Sync,
            dev_language: "en".to_string(),
            marker: DEFAULT_MARKER.to_string(),
            dry_run: false,
        }
    }
}

impl SyncOptions {
    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            marker: self.marker.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// Outcome for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub language: String,
    /// Identifiers uploaded to the remote table.
    pub pushed: Vec<String>,
    pub reconcile: Option<ReconcileReport>,
    pub rewrite: Option<RewriteOutcome>,
    /// The document was imported back through the build tool.
    pub imported: bool,
    /// Recoverable problems: skipped units and missing source matches.
    pub issues: Vec<String>,
    /// The failure that stopped this file, if any.
    pub error: Option<String>,
}

impl FileReport {
    fn for_file(file: &LocalizationFile) -> Self {
        FileReport {
            path: file.path.clone(),
            language: file.languages.target.code.clone(),
            issues: file.issues.iter().map(ToString::to_string).collect(),
            ..FileReport::default()
        }
    }

    fn failed(path: &Path, err: &Error) -> Self {
        FileReport {
            path: path.to_path_buf(),
            error: Some(err.to_string()),
            ..FileReport::default()
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub operation: Option<Operation>,
    pub files: Vec<FileReport>,
}

impl SyncReport {
    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures() > 0
    }
}

/// An XLIFF project whose translated documents are imported back after a pull.
struct ImportTarget<'a> {
    tool: &'a dyn BuildTool,
    project: PathBuf,
}

/// Runs operations against one remote store.
pub struct SyncSession<'a> {
    store: &'a mut dyn RemoteStore,
    options: SyncOptions,
    import: Option<ImportTarget<'a>>,
}

impl<'a> SyncSession<'a> {
    pub fn new(store: &'a mut dyn RemoteStore, options: SyncOptions) -> Self {
        SyncSession {
            store,
            options,
            import: None,
        }
    }

    /// Imports each XLIFF document that received translations into `project`.
    pub fn with_build_tool(mut self, tool: &'a dyn BuildTool, project: impl Into<PathBuf>) -> Self {
        self.import = Some(ImportTarget {
            tool,
            project: project.into(),
        });
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Uploads the units of `file` the remote table has no row for: local
    /// units first, then untranslated ones. Returns their identifiers.
    pub fn push(&mut self, file: &LocalizationFile) -> Result<Vec<String>, Error> {
        let group = GroupKey::for_file(file);
        let layout = ColumnLayout::new(file.format, &file.languages);
        let snapshot = RemoteSnapshot::fetch(&*self.store, file)?;

        let mut seen = HashSet::new();
        let pending: Vec<&TranslationUnit> = file
            .all_units()
            .filter(|u| !snapshot.contains(u.identifier()) && seen.insert(u.identifier()))
            .collect();
        let identifiers: Vec<String> = pending.iter().map(|u| u.identifier().to_string()).collect();
        if pending.is_empty() {
            info!(file = %file.path.display(), table = %group, "remote table is up to date");
            return Ok(identifiers);
        }
        if self.options.dry_run {
            info!(
                file = %file.path.display(),
                table = %group,
                count = pending.len(),
                "dry run, not uploading"
            );
            return Ok(identifiers);
        }

        let rows = pending.iter().map(|u| layout.row_for(u)).collect();
        self.store.append_records(&group, rows)?;
        Ok(identifiers)
    }

    /// Reconciles `file` against a fresh snapshot and rewrites it.
    ///
    /// `source` is the development language file, used to fill in the
    /// source column of the snapshot.
    pub fn pull(
        &mut self,
        file: &mut LocalizationFile,
        source: Option<&LocalizationFile>,
    ) -> Result<(ReconcileReport, RewriteOutcome), Error> {
        let mut snapshot = RemoteSnapshot::fetch(&*self.store, file)?;
        if let Some(source) = source {
            snapshot = snapshot.with_source_texts(source);
        }
        let report = reconcile(file, &snapshot);
        for id in &report.missing_locally {
            warn!(file = %file.path.display(), id = id.as_str(), "remote row has no local string");
        }
        let outcome = rewrite_file(file, &self.options.rewrite_options())?;
        Ok((report, outcome))
    }

    /// Runs the configured operation on one loaded file.
    pub fn run_file(
        &mut self,
        file: &mut LocalizationFile,
        source: Option<&LocalizationFile>,
    ) -> FileReport {
        let mut report = FileReport::for_file(file);
        if let Err(err) = self.run_file_inner(file, source, &mut report) {
            error!(file = %file.path.display(), "{}", err);
            report.error = Some(err.to_string());
        }
        report
    }

    fn run_file_inner(
        &mut self,
        file: &mut LocalizationFile,
        source: Option<&LocalizationFile>,
        report: &mut FileReport,
    ) -> Result<(), Error> {
        if self.options.operation.pushes() {
            report.pushed = self.push(file)?;
        }
        if !self.options.operation.pulls() {
            return Ok(());
        }
        let (reconciled, outcome) = self.pull(file, source)?;
        let has_changes = reconciled.has_changes();
        report.reconcile = Some(reconciled);
        report.rewrite = Some(outcome);

        if let Some(import) = &self.import
            && file.format == FormatType::Xliff
            && has_changes
            && !self.options.dry_run
        {
            import.tool.import_localization(&import.project, &file.path)?;
            report.imported = true;
        }
        Ok(())
    }

    /// Runs the configured operation on already loaded files.
    ///
    /// Android and resx files are compared against the development language
    /// file first; its absence is fatal for the whole run. XLIFF files
    /// carry their own source text and do not need it.
    pub fn run_files(&mut self, mut files: Vec<LocalizationFile>) -> Result<SyncReport, Error> {
        let mut report = SyncReport {
            operation: Some(self.options.operation),
            files: Vec::new(),
        };

        let dev = files.iter().position(LocalizationFile::is_source_language_file);
        let needs_dev_file = files.iter().any(|f| !f.format.carries_source_text());
        let source = match dev {
            Some(i) => Some(files.remove(i)),
            None if needs_dev_file => {
                return Err(Error::NoDevelopmentLanguageFile {
                    language: self.options.dev_language.clone(),
                });
            }
            None => None,
        };

        for file in &mut files {
            if let Some(source) = &source {
                let problems = file.update_source_language(source);
                let mut file_report = self.run_file(file, Some(source));
                file_report
                    .issues
                    .extend(problems.iter().map(ToString::to_string));
                report.files.push(file_report);
            } else {
                report.files.push(self.run_file(file, None));
            }
        }
        if let Some(mut source) = source {
            report.files.insert(0, self.run_file(&mut source, None));
        }

        info!(
            operation = %self.options.operation,
            files = report.files.len(),
            failed = report.failures(),
            "run finished"
        );
        Ok(report)
    }

    /// Loads every path, then runs the configured operation.
    ///
    /// A file that cannot be loaded is reported as failed and skipped.
    pub fn run(&mut self, paths: &[PathBuf], names: &dyn LanguageNames) -> Result<SyncReport, Error> {
        let mut failed = Vec::new();
        let mut files = Vec::new();
        for path in paths {
            match LocalizationFile::load(path, &self.options.dev_language, names) {
                Ok(file) => files.push(file),
                Err(err) => {
                    error!(file = %path.display(), "{}", err);
                    failed.push(FileReport::failed(path, &err));
                }
            }
        }
        let mut report = self.run_files(files)?;
        report.files.extend(failed);
        Ok(report)
    }
}
