use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use locsync::build_tool::exported_document_path;
use locsync::formats::split_resx_culture;
use locsync::{
    BuildTool, BuiltinLanguageNames, CsvStore, Operation, SyncOptions, SyncReport, SyncSession,
    Xcodebuild, rewrite::DEFAULT_MARKER,
};
use tracing::info;

use crate::config::Config;
use crate::discover;
use crate::validation::{
    validate_dir_path, validate_language_code, validate_language_list, validate_output_dir,
    validate_output_path,
};

const DEFAULT_STORE_DIR: &str = "translations";
const DEFAULT_DEV_LANGUAGE: &str = "en";

/// Options shared by the platform commands, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub operation: Option<Operation>,
    pub store: Option<PathBuf>,
    pub project: Option<String>,
    pub dev_language: Option<String>,
    pub marker: Option<String>,
    pub dry_run: bool,
    pub report_json: Option<PathBuf>,
}

/// Command line values merged over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_root: PathBuf,
    pub options: SyncOptions,
    pub report_json: Option<PathBuf>,
}

impl Settings {
    /// Flags win over config keys. `fallback_project` names the store
    /// directory when neither sets a project.
    pub fn resolve(
        config: &Config,
        args: &RunArgs,
        fallback_project: Option<&str>,
    ) -> Result<Settings, String> {
        let dev_language = args
            .dev_language
            .clone()
            .or_else(|| config.dev_language.clone())
            .unwrap_or_else(|| DEFAULT_DEV_LANGUAGE.to_string());
        validate_language_code(&dev_language)?;

        let mut store_root = args
            .store
            .clone()
            .or_else(|| config.store_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
        if let Some(project) = args
            .project
            .as_deref()
            .or(config.project.as_deref())
            .or(fallback_project)
        {
            store_root.push(project);
        }

        Ok(Settings {
            store_root,
            options: SyncOptions {
                operation: args.operation.unwrap_or(Operation::Sync),
                dev_language,
                marker: args
                    .marker
                    .clone()
                    .or_else(|| config.marker.clone())
                    .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
                dry_run: args.dry_run,
            },
            report_json: args.report_json.clone(),
        })
    }
}

fn run_paths(settings: &Settings, paths: &[PathBuf]) -> Result<SyncReport, String> {
    let mut store = CsvStore::new(&settings.store_root);
    SyncSession::new(&mut store, settings.options.clone())
        .run(paths, &BuiltinLanguageNames)
        .map_err(|e| e.to_string())
}

/// Syncs every `values*/strings.xml` below `res_dir`.
pub fn run_android(res_dir: &Path, config: &Config, args: &RunArgs) -> Result<(), String> {
    validate_dir_path(res_dir)?;
    let settings = Settings::resolve(config, args, None)?;
    let paths = discover::android_string_files(res_dir)?;
    if paths.is_empty() {
        return Err(format!("No strings.xml files found in {}", res_dir.display()));
    }
    for path in &paths {
        info!(file = %path.display(), "found");
    }
    let report = run_paths(&settings, &paths)?;
    finish(&settings, &report)
}

/// Groups `.resx` files by resource set: same directory and base name,
/// e.g. `Strings.resx` with `Strings.fr.resx`.
fn resx_sets(paths: Vec<PathBuf>) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut sets: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base, _) = split_resx_culture(&stem);
        let key = path.with_file_name(base);
        sets.entry(key).or_default().push(path);
    }
    sets
}

/// Syncs every resource set of `.resx` files below `dir`.
pub fn run_resx(dir: &Path, config: &Config, args: &RunArgs) -> Result<(), String> {
    validate_dir_path(dir)?;
    let settings = Settings::resolve(config, args, None)?;
    let paths = discover::resx_files(dir)?;
    if paths.is_empty() {
        return Err(format!("No .resx files found in {}", dir.display()));
    }

    let mut report = SyncReport {
        operation: Some(settings.options.operation),
        files: Vec::new(),
    };
    for (set, paths) in resx_sets(paths) {
        info!(set = %set.display(), files = paths.len(), "syncing resource set");
        report.files.extend(run_paths(&settings, &paths)?.files);
    }
    finish(&settings, &report)
}

#[derive(Debug, Clone)]
pub struct IosArgs {
    pub xcodeproj: PathBuf,
    pub languages: Vec<String>,
    pub output_dir: PathBuf,
    /// Reuse documents from a previous export instead of running one.
    pub no_export: bool,
}

/// Exports XLIFF documents from an Xcode project, syncs them and imports
/// back the ones that received translations.
pub fn run_ios(ios: &IosArgs, config: &Config, args: &RunArgs) -> Result<(), String> {
    let xcodeproj = ios.xcodeproj.as_path();
    if !xcodeproj.exists() {
        return Err(format!("Xcode project does not exist: {}", xcodeproj.display()));
    }
    validate_language_list(&ios.languages)?;
    validate_output_dir(&ios.output_dir)?;

    let project_name = xcodeproj
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    let settings = Settings::resolve(config, args, project_name.as_deref())?;

    let tool = Xcodebuild::new();
    let mut languages = ios.languages.clone();
    let dev = &settings.options.dev_language;
    if !languages.contains(dev) && (ios.no_export || tool.supports_development_language()) {
        languages.insert(0, dev.clone());
    }

    let paths: Vec<PathBuf> = if ios.no_export {
        languages
            .iter()
            .map(|language| exported_document_path(&ios.output_dir, language))
            .filter(|path| path.is_file())
            .collect()
    } else {
        tool.export_localizations(xcodeproj, &languages, &ios.output_dir)
            .map_err(|e| e.to_string())?
    };
    if paths.is_empty() {
        return Err(format!("No XLIFF documents found in {}", ios.output_dir.display()));
    }

    let mut store = CsvStore::new(&settings.store_root);
    let report = SyncSession::new(&mut store, settings.options.clone())
        .with_build_tool(&tool, xcodeproj)
        .run(&paths, &BuiltinLanguageNames)
        .map_err(|e| e.to_string())?;
    finish(&settings, &report)
}

fn print_summary(report: &SyncReport) {
    for file in &report.files {
        match &file.error {
            Some(error) => println!("❌ {}: {}", file.path.display(), error),
            None => {
                let mut parts = Vec::new();
                if !file.pushed.is_empty() {
                    parts.push(format!("{} pushed", file.pushed.len()));
                }
                if let Some(rewrite) = &file.rewrite {
                    if !rewrite.updated.is_empty() {
                        parts.push(format!("{} updated", rewrite.updated.len()));
                    }
                    if !rewrite.appended.is_empty() {
                        parts.push(format!("{} appended", rewrite.appended.len()));
                    }
                }
                if let Some(reconcile) = &file.reconcile
                    && !reconcile.missing_locally.is_empty()
                {
                    parts.push(format!("{} only in store", reconcile.missing_locally.len()));
                }
                if file.imported {
                    parts.push("imported".to_string());
                }
                let summary = if parts.is_empty() {
                    "up to date".to_string()
                } else {
                    parts.join(", ")
                };
                println!("✅ {} [{}]: {}", file.path.display(), file.language, summary);
            }
        }
    }
}

fn write_report(path: &Path, report: &SyncReport) -> Result<(), String> {
    validate_output_path(path)?;
    let text = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report JSON: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| format!("Failed to write report JSON '{}': {}", path.display(), e))
}

fn finish(settings: &Settings, report: &SyncReport) -> Result<(), String> {
    print_summary(report);
    if let Some(path) = &settings.report_json {
        write_report(path, report)?;
    }
    match report.failures() {
        0 => Ok(()),
        n => Err(format!("{} file(s) failed", n)),
    }
}
