//! Exporting and importing XLIFF documents through the platform build tool.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::info;

use crate::error::Error;

/// Produces XLIFF documents from a project and feeds translated ones back.
pub trait BuildTool {
    /// Exports one document per language into `out_dir` and returns their paths.
    fn export_localizations(
        &self,
        project: &Path,
        languages: &[String],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, Error>;

    /// Imports a translated document into the project.
    fn import_localization(&self, project: &Path, document: &Path) -> Result<(), Error>;
}

/// Where an export leaves the document of `language`:
/// `<out_dir>/<language>.xcloc/Localized Contents/<language>.xliff`.
pub fn exported_document_path(out_dir: &Path, language: &str) -> PathBuf {
    out_dir
        .join(format!("{}.xcloc", language))
        .join("Localized Contents")
        .join(format!("{}.xliff", language))
}

/// Runs `xcodebuild -exportLocalizations` / `-importLocalizations`.
#[derive(Debug, Clone)]
pub struct Xcodebuild {
    program: PathBuf,
}

impl Default for Xcodebuild {
    fn default() -> Self {
        Xcodebuild {
            program: PathBuf::from("xcodebuild"),
        }
    }
}

impl Xcodebuild {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses another executable with the same command line interface.
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Xcodebuild {
            program: program.into(),
        }
    }

    fn run(&self, args: &[OsString]) -> Result<String, Error> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| {
                Error::BuildTool(format!("failed to run {}: {}", self.program.display(), e))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::BuildTool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// The `(major, minor)` version reported by `-version`.
    pub fn version(&self) -> Result<(u32, u32), Error> {
        let out = self.run(&["-version".into()])?;
        parse_version(&out)
            .ok_or_else(|| Error::BuildTool(format!("unrecognized version output `{}`", out.trim())))
    }

    /// Whether the development language itself can be exported and
    /// imported (Xcode 10.2 and later).
    pub fn supports_development_language(&self) -> bool {
        self.version().is_ok_and(|v| v >= (10, 2))
    }
}

/// Parses the first line of `xcodebuild -version`, e.g. `Xcode 15.4`.
fn parse_version(output: &str) -> Option<(u32, u32)> {
    let version = output.lines().next()?.split_whitespace().nth(1)?;
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |m| m.parse().ok())?;
    Some((major, minor))
}

impl BuildTool for Xcodebuild {
    fn export_localizations(
        &self,
        project: &Path,
        languages: &[String],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut args: Vec<OsString> = vec![
            "-exportLocalizations".into(),
            "-localizationPath".into(),
            out_dir.into(),
            "-project".into(),
            project.into(),
        ];
        for language in languages {
            args.push("-exportLanguage".into());
            args.push(language.into());
        }
        info!(
            project = %project.display(),
            languages = %languages.join(", "),
            out_dir = %out_dir.display(),
            "exporting localizations"
        );
        self.run(&args)?;
        Ok(languages
            .iter()
            .map(|language| exported_document_path(out_dir, language))
            .collect())
    }

    fn import_localization(&self, project: &Path, document: &Path) -> Result<(), Error> {
        info!(
            project = %project.display(),
            document = %document.display(),
            "importing localization"
        );
        self.run(&[
            "-importLocalizations".into(),
            "-localizationPath".into(),
            document.into(),
            "-project".into(),
            project.into(),
        ])?;
        Ok(())
    }
}
