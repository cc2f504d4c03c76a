#![forbid(unsafe_code)]
//! Keeps localization files in sync with a tabular translation store.
//!
//! Files are loaded into [`TranslationUnit`]s, matched against a snapshot of
//! the remote table by identifier, and written back so only the strings whose
//! text changed are touched. Everything else in the file stays byte for byte.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use locsync::{BuiltinLanguageNames, CsvStore, Operation, SyncOptions, SyncSession};
//! use std::path::PathBuf;
//!
//! let mut store = CsvStore::new("translations");
//! let options = SyncOptions { operation: Operation::Sync, ..SyncOptions::default() };
//! let paths = vec![
//!     PathBuf::from("res/values/strings.xml"),
//!     PathBuf::from("res/values-fr/strings.xml"),
//! ];
//! let report = SyncSession::new(&mut store, options).run(&paths, &BuiltinLanguageNames)?;
//! println!("{} file(s) failed", report.failures());
//! # Ok::<(), locsync::Error>(())
//! ```
//!
//! # Supported Formats
//!
//! - **Android `strings.xml`**: `<string>` resources, language taken from the `values-*` folder
//! - **XLIFF 1.2**: documents exported by Xcode, source text carried per unit
//! - **.NET `.resx`**: `<data>` string resources, culture taken from the file name
//!
//! # Guarantees
//!
//! - A remote translation replaces the local one; an empty remote value never does.
//! - Strings missing from a translation are reported and filled once translated.
//! - Rewriting a file twice with the same units changes nothing the second time.

pub mod build_tool;
pub mod error;
pub mod escape;
pub mod file;
pub mod formats;
pub mod language;
pub mod reconcile;
pub mod rewrite;
pub mod store;
pub mod sync;
pub mod traits;
pub mod types;

pub use crate::{
    build_tool::{BuildTool, Xcodebuild},
    error::Error,
    escape::Escaping,
    file::LocalizationFile,
    formats::{FormatType, infer_format_from_extension},
    language::{BuiltinLanguageNames, Language, LanguageNames, LanguagePair},
    reconcile::{ReconcileReport, reconcile},
    rewrite::{RewriteOptions, RewriteOutcome, RewritePlan, rewrite_file},
    store::{CsvStore, GroupKey, MemoryStore, RemoteSnapshot, RemoteStore},
    sync::{FileReport, Operation, SyncOptions, SyncReport, SyncSession},
    traits::Document,
    types::{TranslationUnit, UnitKind},
};
