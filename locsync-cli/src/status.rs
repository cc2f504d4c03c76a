use std::path::Path;

use locsync::{BuiltinLanguageNames, LocalizationFile, TranslationUnit};

use crate::validation::{validate_file_path, validate_language_code};

const PREVIEW_CHARS: usize = 50;

fn preview(value: &str, full: bool) -> String {
    if full || value.chars().count() <= PREVIEW_CHARS {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    }
}

fn print_unit(unit: &TranslationUnit, full: bool) {
    let state = if unit.is_translated() {
        "translated"
    } else {
        "untranslated"
    };
    println!("  {} [{}]", unit.identifier(), state);
    if let Some(source) = &unit.source_text {
        println!("    Source: {}", preview(source, full));
    }
    if unit.is_translated() {
        println!("    Target: {}", preview(&unit.target_text, full));
    }
    if !unit.notes.is_empty() {
        println!("    Notes: {}", unit.notes_text());
    }
}

/// Prints the units of one file and their translation state. With `source`,
/// the development language file, the strings the file lacks are listed too.
pub fn print_status(
    file: &Path,
    source: Option<&Path>,
    dev_language: &str,
    full: bool,
) -> Result<(), String> {
    validate_file_path(file)?;
    validate_language_code(dev_language)?;
    let names = BuiltinLanguageNames;
    let mut loaded =
        LocalizationFile::load(file, dev_language, &names).map_err(|e| e.to_string())?;

    let mut problems = Vec::new();
    if let Some(source) = source {
        validate_file_path(source)?;
        let source =
            LocalizationFile::load(source, dev_language, &names).map_err(|e| e.to_string())?;
        problems = loaded.update_source_language(&source);
    }

    println!("File: {}", loaded.path.display());
    println!("Format: {}", loaded.format);
    println!(
        "Languages: {} -> {}",
        loaded.languages.source, loaded.languages.target
    );
    let translated = loaded.units.iter().filter(|u| u.is_translated()).count();
    println!("Units: {} ({} translated)", loaded.units.len(), translated);

    for unit in &loaded.units {
        print_unit(unit, full);
    }
    if !loaded.untranslated.is_empty() {
        println!("\nMissing from this file: {}", loaded.untranslated.len());
        for unit in &loaded.untranslated {
            print_unit(unit, full);
        }
    }
    if !loaded.excluded.is_empty() {
        println!("\nNot translatable: {}", loaded.excluded.join(", "));
    }
    if !loaded.issues.is_empty() || !problems.is_empty() {
        println!("\nIssues:");
        for issue in loaded.issues.iter().chain(problems.iter()) {
            println!("  ⚠️  {}", issue);
        }
    }
    Ok(())
}
