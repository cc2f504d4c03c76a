use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("File does not exist: {}", path.display()));
    }

    if !path.metadata().map(|m| m.is_file()).unwrap_or(false) {
        return Err(format!("Path is not a file: {}", path.display()));
    }

    Ok(())
}

/// Validate a directory exists
pub fn validate_dir_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", path.display()));
    }

    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", path.display()));
    }

    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_dir(path: &Path) -> Result<(), String> {
    if path.exists() && !path.is_dir() {
        return Err(format!("Output path is not a directory: {}", path.display()));
    }
    std::fs::create_dir_all(path).map_err(|e| format!("Cannot create output directory: {}", e))
}

/// Validate the parent directory of an output file exists or can be created
pub fn validate_output_path(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Cannot create output directory: {}", e))?;
    }
    Ok(())
}

/// Validate language code format using unic-langid (same as lib crate)
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    match lang.replace('_', "-").parse::<LanguageIdentifier>() {
        Ok(lang_id) if lang_id.language.as_str() != "und" => Ok(()),
        _ => Err(format!(
            "Invalid language code format: {}. Expected valid BCP 47 language identifier",
            lang
        )),
    }
}

/// Validate every code of a language list, rejecting duplicates.
pub fn validate_language_list(languages: &[String]) -> Result<(), String> {
    if languages.is_empty() {
        return Err("At least one language is required".to_string());
    }
    for (i, lang) in languages.iter().enumerate() {
        validate_language_code(lang)?;
        if languages[..i].contains(lang) {
            return Err(format!("Language listed twice: {}", lang));
        }
    }
    Ok(())
}
