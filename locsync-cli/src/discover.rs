use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

/// Android string resources: `strings.xml` (or `*-strings.xml`) inside a
/// `values*` folder.
pub const ANDROID_PATTERNS: &[&str] = &["**/values*/*strings.xml"];

/// .NET resources.
pub const RESX_PATTERNS: &[&str] = &["**/*.resx"];

fn build_set(patterns: &[&str]) -> Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| format!("Invalid glob pattern '{}': {}", pat, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| format!("Failed to build glob set: {}", e))
}

/// Walks `root` (honoring .gitignore files) and returns the files whose path
/// relative to `root` matches one of `patterns`, sorted.
pub fn find_files(root: &Path, patterns: &[&str]) -> Result<Vec<PathBuf>, String> {
    if !root.is_dir() {
        return Err(format!("Directory does not exist: {}", root.display()));
    }
    let set = build_set(patterns)?;
    let build_outputs = Glob::new("**/build/**")
        .map_err(|e| format!("Invalid glob pattern: {}", e))?
        .compile_matcher();

    let walker = WalkBuilder::new(root)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .hidden(false)
        .ignore(true)
        .parents(true)
        .build();

    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for dent in walker {
        let Ok(dent) = dent else { continue };
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = dent.path().strip_prefix(root).unwrap_or(dent.path());
        if build_outputs.is_match(rel) || !set.is_match(rel) {
            continue;
        }
        if seen.insert(dent.path().to_path_buf()) {
            found.push(dent.path().to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

pub fn android_string_files(res_dir: &Path) -> Result<Vec<PathBuf>, String> {
    find_files(res_dir, ANDROID_PATTERNS)
}

pub fn resx_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    find_files(dir, RESX_PATTERNS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<resources/>").unwrap();
    }

    #[test]
    fn test_finds_android_strings_in_values_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "values/strings.xml");
        touch(root, "values-fr/strings.xml");
        touch(root, "values-pt-rBR/module-strings.xml");
        touch(root, "values/colors.xml");
        touch(root, "layout/strings.xml");
        touch(root, "build/values/strings.xml");

        let found = android_string_files(root).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            rel,
            vec![
                "values/strings.xml",
                "values-fr/strings.xml",
                "values-pt-rBR/module-strings.xml",
            ]
        );
    }

    #[test]
    fn test_finds_resx_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Resources/Strings.resx");
        touch(dir.path(), "Resources/Strings.fr.resx");
        touch(dir.path(), "Resources/readme.txt");
        assert_eq!(resx_files(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = find_files(Path::new("/nonexistent/res"), ANDROID_PATTERNS).unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
