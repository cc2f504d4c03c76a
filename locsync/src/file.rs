//! Loading one physical localization file into translation units.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    error::Error,
    escape::signature,
    formats::{
        AndroidStringsDocument, FormatType, ResxDocument, SourceText, XliffDocument,
        infer_format_from_extension, infer_language_from_path,
    },
    language::{Language, LanguageNames, LanguagePair},
    traits::Document,
    types::TranslationUnit,
};

/// The units of one file plus the units it is missing relative to the
/// development language file.
#[derive(Debug)]
pub struct LocalizationFile {
    pub path: PathBuf,
    pub format: FormatType,
    pub languages: LanguagePair,
    /// Units in document order. Identifiers are unique.
    pub units: Vec<TranslationUnit>,
    /// Units of the development language file that this file lacks, with an
    /// empty target text. Filled by [`LocalizationFile::update_source_language`].
    pub untranslated: Vec<TranslationUnit>,
    /// Identifiers present but marked as not translatable.
    pub excluded: Vec<String>,
    /// Unit-level problems met while loading; the units concerned were skipped.
    pub issues: Vec<Error>,
}

impl LocalizationFile {
    /// Loads a file, inferring its format from the extension.
    ///
    /// `source_language` is the project's development language. Android and
    /// resx files take their target language from their location and fall
    /// back to it; XLIFF files declare both languages themselves.
    pub fn load<P: AsRef<Path>>(
        path: P,
        source_language: &str,
        names: &dyn LanguageNames,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = infer_format_from_extension(path)
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        Self::load_with_format(path, format, source_language, names)
    }

    pub fn load_with_format<P: AsRef<Path>>(
        path: P,
        format: FormatType,
        source_language: &str,
        names: &dyn LanguageNames,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = SourceText::read_from(path)?;
        let content = source.text.as_str();

        let (languages, units, excluded, issues) = match format {
            FormatType::AndroidStrings => {
                let mut doc = AndroidStringsDocument::parse(content)?;
                let languages = languages_from_path(path, format, source_language, names);
                let units = doc.units(content, &languages);
                (languages, units, doc.excluded().to_vec(), doc.take_issues())
            }
            FormatType::Resx => {
                let mut doc = ResxDocument::parse(content)?;
                let languages = languages_from_path(path, format, source_language, names);
                let units = doc.units(content, &languages);
                (languages, units, Vec::new(), doc.take_issues())
            }
            FormatType::Xliff => {
                let mut doc = XliffDocument::parse(content)?;
                let languages = doc.languages(names)?;
                let units = doc.units(content, &languages);
                (languages, units, Vec::new(), doc.take_issues())
            }
        };

        for issue in &issues {
            warn!(file = %path.display(), "{}", issue);
        }
        debug!(
            file = %path.display(),
            language = %languages.target,
            units = units.len(),
            "loaded"
        );

        Ok(LocalizationFile {
            path: path.to_path_buf(),
            format,
            languages,
            units,
            untranslated: Vec::new(),
            excluded,
            issues,
        })
    }

    /// Whether this is the development language file.
    pub fn is_source_language_file(&self) -> bool {
        self.languages.is_identity()
    }

    pub fn unit(&self, identifier: &str) -> Option<&TranslationUnit> {
        self.units.iter().find(|u| u.identifier() == identifier)
    }

    /// Fills in source texts from the development language file and collects
    /// the units this file lacks into `untranslated`.
    ///
    /// Returns one `NoSourceMatch` per local unit the source file does not
    /// know; those units keep an unknown source text. XLIFF units carry their
    /// own source text, so XLIFF files are left as they are.
    pub fn update_source_language(&mut self, source: &LocalizationFile) -> Vec<Error> {
        if self.format.carries_source_text() || self.is_source_language_file() {
            return Vec::new();
        }

        let source_texts: HashMap<&str, &TranslationUnit> = source
            .units
            .iter()
            .map(|u| (u.identifier(), u))
            .collect();

        let mut problems = Vec::new();
        for unit in &mut self.units {
            match source_texts.get(unit.identifier()) {
                Some(source_unit) => {
                    if unit.is_translated()
                        && signature(&unit.target_text) != signature(&source_unit.target_text)
                    {
                        warn!(
                            file = %self.path.display(),
                            id = unit.identifier(),
                            "placeholders differ from the development language"
                        );
                    }
                    unit.source_text = Some(source_unit.target_text.clone());
                }
                None => problems.push(Error::NoSourceMatch {
                    identifier: unit.identifier().to_string(),
                }),
            }
        }

        let present: HashSet<&str> = self
            .units
            .iter()
            .map(TranslationUnit::identifier)
            .chain(self.excluded.iter().map(String::as_str))
            .collect();
        self.untranslated = source
            .units
            .iter()
            .filter(|u| !present.contains(u.identifier()))
            .map(|u| {
                let mut missing = u.clone();
                missing.retarget(self.languages.target.clone());
                missing
            })
            .collect();

        for problem in &problems {
            warn!(file = %self.path.display(), "{}", problem);
        }
        debug!(
            file = %self.path.display(),
            untranslated = self.untranslated.len(),
            "compared against development language file"
        );
        problems
    }

    /// Every unit the rewriter may write: the file's own units followed by
    /// the untranslated ones.
    pub fn all_units(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.units.iter().chain(self.untranslated.iter())
    }
}

fn languages_from_path(
    path: &Path,
    format: FormatType,
    source_language: &str,
    names: &dyn LanguageNames,
) -> LanguagePair {
    let target = infer_language_from_path(path, format).unwrap_or_else(|| source_language.to_string());
    LanguagePair::new(
        Language::new(source_language, names),
        Language::new(target, names),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::BuiltinLanguageNames;
    use std::fs;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_android_infers_language_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "res/values-pt-rBR/strings.xml",
            r#"<resources><string name="hello">Olá</string></resources>"#,
        );
        let file = LocalizationFile::load(&path, "en", &BuiltinLanguageNames).unwrap();
        assert_eq!(file.format, FormatType::AndroidStrings);
        assert_eq!(file.languages.target.code, "pt-BR");
        assert_eq!(file.languages.target.name, "Portuguese (BR)");
        assert!(!file.is_source_language_file());
        assert_eq!(file.unit("hello").unwrap().target_text, "Olá");
    }

    #[test]
    fn test_load_plain_values_is_source_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "res/values/strings.xml",
            r#"<resources><string name="hello">Hi</string></resources>"#,
        );
        let file = LocalizationFile::load(&path, "en", &BuiltinLanguageNames).unwrap();
        assert!(file.is_source_language_file());
        assert_eq!(file.units[0].source_text.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_unparseable_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "res/values-fr/strings.xml", "<resources><string");
        assert!(LocalizationFile::load(&path, "en", &BuiltinLanguageNames).is_err());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", "hello");
        assert!(matches!(
            LocalizationFile::load(&path, "en", &BuiltinLanguageNames),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_update_source_language_collects_untranslated() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = write(
            dir.path(),
            "res/values/strings.xml",
            r#"<resources>
    <string name="hello">Hi</string>
    <string name="bye">Bye</string>
    <string name="brand" translatable="false">Acme</string>
</resources>"#,
        );
        let target_path = write(
            dir.path(),
            "res/values-fr/strings.xml",
            r#"<resources>
    <string name="bye">Au revoir</string>
    <string name="orphan">Orphelin</string>
</resources>"#,
        );
        let names = BuiltinLanguageNames;
        let source = LocalizationFile::load(&source_path, "en", &names).unwrap();
        let mut target = LocalizationFile::load(&target_path, "en", &names).unwrap();

        let problems = target.update_source_language(&source);

        assert_eq!(target.unit("bye").unwrap().source_text.as_deref(), Some("Bye"));
        assert_eq!(target.unit("orphan").unwrap().source_text, None);
        assert_eq!(problems.len(), 1);
        assert!(matches!(&problems[0], Error::NoSourceMatch { identifier } if identifier == "orphan"));

        assert_eq!(target.untranslated.len(), 1);
        let hello = &target.untranslated[0];
        assert_eq!(hello.identifier(), "hello");
        assert_eq!(hello.source_text.as_deref(), Some("Hi"));
        assert_eq!(hello.target_text, "");
        assert_eq!(hello.languages.target.code, "fr");
    }

    #[test]
    fn test_xliff_has_no_untranslated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "fr.xliff",
            r#"<xliff version="1.2"><file original="a" source-language="en" target-language="fr"><body>
<trans-unit id="a"><source>A</source></trans-unit>
</body></file></xliff>"#,
        );
        let names = BuiltinLanguageNames;
        let mut file = LocalizationFile::load(&path, "en", &names).unwrap();
        let source = LocalizationFile::load(&path, "en", &names).unwrap();
        assert!(file.update_source_language(&source).is_empty());
        assert!(file.untranslated.is_empty());
        assert_eq!(file.units[0].source_text.as_deref(), Some("A"));
    }

    #[test]
    fn test_recoverable_issues_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "res/values-de/strings.xml",
            r#"<resources><string>nameless</string><string name="ok">Gut</string></resources>"#,
        );
        let file = LocalizationFile::load(&path, "en", &BuiltinLanguageNames).unwrap();
        assert_eq!(file.units.len(), 1);
        assert_eq!(file.issues.len(), 1);
        assert!(file.issues[0].is_recoverable());
    }
}
