use indoc::indoc;
use locsync::formats::{AndroidStringsDocument, FormatType};
use locsync::store::Row;
use locsync::{
    BuiltinLanguageNames, CsvStore, Document, GroupKey, Language, LanguagePair, LocalizationFile,
    MemoryStore, Operation, RemoteSnapshot, RemoteStore, RewriteOptions, SyncOptions, SyncSession,
    reconcile, rewrite_file,
};
use std::fs;
use std::path::{Path, PathBuf};

const MARKER: &str = "IMPORTED FROM REMOTE TRANSLATIONS";

fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn french() -> LanguagePair {
    let names = BuiltinLanguageNames;
    LanguagePair::new(Language::new("en", &names), Language::new("fr", &names))
}

fn load_pair(dev: &Path, target: &Path) -> (LocalizationFile, LocalizationFile) {
    let names = BuiltinLanguageNames;
    let source = LocalizationFile::load(dev, "en", &names).unwrap();
    let mut file = LocalizationFile::load(target, "en", &names).unwrap();
    assert!(file.update_source_language(&source).is_empty());
    (source, file)
}

fn snapshot_from(store: &MemoryStore, file: &LocalizationFile) -> RemoteSnapshot {
    RemoteSnapshot::fetch(store, file).unwrap()
}

#[test]
fn untranslated_string_is_reported_but_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        r#"<resources><string name="hello">Hi</string></resources>"#,
    );
    let target_text = "<resources>\n</resources>\n";
    let target = write(dir.path(), "res/values-fr/strings.xml", target_text);

    let (_, mut file) = load_pair(&dev, &target);
    let store = MemoryStore::new();
    let snapshot = snapshot_from(&store, &file);
    let report = reconcile(&mut file, &snapshot);
    assert!(!report.has_changes());

    assert_eq!(file.untranslated.len(), 1);
    let missing = &file.untranslated[0];
    assert_eq!(missing.identifier(), "hello");
    assert_eq!(missing.source_text.as_deref(), Some("Hi"));
    assert_eq!(missing.target_text, "");

    let outcome = rewrite_file(&file, &RewriteOptions::default()).unwrap();
    assert!(!outcome.written);
    assert!(!outcome.marker);
    assert_eq!(fs::read_to_string(&target).unwrap(), target_text);
}

#[test]
fn remote_translation_is_appended_after_one_marker() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        r#"<resources><string name="hello">Hi</string></resources>"#,
    );
    let target = write(dir.path(), "res/values-fr/strings.xml", "<resources>\n</resources>\n");

    let (_, mut file) = load_pair(&dev, &target);
    let mut store = MemoryStore::new();
    store.insert_row(
        &GroupKey::new(FormatType::AndroidStrings, &french()),
        Row::from([
            ("String ID".to_string(), "hello".to_string()),
            ("Target: fr".to_string(), "Bonjour".to_string()),
        ]),
    );

    let snapshot = snapshot_from(&store, &file);
    let report = reconcile(&mut file, &snapshot);
    assert_eq!(report.changed, vec!["hello"]);
    assert_eq!(file.untranslated[0].target_text, "Bonjour");
    assert!(file.untranslated[0].is_translated());

    let outcome = rewrite_file(&file, &RewriteOptions::default()).unwrap();
    assert!(outcome.marker);
    assert_eq!(outcome.appended, vec!["hello"]);

    let written = fs::read_to_string(&target).unwrap();
    assert_eq!(written.matches(MARKER).count(), 1);
    let marker_at = written.find(MARKER).unwrap();
    let node_at = written.find(r#"<string name="hello">Bonjour</string>"#).unwrap();
    assert!(marker_at < node_at);

    // A second pass finds the node in place and leaves the file alone.
    let (_, mut again) = load_pair(&dev, &target);
    assert!(again.untranslated.is_empty());
    let snapshot = snapshot_from(&store, &again);
    reconcile(&mut again, &snapshot);
    let outcome = rewrite_file(&again, &RewriteOptions::default()).unwrap();
    assert!(!outcome.written);
    assert_eq!(fs::read_to_string(&target).unwrap(), written);
}

#[test]
fn empty_remote_value_keeps_local_translation() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        r#"<resources><string name="greeting">Hello</string></resources>"#,
    );
    let content = r#"<resources><string name="greeting">Salut</string></resources>"#;
    let target = write(dir.path(), "res/values-fr/strings.xml", content);

    let (_, mut file) = load_pair(&dev, &target);
    let mut store = MemoryStore::new();
    store.insert_row(
        &GroupKey::for_file(&file),
        Row::from([
            ("String ID".to_string(), "greeting".to_string()),
            ("Target: French".to_string(), String::new()),
        ]),
    );

    let snapshot = snapshot_from(&store, &file);
    let report = reconcile(&mut file, &snapshot);
    assert_eq!(file.units[0].target_text, "Salut");
    assert_eq!(report.regressed, vec!["greeting"]);
    assert!(!rewrite_file(&file, &RewriteOptions::default()).unwrap().written);
    assert_eq!(fs::read_to_string(&target).unwrap(), content);
}

#[test]
fn rewrite_preserves_everything_outside_changed_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        indoc! {r#"
            <resources>
                <string name="title">Title</string>
                <string name="body">Body</string>
            </resources>
        "#},
    );
    let original = indoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <!-- Translators: keep it short -->
        <resources xmlns:tools="http://schemas.android.com/tools">

            <string name="title"  tools:ignore="MissingTranslation">Titre</string>
            <plurals name="items">
                <item quantity="one">%d élément</item>
            </plurals>
            <string name="body">Corps &amp; âme</string>
        </resources>
    "#};
    let target = write(dir.path(), "res/values-fr/strings.xml", original);

    let (_, mut file) = load_pair(&dev, &target);
    let mut store = MemoryStore::new();
    let group = GroupKey::for_file(&file);
    for (id, text) in [("title", "Titre"), ("body", "Corps & esprit")] {
        store.insert_row(
            &group,
            Row::from([
                ("String ID".to_string(), id.to_string()),
                ("Target: French".to_string(), text.to_string()),
            ]),
        );
    }

    let snapshot = snapshot_from(&store, &file);
    let report = reconcile(&mut file, &snapshot);
    assert_eq!(report.changed, vec!["body"]);
    let outcome = rewrite_file(&file, &RewriteOptions::default()).unwrap();
    assert_eq!(outcome.updated, vec!["body"]);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        original.replace("Corps &amp; âme", "Corps &amp; esprit")
    );
}

#[test]
fn document_read_from_returns_text_and_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "values-fr/strings.xml",
        r#"<resources><string name="a">\'A\'</string></resources>"#,
    );
    let (source, doc) = AndroidStringsDocument::read_from(&path).unwrap();
    assert!(!source.has_bom());
    assert_eq!(doc.nodes().len(), 1);
    assert_eq!(doc.escaping().decode(doc.nodes()[0].raw(&source.text)), "'A'");
}

#[test]
fn full_run_against_csv_store() {
    let dir = tempfile::tempdir().unwrap();
    let res = dir.path().join("res");
    let dev = write(
        &res,
        "values/strings.xml",
        indoc! {r#"
            <resources>
                <string name="hello">Hello</string>
                <string name="bye">Goodbye</string>
            </resources>
        "#},
    );
    let fr = write(
        &res,
        "values-fr/strings.xml",
        indoc! {r#"
            <resources>
                <string name="hello">Bonjour</string>
            </resources>
        "#},
    );
    let store_root = dir.path().join("store");
    let mut store = CsvStore::new(&store_root);
    let paths = [dev, fr.clone()];

    let export = SyncOptions {
        operation: Operation::Export,
        ..SyncOptions::default()
    };
    let report = SyncSession::new(&mut store, export)
        .run(&paths, &BuiltinLanguageNames)
        .unwrap();
    assert!(!report.has_failures());

    let table = store_root.join("French_localizations").join("android_strings.csv");
    let csv = fs::read_to_string(&table).unwrap();
    assert!(csv.starts_with("Source: English,Target: French,String ID\n"));
    assert!(csv.contains("Goodbye,,bye"));
    assert!(csv.contains("Hello,Bonjour,hello"));

    // A translator fills in the missing row.
    fs::write(&table, csv.replace("Goodbye,,bye", "Goodbye,Au revoir,bye")).unwrap();

    let import = SyncOptions {
        operation: Operation::Import,
        ..SyncOptions::default()
    };
    let report = SyncSession::new(&mut store, import)
        .run(&paths, &BuiltinLanguageNames)
        .unwrap();
    assert!(!report.has_failures());
    assert_eq!(
        fs::read_to_string(&fr).unwrap(),
        indoc! {r#"
            <resources>
                <string name="hello">Bonjour</string>
                <!-- IMPORTED FROM REMOTE TRANSLATIONS -->
                <string name="bye">Au revoir</string>
            </resources>
        "#}
    );

    let rows = store
        .get_records(&GroupKey::new(FormatType::AndroidStrings, &french()))
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn literal_backslash_from_remote_settles_after_one_write() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        r#"<resources><string name="a">x@y</string></resources>"#,
    );
    let target = write(
        dir.path(),
        "res/values-fr/strings.xml",
        r#"<resources><string name="a">x\@y</string></resources>"#,
    );
    let mut store = MemoryStore::new();
    store.insert_row(
        &GroupKey::new(FormatType::AndroidStrings, &french()),
        Row::from([
            ("String ID".to_string(), "a".to_string()),
            ("Target: fr".to_string(), "x\\@y".to_string()),
        ]),
    );

    let (_, mut file) = load_pair(&dev, &target);
    let snapshot = snapshot_from(&store, &file);
    let report = reconcile(&mut file, &snapshot);
    assert_eq!(report.changed, vec!["a"]);
    assert!(rewrite_file(&file, &RewriteOptions::default()).unwrap().written);
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains(r#"<string name="a">x\\@y</string>"#), "{}", written);

    let (_, mut again) = load_pair(&dev, &target);
    let snapshot = snapshot_from(&store, &again);
    let report = reconcile(&mut again, &snapshot);
    assert!(!report.has_changes());
    assert!(!rewrite_file(&again, &RewriteOptions::default()).unwrap().written);
}

#[test]
fn padded_value_keeps_its_quote_delimiters() {
    let dir = tempfile::tempdir().unwrap();
    let dev = write(
        dir.path(),
        "res/values/strings.xml",
        r#"<resources><string name="pad">"  Pad  "</string></resources>"#,
    );
    let target = write(
        dir.path(),
        "res/values-fr/strings.xml",
        r#"<resources><string name="pad">"  Rembourrage  "</string></resources>"#,
    );
    let (source, mut file) = load_pair(&dev, &target);
    assert_eq!(source.units[0].target_text, "  Pad  ");
    assert_eq!(file.units[0].target_text, "  Rembourrage  ");

    let mut store = MemoryStore::new();
    store.insert_row(
        &GroupKey::for_file(&file),
        Row::from([
            ("String ID".to_string(), "pad".to_string()),
            ("Target: French".to_string(), "  Marge  ".to_string()),
        ]),
    );
    let snapshot = snapshot_from(&store, &file);
    reconcile(&mut file, &snapshot);
    assert!(rewrite_file(&file, &RewriteOptions::default()).unwrap().written);
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        r#"<resources><string name="pad">"  Marge  "</string></resources>"#
    );
}
