use std::collections::BTreeSet;
use std::path::Path;

use flate2::read::GzDecoder;
use portainer_deploy_build::context::{ARCHIVE_DIR, ARCHIVE_FILE};
use portainer_deploy_build::{BuildContext, FilterMode, collect_entries};
use proptest::prelude::*;
use tempfile::TempDir;

/// Lay out a small Node-style project.
fn init_project(dir: &Path) {
    std::fs::create_dir_all(dir.join("src/routes")).unwrap();
    std::fs::create_dir_all(dir.join("node_modules/left-pad")).unwrap();
    std::fs::write(dir.join("package.json"), r#"{"name":"app","version":"1.0.0"}"#).unwrap();
    std::fs::write(dir.join("Dockerfile"), "FROM node:20\nCOPY . .\n").unwrap();
    std::fs::write(dir.join("src/index.js"), "require('./routes')").unwrap();
    std::fs::write(dir.join("src/routes/index.js"), "module.exports = {}").unwrap();
    std::fs::write(dir.join("node_modules/left-pad/index.js"), "").unwrap();
    std::fs::write(dir.join(".env"), "SECRET=1").unwrap();
}

fn archive_paths(archive: &Path) -> BTreeSet<String> {
    let file = std::fs::File::open(archive).unwrap();
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.entries()
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_owned()
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// ── Entry collection ──

#[test]
fn collect_with_whitelist_returns_only_listed_entries() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    let white = strings(&["src", "package.json", "Dockerfile", "missing.txt"]);
    let mode = FilterMode::from_lists(Some(&white), None);

    let entries = collect_entries(tmp.path(), &mode).unwrap();

    assert_eq!(entries, strings(&["Dockerfile", "package.json", "src"]));
}

#[test]
fn collect_with_blacklist_drops_listed_entries() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    let black = strings(&["node_modules", ".env"]);
    let mode = FilterMode::from_lists(None, Some(&black));

    let entries = collect_entries(tmp.path(), &mode).unwrap();

    assert_eq!(entries, strings(&["Dockerfile", "package.json", "src"]));
}

#[test]
fn collect_without_lists_returns_everything_sorted() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let entries = collect_entries(tmp.path(), &FilterMode::from_lists(None, None)).unwrap();

    assert_eq!(
        entries,
        strings(&[".env", "Dockerfile", "node_modules", "package.json", "src"])
    );
}

#[test]
fn collect_missing_directory_errors() {
    let tmp = TempDir::new().unwrap();
    let result = collect_entries(&tmp.path().join("gone"), &FilterMode::from_lists(None, None));

    let err = result.unwrap_err().to_string();
    assert!(err.contains("failed to read directory"), "got: {err}");
}

// ── Archive ──

#[test]
fn create_writes_gzip_tar_under_dist() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let context =
        BuildContext::create(tmp.path(), &strings(&["Dockerfile", "package.json", "src"])).unwrap();

    assert_eq!(
        context.path(),
        tmp.path().join(ARCHIVE_DIR).join(ARCHIVE_FILE)
    );
    let paths = archive_paths(context.path());
    assert!(paths.contains("Dockerfile"));
    assert!(paths.contains("package.json"));
    assert!(paths.contains("src"));
    assert!(paths.contains("src/index.js"));
    assert!(paths.contains("src/routes/index.js"));
    assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
    assert!(!paths.contains(".env"));

    context.remove().unwrap();
}

#[test]
fn create_reuses_existing_dist_directory() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());
    std::fs::create_dir_all(tmp.path().join("dist")).unwrap();
    std::fs::write(tmp.path().join("dist/bundle.js"), "built").unwrap();

    let context = BuildContext::create(tmp.path(), &strings(&["dist"])).unwrap();

    let paths = archive_paths(context.path());
    assert!(paths.contains("dist/bundle.js"));
    assert!(
        !paths.contains(&format!("dist/{ARCHIVE_FILE}")),
        "archive must not contain itself: {paths:?}"
    );

    context.remove().unwrap();
    assert!(tmp.path().join("dist/bundle.js").exists());
}

#[test]
fn bytes_returns_gzip_data() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let context = BuildContext::create(tmp.path(), &strings(&["Dockerfile"])).unwrap();
    let bytes = context.bytes().unwrap();

    // gzip magic number
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    context.remove().unwrap();
}

#[test]
fn remove_deletes_archive() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let context = BuildContext::create(tmp.path(), &strings(&["src"])).unwrap();
    let path = context.path().to_path_buf();
    assert!(path.exists());

    context.remove().unwrap();
    assert!(!path.exists());
}

#[test]
fn drop_without_remove_cleans_up() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let path = {
        let context = BuildContext::create(tmp.path(), &strings(&["src"])).unwrap();
        context.path().to_path_buf()
    };

    assert!(!path.exists());
}

#[test]
fn create_with_missing_entry_fails_and_leaves_no_archive() {
    let tmp = TempDir::new().unwrap();
    init_project(tmp.path());

    let result = BuildContext::create(tmp.path(), &strings(&["src", "does-not-exist"]));

    let err = result.unwrap_err().to_string();
    assert!(err.contains("does-not-exist"), "got: {err}");
    assert!(!tmp.path().join(ARCHIVE_DIR).join(ARCHIVE_FILE).exists());
}

// ── Property-based tests ──

fn entry_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,11}"
}

fn names(max: usize) -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set(entry_name(), 0..=max)
}

fn populate(dir: &Path, files: &BTreeSet<String>) {
    for name in files {
        std::fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn whitelisted_collection_is_subset_of_whitelist(
        files in names(8),
        white in names(8),
        black in proptest::option::of(names(8)),
    ) {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path(), &files);
        let white: Vec<String> = white.into_iter().collect();
        let black: Option<Vec<String>> = black.map(|b| b.into_iter().collect());

        let mode = FilterMode::from_lists(Some(&white), black.as_deref());
        let entries = collect_entries(tmp.path(), &mode).unwrap();

        for entry in &entries {
            prop_assert!(white.contains(entry), "{} not in whitelist {:?}", entry, white);
        }
        let expected: Vec<&String> = files.iter().filter(|f| white.contains(f)).collect();
        prop_assert_eq!(entries.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn blacklisted_entries_never_collected(
        files in names(8),
        black in names(8),
    ) {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path(), &files);
        let black: Vec<String> = black.into_iter().collect();

        let mode = FilterMode::from_lists(None, Some(&black));
        let entries = collect_entries(tmp.path(), &mode).unwrap();

        for entry in &entries {
            prop_assert!(!black.contains(entry), "{} is blacklisted", entry);
        }
        let expected: Vec<&String> = files.iter().filter(|f| !black.contains(f)).collect();
        prop_assert_eq!(entries.iter().collect::<Vec<_>>(), expected);
    }
}
