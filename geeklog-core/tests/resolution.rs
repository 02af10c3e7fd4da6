//! Integration tests for document resolution and the metadata cache

use geeklog_core::{
    CacheBackend, CacheError, Config, MetadataStore, Mode, Page, ResolveError, Site,
};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn content_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn site(dir: &TempDir, backend: CacheBackend) -> Site {
    let mut config = Config::with_content_dir(dir.path());
    config.cache.backend = backend;
    Site::new(config)
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[test]
fn test_hello_document() {
    let dir = content_dir(&[("hello.txt", "title: Hello\ntags: a b\n\nWorld")]);
    let site = site(&dir, CacheBackend::Memory);

    let doc = site.resolve("hello").unwrap();
    assert_eq!(doc.title, "Hello");
    assert_eq!(doc.tags(), Some(&["a".to_string(), "b".to_string()][..]));
    assert!(doc.body.contains("World"));
    assert!(doc.body.starts_with("<p>"));
}

#[test]
fn test_link_chain_stops_at_depth_bound() {
    let mut files: Vec<(String, String)> = (0..12)
        .map(|i| (format!("c{i}.txt"), format!("title: C{i}\nlink: c{}\n\nbody {i}", i + 1)))
        .collect();
    files.push(("c12.txt".into(), "title: End\n\nend".into()));
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    let dir = content_dir(&refs);
    let site = site(&dir, CacheBackend::None);

    // max_link_depth defaults to 8
    let doc = site.resolve_metadata("c0").unwrap();
    assert_eq!(doc.name, "c8");
    assert_eq!(doc.meta.link_target(), Some("c9"));

    let doc = site.resolve_metadata("c5").unwrap();
    assert_eq!(doc.name, "c12");
    assert_eq!(doc.title, "End");
}

#[test]
fn test_self_link_terminates() {
    let dir = content_dir(&[("loop.txt", "title: Loop\nlink: loop\n\nround")]);
    let site = site(&dir, CacheBackend::Memory);

    let doc = site.resolve("loop").unwrap();
    assert_eq!(doc.name, "loop");
    assert!(doc.body.contains("round"));
}

#[test]
fn test_file_target() {
    let dir = content_dir(&[("note.html", "title: Note\n\n<p>hi</p>")]);
    let site = site(&dir, CacheBackend::None);

    let doc = site
        .resolve_file(&dir.path().join("note.html"), Mode::MetadataOnly)
        .unwrap();
    assert_eq!(doc.name, "note");
    assert_eq!(doc.body, "");

    assert!(matches!(
        site.resolve_file(&dir.path().join("gone.txt"), Mode::Full),
        Err(ResolveError::NotFound(_))
    ));
}

#[test]
fn test_cache_hit_matches_source() {
    let dir = content_dir(&[(
        "post.txt",
        "title: Post\nauthor: Ana\ntags: x y\ntimestamp: 1700000000\nmood: calm\n\nText",
    )]);
    let path = dir.path().join("post.txt");
    let past = SystemTime::now() - Duration::from_secs(3600);
    set_mtime(&path, past);

    let uncached = site(&dir, CacheBackend::None);
    let cached = site(&dir, CacheBackend::Sidecar);

    let from_source = uncached.resolve_metadata("post").unwrap();
    let first = cached.resolve_metadata("post").unwrap();
    assert_eq!(first, from_source);
    assert!(dir.path().join(".geeklog").join("post.txt.json").exists());

    // Only a cache hit can still report the old headers
    fs::write(&path, "title: Rewritten

Other").unwrap();
    set_mtime(&path, past);
    let second = cached.resolve_metadata("post").unwrap();
    assert_eq!(second, from_source);
    assert_eq!(uncached.resolve_metadata("post").unwrap().title, "Rewritten");
}

#[test]
fn test_cache_time_equal_to_mtime_is_fresh() {
    let dir = content_dir(&[("hello.txt", "title: Hello\n\nWorld")]);
    let path = dir.path().join("hello.txt");
    let site = site(&dir, CacheBackend::Memory);
    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");

    let cache_time = site.cache().unwrap().load(&path).unwrap().unwrap().cache_time;
    fs::write(&path, "title: Changed\n\nWorld").unwrap();
    set_mtime(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(cache_time as u64));

    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");
}

#[test]
fn test_cache_is_used_while_fresh_and_dropped_when_stale() {
    let dir = content_dir(&[("hello.txt", "title: Hello\n\nWorld")]);
    let path = dir.path().join("hello.txt");
    let past = SystemTime::now() - Duration::from_secs(3600);
    set_mtime(&path, past);

    let site = site(&dir, CacheBackend::Sidecar);
    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");

    // New contents under the old mtime: the projection is still trusted
    fs::write(&path, "title: Changed\n\nWorld").unwrap();
    set_mtime(&path, past);
    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");

    // Full resolution always reads the file
    assert_eq!(site.resolve("hello").unwrap().title, "Changed");

    // A newer mtime invalidates the projection
    set_mtime(&path, SystemTime::now() + Duration::from_secs(3600));
    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Changed");
}

#[test]
fn test_corrupt_cache_is_a_miss() {
    let dir = content_dir(&[("hello.txt", "title: Hello\n\nWorld")]);
    let site = site(&dir, CacheBackend::Sidecar);
    fs::write(dir.path().join(".geeklog").join("hello.txt.json"), "][").unwrap();

    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");
}

struct Unsupported;

impl MetadataStore for Unsupported {
    fn supported(&self, _content_dir: &Path) -> bool {
        false
    }

    fn get(&self, _file: &Path, _key: &str) -> Result<Option<String>, CacheError> {
        unreachable!("unsupported store is never read")
    }

    fn set(&self, _file: &Path, _key: &str, _value: &str) -> Result<(), CacheError> {
        unreachable!("unsupported store is never written")
    }
}

#[test]
fn test_unsupported_store_disables_caching() {
    let dir = content_dir(&[("hello.txt", "title: Hello\n\nWorld")]);
    let site = site(&dir, CacheBackend::None).with_store(Box::new(Unsupported));

    assert!(site.cache().is_none());
    assert_eq!(site.resolve_metadata("hello").unwrap().title, "Hello");
}

#[test]
fn test_not_found_page() {
    let dir = content_dir(&[("404.txt", "title: Not here\n\nTry the [[index]].")]);
    let site = site(&dir, CacheBackend::Memory);

    let page = site.render_page("missing");
    let doc = page.document().unwrap();
    assert_eq!(doc.title, "Not here");
    assert!(doc
        .body
        .contains("<span class=\"notfound\" data-href=\"index\">index</span>"));
}

#[test]
fn test_missing_not_found_document_yields_diagnostic() {
    let dir = content_dir(&[]);
    let mut config = Config::with_content_dir(dir.path());
    config.not_found = None;
    let site = Site::new(config);

    assert_eq!(
        site.render_page("missing"),
        Page::Diagnostic("<!-- document not found: missing -->\n".into())
    );
}

#[test]
fn test_date_display_fields() {
    let dir = content_dir(&[("dated.txt", "title: Dated\ntimestamp: 2021-03-12T10:00:00Z\n\n")]);
    let mut config = Config::with_content_dir(dir.path());
    config.cache.backend = CacheBackend::None;
    config.dates.timestamp_format = Some("%s".into());
    config.dates.timestamp_date_format = Some("%Y".into());
    let site = Site::new(config);

    let doc = site.resolve_metadata("dated").unwrap();
    assert_eq!(doc.display.timestamp_format, "1615543200");
    assert_eq!(doc.display.timestamp_date_format, "2021");

    let undated = content_dir(&[("plain.txt", "title: Plain\n\n")]);
    let doc = site_for(&undated).resolve_metadata("plain").unwrap();
    assert_eq!(doc.display.timestamp_format, "");
    assert!(!doc.display.mtime_format.is_empty());
}

fn site_for(dir: &TempDir) -> Site {
    site(dir, CacheBackend::None)
}
