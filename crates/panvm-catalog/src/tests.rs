use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use panvm_core::{
    Error, Release, ReleaseAsset, Result, RunArtifact, RunConclusion, ToolVersion, WorkflowRun,
};

use super::*;

#[derive(Clone, Default)]
struct CountingSource {
    releases: Vec<Release>,
    runs: Vec<WorkflowRun>,
    unreachable: bool,
    release_calls: Rc<Cell<usize>>,
}

impl ReleaseSource for CountingSource {
    fn list_releases(&self) -> Result<Vec<Release>> {
        self.release_calls.set(self.release_calls.get() + 1);
        if self.unreachable {
            return Err(Error::http("https://example.test/releases", "connection refused"));
        }
        Ok(self.releases.clone())
    }

    fn list_workflow_runs(&self) -> Result<Vec<WorkflowRun>> {
        Ok(self.runs.clone())
    }

    fn run_artifacts(&self, _run: &WorkflowRun) -> Result<Vec<RunArtifact>> {
        Ok(Vec::new())
    }
}

fn release(tag: &str) -> Release {
    Release {
        tag: tag.to_string(),
        assets: vec![ReleaseAsset {
            name: format!("pandoc-{tag}-linux-amd64.tar.gz"),
            download_url: format!("https://example.test/{tag}/pandoc-{tag}-linux-amd64.tar.gz"),
        }],
    }
}

fn run(id: u64, conclusion: RunConclusion) -> WorkflowRun {
    WorkflowRun {
        id,
        conclusion: Some(conclusion),
        head_sha: format!("sha{id}"),
        artifacts_url: format!("https://example.test/runs/{id}/artifacts"),
    }
}

fn v(text: &str) -> ToolVersion {
    ToolVersion::parse(text).expect("version must parse")
}

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "panvm-catalog-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&path).expect("must create test dir");
    path
}

#[test]
fn list_releases_preserves_source_order() {
    let source = CountingSource {
        releases: vec![release("3.1.2"), release("3.1.1"), release("2.19.2")],
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    let tags: Vec<&str> = catalog
        .list_releases()
        .expect("must list")
        .iter()
        .map(|release| release.tag.as_str())
        .collect();
    assert_eq!(tags, vec!["3.1.2", "3.1.1", "2.19.2"]);
}

#[test]
fn list_releases_is_memoized_after_first_fetch() {
    let calls = Rc::new(Cell::new(0));
    let source = CountingSource {
        releases: vec![release("3.1.2")],
        release_calls: Rc::clone(&calls),
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    catalog.list_releases().expect("first listing");
    catalog.list_releases().expect("second listing");
    catalog.latest().expect("latest");
    catalog.available_versions().expect("available");
    assert_eq!(calls.get(), 1);
}

#[test]
fn unreachable_source_is_catalog_unavailable() {
    let calls = Rc::new(Cell::new(0));
    let source = CountingSource {
        unreachable: true,
        release_calls: Rc::clone(&calls),
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    let err = catalog.list_releases().expect_err("must fail");
    assert!(matches!(err, Error::CatalogUnavailable { .. }));

    // failures are not memoized; the next call asks the source again
    let _ = catalog.list_releases();
    assert_eq!(calls.get(), 2);
}

#[test]
fn empty_listing_has_no_latest() {
    let catalog = ReleaseCatalog::new(CountingSource::default());
    let err = catalog.latest().expect_err("must fail");
    assert!(matches!(err, Error::CatalogUnavailable { .. }));
}

#[test]
fn available_versions_excludes_releases_below_floor() {
    let source = CountingSource {
        releases: vec![
            release("3.1.2"),
            release("2.0.3"),
            release("2.0.2"),
            release("1.19.2.1"),
            release("not-a-version"),
        ],
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    let versions = catalog.available_versions().expect("must list");
    assert_eq!(versions, vec![v("3.1.2"), v("2.0.3")]);
}

#[test]
fn find_matches_numeric_equality() {
    let source = CountingSource {
        releases: vec![release("2.12"), release("2.11.4")],
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    let found = catalog.find(&v("2.12.0")).expect("must search");
    assert_eq!(found.map(|release| release.tag.as_str()), Some("2.12"));
    assert!(catalog.find(&v("2.13")).expect("must search").is_none());
}

#[test]
fn snapshot_replaces_network_listing() {
    let dir = test_dir();
    let path = dir.join("releases.json");
    write_snapshot(&path, &[release("3.0"), release("2.19")]).expect("must write snapshot");

    let calls = Rc::new(Cell::new(0));
    let source = CountingSource {
        releases: vec![release("9.9")],
        release_calls: Rc::clone(&calls),
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source).with_snapshot(Some(path));

    assert_eq!(catalog.latest().expect("latest").tag, "3.0");
    catalog.list_releases().expect("second listing");
    assert_eq!(calls.get(), 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn snapshot_reader_accepts_bare_release_list() {
    let dir = test_dir();
    let path = dir.join("bare.json");
    fs::write(&path, r#"[{"tag":"3.1","assets":[]}]"#).expect("must write");

    let releases = read_snapshot(&path).expect("must read");
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag, "3.1");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_snapshot_reports_catalog_unavailable() {
    let dir = test_dir();
    let path = dir.join("broken.json");
    fs::write(&path, "{ not json").expect("must write");

    let catalog = ReleaseCatalog::new(CountingSource::default()).with_snapshot(Some(path));
    let err = catalog.list_releases().expect_err("must fail");
    assert!(matches!(err, Error::CatalogUnavailable { .. }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn snapshot_path_requires_existing_json_file() {
    let dir = test_dir();
    let json = dir.join("releases.json");
    let rds = dir.join("releases.rds");
    fs::write(&json, "[]").expect("must write");
    fs::write(&rds, "[]").expect("must write");

    assert_eq!(validate_snapshot_path(&json), Some(json.clone()));
    assert_eq!(validate_snapshot_path(&rds), None);
    assert_eq!(validate_snapshot_path(&dir.join("missing.json")), None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn successful_runs_filters_failures_and_keeps_order() {
    let source = CountingSource {
        runs: vec![
            run(5, RunConclusion::Failure),
            run(4, RunConclusion::Success),
            run(3, RunConclusion::Cancelled),
            run(2, RunConclusion::Success),
        ],
        ..CountingSource::default()
    };
    let catalog = ReleaseCatalog::new(source);

    let ids: Vec<u64> = catalog
        .successful_runs()
        .expect("must list")
        .iter()
        .map(|run| run.id)
        .collect();
    assert_eq!(ids, vec![4, 2]);
}

#[test]
fn minimum_supported_version_is_two_zero_three() {
    assert_eq!(minimum_supported_version(), v("2.0.3"));
}
