//! Fetch-then-render tests driving the command helpers with scripted
//! Overpass responses.

use super::*;
use crate::fetch::{FetchConfig, fetch_and_store};
use crate::render::{RenderConfig, render_cached};
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;
use wayfetch_core::test_support::{RecordingSleeper, ScriptedService};
use wayfetch_core::{
    Node, QueryResult, RegionQueryService, RemoteError, ResilientQueryExecutor, RetryPolicy,
    RoadClass, Tags, Way,
};
use wayfetch_data::{CacheError, cache};

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    Workspace { _dir: dir, root }
}

fn krakow() -> BoundingRegion {
    BoundingRegion::new(19.98687, 19.9903, 50.0885, 50.0904).expect("valid region")
}

fn resolved_response() -> QueryResult {
    let mut result = QueryResult {
        ways: vec![Way {
            id: 1,
            node_ids: vec![11, 12],
            tags: Tags::from([("highway".to_owned(), "residential".to_owned())]),
        }],
        ..QueryResult::default()
    };
    result.insert_nodes([
        Node::untagged(11, 19.987, 50.089),
        Node::untagged(12, 19.989, 50.090),
    ]);
    result
}

fn fetch_config(workspace: &Workspace, map: Option<Utf8PathBuf>) -> FetchConfig {
    FetchConfig {
        region: krakow(),
        road_class: RoadClass::Car,
        cache: workspace.path("cache/roads.wfrc"),
        endpoint: "http://overpass.test/api/interpreter".to_owned(),
        policy: RetryPolicy::classic(),
        map,
        open: false,
    }
}

#[rstest]
fn fetch_writes_cache_and_map(workspace: Workspace) {
    let config = fetch_config(&workspace, Some(workspace.path("map.html")));
    let scripted = ScriptedService::new().then_ok(resolved_response());
    let service = RegionQueryService::new(
        ResilientQueryExecutor::new(&scripted)
            .with_policy(config.policy.clone())
            .with_sleeper(RecordingSleeper::default()),
    );

    let fetched = fetch_and_store(&config, &service).expect("fetch succeeds");

    let cached = cache::load(config.cache.as_std_path()).expect("cache written");
    assert_eq!(cached, fetched);
    let html = fs::read_to_string(workspace.path("map.html")).expect("map written");
    assert!(html.contains("\"LineString\""));
}

#[rstest]
fn failed_fetch_leaves_no_cache(workspace: Workspace) {
    let config = fetch_config(&workspace, None);
    let scripted = ScriptedService::new().then_err(RemoteError::Http {
        url: config.endpoint.clone(),
        status: 400,
        message: "bad query".to_owned(),
    });
    let service = RegionQueryService::new(
        ResilientQueryExecutor::new(&scripted)
            .with_policy(config.policy.clone())
            .with_sleeper(RecordingSleeper::default()),
    );

    let err = fetch_and_store(&config, &service).expect_err("fatal remote error");

    assert!(matches!(err, CliError::Fetch(_)), "found {err:?}");
    assert!(!config.cache.exists());
}

#[rstest]
fn render_reads_the_cache_without_touching_it(workspace: Workspace) {
    let config = fetch_config(&workspace, None);
    let scripted = ScriptedService::new().then_ok(resolved_response());
    let service = RegionQueryService::new(
        ResilientQueryExecutor::new(&scripted).with_sleeper(RecordingSleeper::default()),
    );
    fetch_and_store(&config, &service).expect("fetch succeeds");
    let before = fs::read(&config.cache).expect("read cache");

    let render = RenderConfig {
        region: krakow(),
        cache: config.cache.clone(),
        output: workspace.path("render.html"),
        open: false,
    };
    render_cached(&render).expect("render succeeds");

    assert!(render.output.is_file());
    assert_eq!(fs::read(&config.cache).expect("read cache"), before);
}

#[rstest]
fn render_reports_missing_cache(workspace: Workspace) {
    let render = RenderConfig {
        region: krakow(),
        cache: workspace.path("absent.wfrc"),
        output: workspace.path("render.html"),
        open: false,
    };
    let err = render_cached(&render).expect_err("missing cache");
    assert!(
        matches!(err, CliError::Cache(CacheError::Io { .. })),
        "found {err:?}"
    );
    assert!(!render.output.exists());
}
