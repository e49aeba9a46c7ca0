//! Behavioural tests for the fetch, cache and reload pipeline.
//!
//! Overpass responses are decoded from JSON fixtures and replayed through
//! [`ScriptedService`], so no network access is needed. Backoff pauses are
//! recorded by [`RecordingSleeper`] instead of slept.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wayfetch_core::test_support::{RecordingSleeper, ScriptedService};
use wayfetch_core::{
    BoundingRegion, ExecuteError, QueryResult, RegionQueryService, RemoteError,
    ResilientQueryExecutor, ResolvedResult, RetryPolicy, RoadClass,
};
use wayfetch_data::{CacheError, cache, decode_response};

const ENDPOINT: &str = "http://overpass.test/api/interpreter";

const WAYS_WITH_NODES: &str = r#"{"elements": [
    {"type": "way", "id": 1, "nodes": [11, 12, 13], "tags": {"highway": "primary"}},
    {"type": "way", "id": 2, "nodes": [21, 22, 23, 24, 25], "tags": {"highway": "residential"}},
    {"type": "node", "id": 11, "lat": 50.0886, "lon": 19.9870},
    {"type": "node", "id": 12, "lat": 50.0890, "lon": 19.9880},
    {"type": "node", "id": 13, "lat": 50.0895, "lon": 19.9890},
    {"type": "node", "id": 21, "lat": 50.0900, "lon": 19.9870},
    {"type": "node", "id": 22, "lat": 50.0900, "lon": 19.9875},
    {"type": "node", "id": 23, "lat": 50.0901, "lon": 19.9880},
    {"type": "node", "id": 24, "lat": 50.0902, "lon": 19.9885},
    {"type": "node", "id": 25, "lat": 50.0903, "lon": 19.9890}
]}"#;

const WAYS_ONLY: &str = r#"{"elements": [
    {"type": "way", "id": 1, "nodes": [11, 12, 13], "tags": {"highway": "primary"}},
    {"type": "way", "id": 2, "nodes": [21, 22, 23, 24, 25], "tags": {"highway": "residential"}}
]}"#;

const FIRST_WAY_NODES: &str = r#"{"elements": [
    {"type": "node", "id": 11, "lat": 50.0886, "lon": 19.9870},
    {"type": "node", "id": 12, "lat": 50.0890, "lon": 19.9880},
    {"type": "node", "id": 13, "lat": 50.0895, "lon": 19.9890}
]}"#;

const SECOND_WAY_NODES: &str = r#"{"elements": [
    {"type": "node", "id": 21, "lat": 50.0900, "lon": 19.9870},
    {"type": "node", "id": 22, "lat": 50.0900, "lon": 19.9875},
    {"type": "node", "id": 23, "lat": 50.0901, "lon": 19.9880},
    {"type": "node", "id": 24, "lat": 50.0902, "lon": 19.9885},
    {"type": "node", "id": 25, "lat": 50.0903, "lon": 19.9890}
]}"#;

/// World state shared by the pipeline steps.
#[derive(Debug)]
struct PipelineWorld {
    region: BoundingRegion,
    service: RefCell<ScriptedService>,
    sleeper: RecordingSleeper,
    policy: RefCell<RetryPolicy>,
    fetched: RefCell<Option<Result<ResolvedResult, ExecuteError>>>,
    loaded: RefCell<Option<Result<ResolvedResult, CacheError>>>,
    cache_dir: TempDir,
}

impl PipelineWorld {
    fn cache_path(&self) -> PathBuf {
        self.cache_dir.path().join("roads.wfrc")
    }

    fn script(&self, script: impl FnOnce(ScriptedService) -> ScriptedService) {
        let current = self.service.take();
        self.service.replace(script(current));
    }

    fn fetched_result(&self) -> ResolvedResult {
        self.fetched
            .borrow()
            .as_ref()
            .expect("a fetch should have run")
            .as_ref()
            .expect("fetch should succeed")
            .clone()
    }

    fn fetch_error(&self) -> String {
        match self.fetched.borrow().as_ref().expect("a fetch should have run") {
            Ok(result) => panic!("expected fetch to fail, got {result:?}"),
            Err(err) => format!("{err:?}"),
        }
    }
}

#[fixture]
fn world() -> PipelineWorld {
    PipelineWorld {
        region: BoundingRegion::new(19.98687, 19.9903, 50.0885, 50.0904).expect("valid region"),
        service: RefCell::new(ScriptedService::new()),
        sleeper: RecordingSleeper::default(),
        policy: RefCell::new(RetryPolicy::classic()),
        fetched: RefCell::new(None),
        loaded: RefCell::new(None),
        cache_dir: TempDir::new().expect("create temp dir"),
    }
}

fn response(body: &str) -> QueryResult {
    decode_response(body).expect("fixture should decode")
}

fn rate_limited() -> RemoteError {
    RemoteError::TooManyRequests {
        url: ENDPOINT.to_owned(),
    }
}

// --- Given steps ---

#[given("an Overpass service returning two car ways with their nodes")]
fn service_with_nodes(world: &PipelineWorld) {
    world.script(|service| service.then_ok(response(WAYS_WITH_NODES)));
}

#[given("an Overpass service that rate limits once before answering")]
fn service_rate_limited_once(world: &PipelineWorld) {
    world.script(|service| {
        service
            .then_err(rate_limited())
            .then_ok(response(WAYS_WITH_NODES))
    });
}

#[given("an Overpass service that times out twice before answering")]
fn service_gateway_timeouts(world: &PipelineWorld) {
    let timeout = RemoteError::GatewayTimeout {
        url: ENDPOINT.to_owned(),
    };
    world.script(|service| {
        service
            .fail_times(2, &timeout)
            .then_ok(response(WAYS_WITH_NODES))
    });
}

#[given("an Overpass service returning ways without their nodes")]
fn service_without_nodes(world: &PipelineWorld) {
    world.script(|service| {
        service
            .then_ok(response(WAYS_ONLY))
            .then_ok(response(FIRST_WAY_NODES))
            .then_ok(response(SECOND_WAY_NODES))
    });
}

#[given("an Overpass service rejecting the query")]
fn service_rejecting(world: &PipelineWorld) {
    world.script(|service| {
        service.then_err(RemoteError::Http {
            url: ENDPOINT.to_owned(),
            status: 400,
            message: "Error: line 1: parse error".to_owned(),
        })
    });
}

#[given("an Overpass service that keeps rate limiting")]
fn service_always_rate_limited(world: &PipelineWorld) {
    world.script(|service| service.fail_times(10, &rate_limited()));
}

#[given("a retry budget of two retries")]
fn retry_budget(world: &PipelineWorld) {
    let bounded = world.policy.borrow().clone().with_max_retries(Some(2));
    world.policy.replace(bounded);
}

// --- When steps ---

#[when("I fetch car roads")]
fn fetch_car_roads(world: &PipelineWorld) {
    let service = world.service.borrow();
    let executor = ResilientQueryExecutor::new(&*service)
        .with_policy(world.policy.borrow().clone())
        .with_sleeper(&world.sleeper);
    let outcome = RegionQueryService::new(executor).fetch_ways(world.region, RoadClass::Car);
    world.fetched.replace(Some(outcome));
}

#[when("I save the result to the cache")]
fn save_cache(world: &PipelineWorld) {
    cache::save(&world.cache_path(), &world.fetched_result()).expect("save cache");
}

#[when("I load the cache")]
fn load_cache(world: &PipelineWorld) {
    world.loaded.replace(Some(cache::load(&world.cache_path())));
}

// --- Then steps ---

#[then("two ways with 3 and 5 nodes are returned")]
fn two_ways_returned(world: &PipelineWorld) {
    assert_eq!(world.fetched_result().node_counts(), vec![3, 5]);
}

#[then("exactly one query was sent")]
fn one_query_sent(world: &PipelineWorld) {
    assert_eq!(world.service.borrow().queries().len(), 1);
}

#[then("no query was sent")]
fn no_query_sent(world: &PipelineWorld) {
    assert!(world.service.borrow().queries().is_empty());
}

#[then("no pause was taken")]
fn no_pause(world: &PipelineWorld) {
    assert!(world.sleeper.pauses().is_empty());
}

#[then("a single one second pause was taken")]
fn one_second_pause(world: &PipelineWorld) {
    assert_eq!(world.sleeper.pauses(), vec![Duration::from_secs(1)]);
}

#[then("two ten second pauses were taken")]
fn two_ten_second_pauses(world: &PipelineWorld) {
    assert_eq!(
        world.sleeper.pauses(),
        vec![Duration::from_secs(10), Duration::from_secs(10)]
    );
}

#[then("one node lookup was sent per way")]
fn node_lookups_per_way(world: &PipelineWorld) {
    let queries = world.service.borrow().queries();
    assert_eq!(queries.len(), 3);
    assert_eq!(
        queries.get(1).map(String::as_str),
        Some("[out:json];(node(id:11,12,13););out body;")
    );
    assert_eq!(
        queries.get(2).map(String::as_str),
        Some("[out:json];(node(id:21,22,23,24,25););out body;")
    );
}

#[then("the fetch fails with a remote error")]
fn fails_with_remote_error(world: &PipelineWorld) {
    let error = world.fetch_error();
    assert!(error.starts_with("Remote(Http"), "unexpected error {error}");
}

#[then("the fetch fails after three attempts")]
fn fails_after_three_attempts(world: &PipelineWorld) {
    let fetched = world.fetched.borrow();
    assert!(
        matches!(
            fetched.as_ref(),
            Some(Err(ExecuteError::RetriesExhausted { attempts: 3, .. }))
        ),
        "expected RetriesExhausted after 3 attempts, got {fetched:?}"
    );
    assert_eq!(world.service.borrow().queries().len(), 3);
}

#[then("the loaded result equals the fetched result")]
fn loaded_equals_fetched(world: &PipelineWorld) {
    let loaded = world.loaded.borrow();
    let result = loaded
        .as_ref()
        .expect("cache should have been loaded")
        .as_ref()
        .expect("load should succeed");
    assert_eq!(*result, world.fetched_result());
}

#[then("loading fails with an I/O error")]
fn loading_fails(world: &PipelineWorld) {
    let loaded = world.loaded.borrow();
    assert!(
        matches!(loaded.as_ref(), Some(Err(CacheError::Io { .. }))),
        "expected CacheError::Io, got {loaded:?}"
    );
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/fetch_pipeline.feature", name = $title)]
        fn $fn_name(world: PipelineWorld) {
            let _ = world;
        }
    };
}

register_scenario!(
    fetching_pre_resolved_car_roads,
    "fetching car roads whose nodes arrive with the ways"
);
register_scenario!(recovering_from_rate_limit, "recovering from a rate limit");
register_scenario!(
    recovering_from_gateway_timeouts,
    "recovering from gateway timeouts"
);
register_scenario!(
    resolving_missing_nodes,
    "resolving missing nodes way by way"
);
register_scenario!(rejected_query_not_retried, "a rejected query is not retried");
register_scenario!(giving_up_after_budget, "giving up after the retry budget");
register_scenario!(
    reusing_cached_result,
    "reusing a fetched result from the cache"
);
register_scenario!(
    loading_missing_cache,
    "loading a cache that does not exist"
);
