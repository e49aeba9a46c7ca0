//! Fetch command implementation for the wayfetch CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfetch_core::{
    BoundingRegion, QueryService, RegionQueryService, ResilientQueryExecutor, ResolvedResult,
    RetryPolicy, RoadClass, Sleeper,
};
use wayfetch_data::{DEFAULT_ENDPOINT, OverpassClient, OverpassClientConfig, cache, write_map};

use crate::{
    ARG_CACHE, ARG_CLASSIC_RETRY, ARG_EAST, ARG_ENDPOINT, ARG_MAP, ARG_MAX_RETRIES, ARG_NORTH,
    ARG_OPEN, ARG_ROAD_CLASS, ARG_SOUTH, ARG_WEST, CliError, RegionBounds, RegionEnv,
    open_in_browser,
};

pub(crate) const ENV_FETCH_ROAD_CLASS: &str = "WAYFETCH_CMDS_FETCH_ROAD_CLASS";
pub(crate) const ENV_FETCH_CACHE: &str = "WAYFETCH_CMDS_FETCH_CACHE";
pub(crate) const ENV_FETCH_MAP: &str = "WAYFETCH_CMDS_FETCH_MAP";
pub(crate) const ENV_FETCH_REGION: RegionEnv = RegionEnv {
    west: "WAYFETCH_CMDS_FETCH_WEST",
    east: "WAYFETCH_CMDS_FETCH_EAST",
    south: "WAYFETCH_CMDS_FETCH_SOUTH",
    north: "WAYFETCH_CMDS_FETCH_NORTH",
};

/// CLI arguments for the `fetch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "fetch",
    long_about = "Query the Overpass API for the roads of one class inside a \
                 bounding box, resolve every way's node coordinates and save \
                 the result to a cache file. Options can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Fetch roads for a bounding box"
)]
#[ortho_config(prefix = "WAYFETCH")]
pub(crate) struct FetchArgs {
    /// Western longitude bound in degrees.
    #[arg(long = ARG_WEST, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) west: Option<f64>,
    /// Eastern longitude bound in degrees.
    #[arg(long = ARG_EAST, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) east: Option<f64>,
    /// Southern latitude bound in degrees.
    #[arg(long = ARG_SOUTH, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) south: Option<f64>,
    /// Northern latitude bound in degrees.
    #[arg(long = ARG_NORTH, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) north: Option<f64>,
    /// Road class to fetch: `car` or `bicycle`.
    #[arg(long = ARG_ROAD_CLASS, value_name = "class")]
    #[serde(default)]
    pub(crate) road_class: Option<RoadClass>,
    /// Destination of the result cache.
    #[arg(long = ARG_CACHE, value_name = "path")]
    #[serde(default)]
    pub(crate) cache: Option<Utf8PathBuf>,
    /// Overpass interpreter URL.
    #[arg(long = ARG_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    /// Give up after this many retries of one request.
    #[arg(long = ARG_MAX_RETRIES, value_name = "n")]
    #[serde(default)]
    pub(crate) max_retries: Option<u32>,
    /// Retry forever with fixed 1 s / 10 s pauses.
    #[arg(long = ARG_CLASSIC_RETRY)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) classic_retry: bool,
    /// Also render the result to this HTML file.
    #[arg(long = ARG_MAP, value_name = "path")]
    #[serde(default)]
    pub(crate) map: Option<Utf8PathBuf>,
    /// Open the rendered map in the default browser; needs `--map`.
    #[arg(long = ARG_OPEN)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) open: bool,
}

impl FetchArgs {
    pub(crate) fn into_config(self) -> Result<FetchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FetchConfig::try_from(merged)
    }
}

/// Resolved `fetch` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FetchConfig {
    /// Area to query.
    pub(crate) region: BoundingRegion,
    /// Road class selecting the query template.
    pub(crate) road_class: RoadClass,
    /// Destination of the result cache.
    pub(crate) cache: Utf8PathBuf,
    /// Overpass interpreter URL.
    pub(crate) endpoint: String,
    /// Retry behaviour for every request.
    pub(crate) policy: RetryPolicy,
    /// Optional HTML map output.
    pub(crate) map: Option<Utf8PathBuf>,
    /// Whether to show the map in a browser after writing it.
    pub(crate) open: bool,
}

impl TryFrom<FetchArgs> for FetchConfig {
    type Error = CliError;

    fn try_from(args: FetchArgs) -> Result<Self, Self::Error> {
        let region = RegionBounds {
            west: args.west,
            east: args.east,
            south: args.south,
            north: args.north,
        }
        .into_region(&ENV_FETCH_REGION)?;
        let road_class = args.road_class.ok_or(CliError::MissingArgument {
            field: ARG_ROAD_CLASS,
            env: ENV_FETCH_ROAD_CLASS,
        })?;
        let cache = args.cache.ok_or(CliError::MissingArgument {
            field: ARG_CACHE,
            env: ENV_FETCH_CACHE,
        })?;
        if args.open && args.map.is_none() {
            return Err(CliError::MissingArgument {
                field: ARG_MAP,
                env: ENV_FETCH_MAP,
            });
        }
        if let Some(map) = &args.map
            && *map == cache
        {
            return Err(CliError::PathClash {
                first: ARG_CACHE,
                second: ARG_MAP,
                path: cache,
            });
        }

        let base = if args.classic_retry {
            RetryPolicy::classic()
        } else {
            RetryPolicy::default()
        };
        let policy = match args.max_retries {
            Some(max) => base.with_max_retries(Some(max)),
            None => base,
        };

        Ok(Self {
            region,
            road_class,
            cache,
            endpoint: args
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            policy,
            map: args.map,
            open: args.open,
        })
    }
}

pub(crate) fn run_fetch(args: FetchArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let client = OverpassClient::with_config(OverpassClientConfig::new(config.endpoint.clone()))
        .map_err(|source| CliError::BuildClient {
            endpoint: config.endpoint.clone(),
            source,
        })?;
    let executor = ResilientQueryExecutor::new(client).with_policy(config.policy.clone());
    fetch_and_store(&config, &RegionQueryService::new(executor))?;
    if config.open
        && let Some(map) = &config.map
    {
        open_in_browser(map);
    }
    Ok(())
}

/// Fetch through `service`, then write the cache and the optional map.
///
/// Nothing is written when the fetch fails.
pub(crate) fn fetch_and_store<S, Z>(
    config: &FetchConfig,
    service: &RegionQueryService<S, Z>,
) -> Result<ResolvedResult, CliError>
where
    S: QueryService,
    Z: Sleeper,
{
    let result = service.fetch_ways(config.region, config.road_class)?;
    cache::save(config.cache.as_std_path(), &result)?;
    info!("saved {} ways to {}", result.ways.len(), config.cache);
    if let Some(map) = &config.map {
        write_map(map.as_std_path(), config.region, &result)?;
        info!("wrote map to {map}");
    }
    Ok(result)
}
