//! Render command implementation for the wayfetch CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfetch_core::BoundingRegion;
use wayfetch_data::{cache, write_map};

use crate::{
    ARG_CACHE, ARG_EAST, ARG_NORTH, ARG_OPEN, ARG_OUTPUT, ARG_SOUTH, ARG_WEST, CliError,
    RegionBounds, RegionEnv, open_in_browser,
};

pub(crate) const ENV_RENDER_CACHE: &str = "WAYFETCH_CMDS_RENDER_CACHE";
pub(crate) const ENV_RENDER_OUTPUT: &str = "WAYFETCH_CMDS_RENDER_OUTPUT";
pub(crate) const ENV_RENDER_REGION: RegionEnv = RegionEnv {
    west: "WAYFETCH_CMDS_RENDER_WEST",
    east: "WAYFETCH_CMDS_RENDER_EAST",
    south: "WAYFETCH_CMDS_RENDER_SOUTH",
    north: "WAYFETCH_CMDS_RENDER_NORTH",
};

/// CLI arguments for the `render` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "render",
    long_about = "Load a result cache written by `fetch` and draw its ways, \
                 nodes and the region outline on an interactive HTML map. \
                 No request is sent to the Overpass API.",
    about = "Render a cached result as an HTML map"
)]
#[ortho_config(prefix = "WAYFETCH")]
pub(crate) struct RenderArgs {
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
    /// Result cache written by `fetch`.
    #[arg(long = ARG_CACHE, value_name = "path")]
    #[serde(default)]
    pub(crate) cache: Option<Utf8PathBuf>,
    /// Destination of the HTML map.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Open the map in the default browser once written.
    #[arg(long = ARG_OPEN)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) open: bool,
}

impl RenderArgs {
    pub(crate) fn into_config(self) -> Result<RenderConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RenderConfig::try_from(merged)
    }
}

/// Resolved `render` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderConfig {
    /// Region outline and map centre.
    pub(crate) region: BoundingRegion,
    /// Result cache to read.
    pub(crate) cache: Utf8PathBuf,
    /// Destination of the HTML map.
    pub(crate) output: Utf8PathBuf,
    /// Whether to show the map in a browser after writing it.
    pub(crate) open: bool,
}

impl TryFrom<RenderArgs> for RenderConfig {
    type Error = CliError;

    fn try_from(args: RenderArgs) -> Result<Self, Self::Error> {
        let region = RegionBounds {
            west: args.west,
            east: args.east,
            south: args.south,
            north: args.north,
        }
        .into_region(&ENV_RENDER_REGION)?;
        let cache = args.cache.ok_or(CliError::MissingArgument {
            field: ARG_CACHE,
            env: ENV_RENDER_CACHE,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_RENDER_OUTPUT,
        })?;
        if output == cache {
            return Err(CliError::PathClash {
                first: ARG_CACHE,
                second: ARG_OUTPUT,
                path: cache,
            });
        }
        Ok(Self {
            region,
            cache,
            output,
            open: args.open,
        })
    }
}

pub(crate) fn run_render(args: RenderArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    render_cached(&config)?;
    if config.open {
        open_in_browser(&config.output);
    }
    Ok(())
}

/// Load the cache and write the map. The cache is never modified.
pub(crate) fn render_cached(config: &RenderConfig) -> Result<(), CliError> {
    let result = cache::load(config.cache.as_std_path())?;
    write_map(config.output.as_std_path(), config.region, &result)?;
    info!(
        "rendered {} ways from {} to {}",
        result.ways.len(),
        config.cache,
        config.output
    );
    Ok(())
}
