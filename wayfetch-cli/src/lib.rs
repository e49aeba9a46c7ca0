//! Command-line interface for fetching, caching and rendering road geometry.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use log::warn;
use wayfetch_core::BoundingRegion;

mod error;
mod fetch;
mod render;

pub use error::CliError;
use fetch::FetchArgs;
use render::RenderArgs;

pub(crate) const ARG_WEST: &str = "west";
pub(crate) const ARG_EAST: &str = "east";
pub(crate) const ARG_SOUTH: &str = "south";
pub(crate) const ARG_NORTH: &str = "north";
pub(crate) const ARG_ROAD_CLASS: &str = "road-class";
pub(crate) const ARG_CACHE: &str = "cache";
pub(crate) const ARG_ENDPOINT: &str = "endpoint";
pub(crate) const ARG_MAX_RETRIES: &str = "max-retries";
pub(crate) const ARG_CLASSIC_RETRY: &str = "classic-retry";
pub(crate) const ARG_MAP: &str = "map";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_OPEN: &str = "open";

/// Run the wayfetch CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration merging, the
/// fetch, the cache or the renderer fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Fetch(args) => fetch::run_fetch(args),
        Command::Render(args) => render::run_render(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wayfetch",
    about = "Fetch OpenStreetMap roads for a bounding box, cache them and draw them on a map",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query the Overpass API and save the resolved ways to a cache file.
    Fetch(FetchArgs),
    /// Draw a previously cached result on an HTML map.
    Render(RenderArgs),
}

/// Region bounds as they arrive from the merged configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegionBounds {
    pub(crate) west: Option<f64>,
    pub(crate) east: Option<f64>,
    pub(crate) south: Option<f64>,
    pub(crate) north: Option<f64>,
}

impl RegionBounds {
    /// Validate the bounds, naming the environment variable for any gap.
    pub(crate) fn into_region(self, env: &RegionEnv) -> Result<BoundingRegion, CliError> {
        let west = self.west.ok_or(CliError::MissingArgument {
            field: ARG_WEST,
            env: env.west,
        })?;
        let east = self.east.ok_or(CliError::MissingArgument {
            field: ARG_EAST,
            env: env.east,
        })?;
        let south = self.south.ok_or(CliError::MissingArgument {
            field: ARG_SOUTH,
            env: env.south,
        })?;
        let north = self.north.ok_or(CliError::MissingArgument {
            field: ARG_NORTH,
            env: env.north,
        })?;
        BoundingRegion::new(west, east, south, north).map_err(CliError::Region)
    }
}

/// Environment variable names carrying the region bounds of a subcommand.
#[derive(Debug)]
pub(crate) struct RegionEnv {
    pub(crate) west: &'static str,
    pub(crate) east: &'static str,
    pub(crate) south: &'static str,
    pub(crate) north: &'static str,
}

/// Show a written map in the default browser. Failures are only logged.
pub(crate) fn open_in_browser(path: &Utf8Path) {
    if let Err(err) = opener::open_browser(path.as_std_path()) {
        warn!("could not open {path} in a browser: {err}");
    }
}

#[cfg(test)]
mod tests;
