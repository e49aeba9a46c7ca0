//! Error types emitted by the wayfetch CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use wayfetch_core::{ExecuteError, RegionError};
use wayfetch_data::{CacheError, ClientBuildError, RenderError};

/// Errors emitted by the wayfetch CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The region bounds are not a valid bounding box.
    #[error("invalid region: {0}")]
    Region(#[source] RegionError),
    /// Constructing the Overpass client failed.
    #[error("failed to build Overpass client for {endpoint:?}: {source}")]
    BuildClient {
        endpoint: String,
        #[source]
        source: ClientBuildError,
    },
    /// Fetching or resolving the ways failed.
    #[error("fetch failed: {0}")]
    Fetch(#[source] Box<ExecuteError>),
    /// Saving or loading the cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Writing the map document failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Two options point at the same file.
    #[error("--{first} and --{second} both name {path:?}")]
    PathClash {
        first: &'static str,
        second: &'static str,
        path: Utf8PathBuf,
    },
}

impl From<ExecuteError> for CliError {
    fn from(error: ExecuteError) -> Self {
        Self::Fetch(Box::new(error))
    }
}
