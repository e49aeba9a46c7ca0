//! Shared test harness modules for the wayfetch CLI.

use super::*;

mod pipeline;
