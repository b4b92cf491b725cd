//! # bk-core
//!
//! Core types shared across bumpkit crates:
//! - [`Error`] / [`Result`] used by the parser and the scope managers
//! - [`FitStatisticsReport`] and [`ParameterStats`], the parsed form of a fit's
//!   statistics log

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types.
pub mod error;
/// Report data model.
pub mod types;

pub use error::{Error, Result};
pub use types::{FitStatisticsReport, ParameterStats, ParameterTable};
