//! # bk-util
//!
//! Utilities around a fit's results:
//! - [`errfile`]: recover chi-square values and parameter statistics from a
//!   fit's statistics log
//! - [`varstats`]: the per-parameter table rows inside that log
//! - [`rng`]: the process-wide pseudo-random generator
//! - [`scope`]: scoped overrides of the generator seed, the working
//!   directory and the console streams

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Statistics log parser.
pub mod errfile;
/// Process-wide random generator.
pub mod rng;
/// Scoped overrides of process-wide state.
pub mod scope;
/// Parameter table rows.
pub mod varstats;

pub use errfile::StatsFileParser;
pub use scope::{RandomSeedScope, ScopePhase, Scoped, WorkingDirectoryScope};
#[cfg(unix)]
pub use scope::{RedirectTarget, StreamRedirectScope};
pub use varstats::{DreamVarParser, ParameterLineParser};
