//! Per-parameter rows of the sampler's statistics table.
//!
//! The sampler prints one row per fitted parameter:
//!
//! ```text
//!    Parameter       mean  median    best [   68% interval] [   95% interval]
//!  1   intensity  1.0000(14)  1.0000  1.0000 [  0.9986   1.0014] [  0.9972   1.0028]
//! ```
//!
//! The mean is written in value(uncertainty) notation with an optional
//! trailing exponent (`1.23(4)e-5`) that scales the mean only.

use std::sync::LazyLock;

use bk_core::ParameterStats;
use regex::{Captures, Regex};

/// Recognizes parameter-statistics rows in a statistics file.
///
/// Returns `None` for lines that are not parameter rows; the caller ignores
/// those.
pub trait ParameterLineParser {
    /// Parse one line into a parameter record.
    fn parse_line(&self, line: &str) -> Option<ParameterStats>;
}

impl<F> ParameterLineParser for F
where
    F: Fn(&str) -> Option<ParameterStats>,
{
    fn parse_line(&self, line: &str) -> Option<ParameterStats> {
        self(line)
    }
}

/// Parser for the table rows written by the DREAM sampler.
#[derive(Debug, Clone, Copy, Default)]
pub struct DreamVarParser;

impl ParameterLineParser for DreamVarParser {
    fn parse_line(&self, line: &str) -> Option<ParameterStats> {
        parse_var(line)
    }
}

const NUM: &str = r"[0-9.eE+-]+|[Nn]a[Nn]|[+-]?inf";

static VAR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^\s*(?P<parnum>[0-9]+)\s+(?P<label>.+?)\s+(?P<mean>-?[0-9.]+)\((?P<err>[0-9]+)\)(?:e(?P<exp>[+-]?[0-9]+))?\s+(?P<median>{NUM})\s+(?P<best>{NUM})\s+\[\s*(?P<lo68>{NUM})\s+(?P<hi68>{NUM})\]\s+\[\s*(?P<lo95>{NUM})\s+(?P<hi95>{NUM})\]\s*$"
    );
    Regex::new(&pattern).expect("parameter row pattern is valid")
});

fn float(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name)?.as_str().parse().ok()
}

/// Parse a single table row into a [`ParameterStats`].
///
/// Returns `None` when the line is not a parameter row (headers, blank lines,
/// annotations) or when one of its numbers does not parse.
pub fn parse_var(line: &str) -> Option<ParameterStats> {
    let caps = VAR_ROW.captures(line)?;

    let exp: i32 = match caps.name("exp") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let mean = float(&caps, "mean")? * 10f64.powi(exp);

    Some(ParameterStats {
        index: caps["parnum"].parse().ok()?,
        name: caps["label"].to_string(),
        mean,
        median: float(&caps, "median")?,
        best: float(&caps, "best")?,
        p68: (float(&caps, "lo68")?, float(&caps, "hi68")?),
        p95: (float(&caps, "lo95")?, float(&caps, "hi95")?),
    })
}
