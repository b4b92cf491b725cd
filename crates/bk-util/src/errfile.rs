//! Statistics log ("err file") parser.
//!
//! A fit writes its summary statistics as a line-oriented text log:
//!
//! ```text
//! [overall chisq=1.234(5), nllf=98.7]
//! 1.12[chisq0]
//! 1.35[chisq1]
//!    Parameter       mean  median    best [   68% interval] [   95% interval]
//!  1   intensity  1.0000(14)  1.0000  1.0000 [  0.9986   1.0014] [  0.9972   1.0028]
//! ```
//!
//! - `[overall chisq=<v>...]` carries the overall chi-square (last one wins).
//! - `<v>[chisq<N>]` and `[chisq=<v>...]` carry one model's chi-square, in file order.
//! - every other non-blank line is offered to a [`ParameterLineParser`]; lines
//!   it does not recognize are ignored.
//!
//! Usually there is a single `*.err` file in a fit's output directory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bk_core::{Error, FitStatisticsReport, ParameterTable, Result};

use crate::varstats::{DreamVarParser, ParameterLineParser};

const OVERALL_TAG: &str = "[overall";
const CHISQ_TAG: &str = "[chisq";
const CHISQ_KEY: &str = "chisq=";

/// Single-pass parser for statistics logs.
#[derive(Debug, Clone, Default)]
pub struct StatsFileParser<P = DreamVarParser> {
    line_parser: P,
}

impl StatsFileParser {
    /// Create a parser using the default sampler table format.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: ParameterLineParser> StatsFileParser<P> {
    /// Create a parser with a custom per-parameter line parser.
    pub fn with_line_parser(line_parser: P) -> Self {
        Self { line_parser }
    }

    /// Parse a statistics log from a buffered reader.
    ///
    /// Fails with [`Error::MalformedStatsFile`] if neither an overall nor a
    /// model chi-square is present, and with [`Error::NumericParseError`] if a
    /// tagged chi-square is not a valid number. No partial report is returned.
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<FitStatisticsReport> {
        let mut overall: Option<f64> = None;
        let mut model_chisq: Vec<f64> = Vec::new();
        let mut parameters = ParameterTable::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;

            if line.starts_with(OVERALL_TAG) {
                let value = overall_value(&line).ok_or_else(|| numeric_error(lineno, &line))?;
                if let Some(prev) = overall.replace(value) {
                    log::debug!("line {lineno}: overall chisq {value} replaces {prev}");
                }
                continue;
            }

            if let Some(tagged) = model_value(&line) {
                let value = tagged.ok_or_else(|| numeric_error(lineno, &line))?;
                model_chisq.push(value);
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            match self.line_parser.parse_line(&line) {
                Some(stats) => {
                    if let Some(prev) = parameters.insert(stats) {
                        log::debug!(
                            "line {lineno}: parameter '{}' (#{}) overwritten",
                            prev.name,
                            prev.index
                        );
                    }
                }
                None => log::trace!("line {lineno}: ignored"),
            }
        }

        let overall_chisq = match overall {
            Some(v) => v,
            None => *model_chisq.first().ok_or_else(|| {
                Error::MalformedStatsFile(
                    "no [overall chisq=...] line and no model [chisq] lines".to_string(),
                )
            })?,
        };

        log::debug!(
            "parsed statistics: overall chisq {overall_chisq}, {} models, {} parameters",
            model_chisq.len(),
            parameters.len()
        );

        Ok(FitStatisticsReport { overall_chisq, model_chisq, parameters })
    }
}

fn numeric_error(line: usize, text: &str) -> Error {
    Error::NumericParseError { line, text: text.to_string() }
}

/// Parse the leading number of `s`, stopping at `]`, `,`, `(` or whitespace.
///
/// The `(` stop drops the uncertainty digits of `1.23(4)` notation.
fn leading_number(s: &str) -> Option<f64> {
    let end = s.find(|c: char| c == ']' || c == ',' || c == '(' || c.is_whitespace());
    let token = &s[..end.unwrap_or(s.len())];
    token.parse().ok()
}

/// Value of an `[overall chisq=<v>...]` line.
fn overall_value(line: &str) -> Option<f64> {
    let rest = &line[OVERALL_TAG.len()..];
    let start = rest.find(CHISQ_KEY)? + CHISQ_KEY.len();
    leading_number(&rest[start..])
}

/// Model chi-square of a tagged line.
///
/// Returns `None` if the line carries no `[chisq` tag, `Some(None)` if it
/// does but the value is not a number. The tag must be followed by a model
/// index or `=`; `[chisq]` in free text is not a tag.
fn model_value(line: &str) -> Option<Option<f64>> {
    let token = line.split_whitespace().next()?;
    let pos = token.find(CHISQ_TAG)?;
    let after = token[pos + CHISQ_TAG.len()..].chars().next();
    if !matches!(after, Some(c) if c == '=' || c.is_ascii_digit()) {
        return None;
    }
    if pos == 0 {
        // [chisq=<v>, ...]
        let rest = &token[CHISQ_TAG.len()..];
        return Some(rest.strip_prefix('=').and_then(leading_number));
    }
    // <v>[chisq<N>]
    Some(token[..pos].parse().ok())
}

/// Parse a statistics log with the default line parser.
pub fn parse<R: BufRead>(reader: R) -> Result<FitStatisticsReport> {
    StatsFileParser::new().parse(reader)
}

/// Parse a statistics log held in memory.
pub fn parse_str(text: &str) -> Result<FitStatisticsReport> {
    parse(text.as_bytes())
}

/// Parse a statistics log from a file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<FitStatisticsReport> {
    let file = File::open(path.as_ref())?;
    parse(BufReader::new(file))
}
