//! bumpkit CLI

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

use bk_util::rng;
use bk_util::scope::{RandomSeedScope, WorkingDirectoryScope};

#[derive(Parser)]
#[command(name = "bumpkit")]
#[command(about = "bumpkit - fit statistics and scoped process state")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a fit statistics log (.err) and print it as JSON
    Errfile {
        /// Statistics log written by the fit
        input: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw integers from the process generator under a fixed seed
    Draw {
        /// Seed installed for the draws
        #[arg(long)]
        seed: u64,

        /// Number of draws
        #[arg(short, long, default_value = "3")]
        n: usize,

        /// Lower bound (inclusive)
        #[arg(long, default_value = "0")]
        lo: i64,

        /// Upper bound (exclusive)
        #[arg(long, default_value = "1000000")]
        hi: i64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a command in another directory and/or with console output redirected
    Exec {
        /// Working directory for the command
        #[arg(long)]
        chdir: Option<PathBuf>,

        /// File receiving stdout (and stderr unless --err-log is given)
        #[arg(long)]
        log: Option<PathBuf>,

        /// File receiving stderr. Requires --log.
        #[arg(long, requires = "log")]
        err_log: Option<PathBuf>,

        /// Command and arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Errfile { input, output } => cmd_errfile(&input, output.as_ref()),
        Commands::Draw { seed, n, lo, hi, output } => cmd_draw(seed, n, lo, hi, output.as_ref()),
        Commands::Exec { chdir, log, err_log, command } => {
            let code = cmd_exec(chdir.as_deref(), log.as_deref(), err_log.as_deref(), &command)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}

fn cmd_errfile(input: &Path, output: Option<&PathBuf>) -> Result<()> {
    let report = bk_util::errfile::parse_file(input)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    tracing::info!(
        overall_chisq = report.overall_chisq,
        models = report.n_models(),
        parameters = report.parameters.len(),
        "statistics parsed"
    );
    write_json(output, serde_json::to_value(&report)?)
}

fn cmd_draw(seed: u64, n: usize, lo: i64, hi: i64, output: Option<&PathBuf>) -> Result<()> {
    if lo >= hi {
        bail!("empty range: --lo {lo} must be below --hi {hi}");
    }
    let draws: Vec<i64> =
        RandomSeedScope::new(seed).run(|| (0..n).map(|_| rng::random_range(lo..hi)).collect())?;

    let output_json = serde_json::json!({
        "seed": seed,
        "lo": lo,
        "hi": hi,
        "draws": draws,
    });
    write_json(output, output_json)
}

#[cfg(unix)]
fn cmd_exec(
    chdir: Option<&Path>,
    log: Option<&Path>,
    err_log: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    use bk_util::scope::{RedirectTarget, StreamRedirectScope};

    // Log paths are relative to the invocation directory, not --chdir.
    let log = log.map(std::path::absolute).transpose()?;
    let err_log = err_log.map(std::path::absolute).transpose()?;

    let mut dir_scope = chdir.map(WorkingDirectoryScope::new).transpose()?;
    let mut redirect = match log {
        Some(log) => Some(StreamRedirectScope::new(
            Some(RedirectTarget::path(log)),
            err_log.map(RedirectTarget::path),
        )?),
        None => None,
    };

    if let Some(scope) = dir_scope.as_mut() {
        scope.enter()?;
    }
    if let Some(scope) = redirect.as_mut() {
        scope.enter()?;
    }

    let status = run_child(command);

    if let Some(scope) = redirect.as_mut() {
        scope.exit()?;
    }
    if let Some(scope) = dir_scope.as_mut() {
        scope.exit()?;
    }

    let status = status?;
    tracing::info!(%status, "command finished");
    Ok(status.code().unwrap_or(1))
}

#[cfg(not(unix))]
fn cmd_exec(
    chdir: Option<&Path>,
    log: Option<&Path>,
    _err_log: Option<&Path>,
    command: &[String],
) -> Result<i32> {
    if log.is_some() {
        bail!("--log is only supported on unix");
    }
    let mut dir_scope = chdir.map(WorkingDirectoryScope::new).transpose()?;
    let status = match dir_scope.as_mut() {
        Some(scope) => scope.run(|| run_child(command))?,
        None => run_child(command),
    }?;
    Ok(status.code().unwrap_or(1))
}

fn run_child(command: &[String]) -> Result<std::process::ExitStatus> {
    let (program, args) = command.split_first().context("missing command")?;
    Command::new(program).args(args).status().with_context(|| format!("failed to run {program}"))
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
