//! CLI argument definitions using clap derive macros.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Download every file linked from directory listing pages.
///
/// Each URL is read as a listing page; its direct children matching
/// `--matching` are fetched by a pool of workers. Partial files left by an
/// earlier run are resumed.
#[derive(Parser, Debug)]
#[command(name = "slurp")]
#[command(author, version, about)]
pub struct Args {
    /// Number of concurrent workers
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// List what would be fetched without fetching anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only fetch file names matching this regular expression
    #[arg(long, default_value = "")]
    pub matching: String,

    /// Interval between status line updates (250ms, 1s, 2m or bare seconds)
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub ui_delay: Duration,

    /// Log every started file and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output directory, or the tar file with --tar
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Write everything into a single tar file at --out
    #[arg(long)]
    pub tar: bool,

    /// Limit on a whole request, body included
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Limit on establishing a connection
    #[arg(long, value_parser = parse_duration)]
    pub connect_timeout: Option<Duration>,

    /// Retries on transient HTTP failures
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Hide the status line
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory listing pages to download from
    pub urls: Vec<String>,
}

/// Exit status after a second interrupt, as a shell reports SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// The closing line printed on stdout when some orders failed.
pub fn error_summary(failures: usize) -> Option<String> {
    (failures > 0).then(|| format!("Number of errors: {}", failures))
}

/// Parse `250ms`, `1s`, `2m`, `1h` or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (value, unit) = s.split_at(split);
    let value: u64 = value
        .parse()
        .map_err(|_| format!("invalid duration {:?}", s))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 3600)),
        _ => Err(format!("unknown duration unit {:?} in {:?}", unit, s)),
    }
}
