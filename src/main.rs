//! CLI entry point for slurp.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use slurp::{
    create_http_client, listing, ArchiveSink, DirectSink, DownloaderBuilder, HttpClientConfig,
    OutputSink, ProgressBarOpts,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // RUST_LOG wins over the verbose flag.
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    if args.urls.is_empty() {
        info!("No listing pages given, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    let pattern = listing::pattern(&args.matching)
        .wrap_err_with(|| format!("invalid --matching pattern {:?}", args.matching))?;

    let http = HttpClientConfig {
        retries: args.retries,
        timeout: args.timeout,
        connect_timeout: args.connect_timeout,
        ..HttpClientConfig::default()
    };
    let client = create_http_client(http).wrap_err("failed to build the HTTP client")?;

    let downloads = listing::resolve(&client, &args.urls, &pattern).await?;
    info!(files = downloads.len(), "Resolved listing pages");
    if args.dry_run {
        for download in &downloads {
            info!("Would fetch {}", download.url);
        }
    }

    let sink: Arc<dyn OutputSink> = if args.tar {
        let sink = ArchiveSink::create_file(&args.out)
            .await
            .wrap_err_with(|| format!("cannot create archive {:?}", args.out))?;
        Arc::new(sink)
    } else {
        Arc::new(DirectSink::new(&args.out))
    };

    let mut builder = DownloaderBuilder::new()
        .workers(usize::from(args.workers))
        .dry_run(args.dry_run)
        .verbose(args.verbose)
        .ui_delay(args.ui_delay)
        .retries(args.retries);
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = args.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if args.quiet {
        builder = builder.style_options(ProgressBarOpts::hidden());
    }
    let downloader = builder.build();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        // The first interrupt winds the run down, the next one exits at once.
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_signal.is_cancelled() {
                warn!("Interrupted again, exiting");
                std::process::exit(cli::INTERRUPTED_EXIT_CODE);
            }
            warn!("Killed by signal");
            on_signal.cancel();
        }
    });

    let report = downloader.run(&downloads, sink, cancel).await?;
    info!(
        files = report.files_done,
        bytes = report.bytes,
        elapsed = ?report.elapsed,
        "Run finished"
    );

    if let Some(line) = cli::error_summary(report.failures) {
        println!("{}", line);
    }
    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
