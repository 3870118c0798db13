//! Kagami main entry point
//!
//! Command-line interface for the Kagami website mirroring tool.

use anyhow::Context;
use clap::Parser;
use kagami::config::Options;
use kagami::crawler::run_mirror;
use kagami::output::stats::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Kagami: mirror a website for offline browsing
///
/// Kagami downloads every same-domain page reachable from an entry URL,
/// rewrites internal links to relative local paths, and saves referenced
/// resources so the mirror browses offline. Respect robots.txt and the
/// site's terms yourself: the tool only enforces the request delay you
/// give it.
#[derive(Parser, Debug)]
#[command(name = "kagami")]
#[command(version)]
#[command(about = "Mirror a website to local storage for offline browsing", long_about = None)]
struct Cli {
    /// Entry URL of the site to mirror
    #[arg(value_name = "URL")]
    url: String,

    /// Output directory (default: the site's host name)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Delay between requests in seconds
    #[arg(long, default_value_t = 0.5)]
    delay: f64,

    /// Skip non-English translations of pages
    #[arg(long)]
    english_only: bool,

    /// Create a single markdown file with a shared image folder
    #[arg(long)]
    markdown: bool,

    /// Download only the entry page and its direct resources
    #[arg(long)]
    page_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let options = Options::new(
        &cli.url,
        cli.output,
        cli.delay,
        cli.english_only,
        cli.markdown,
        cli.page_only,
    )
    .context("invalid command-line options")?;

    let english_only = options.english_only;
    let markdown = options.markdown;

    let stats = run_mirror(options)
        .await
        .context("mirroring run failed")?;

    print_summary(&stats, english_only, markdown);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kagami=info,warn"),
            1 => EnvFilter::new("kagami=debug,info"),
            2 => EnvFilter::new("kagami=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
