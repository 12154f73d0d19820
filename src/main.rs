//! PuzzleScrape CLI - puzzle walkthrough blog scraper.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use puzzlescrape::config::Config;
use puzzlescrape::console::Console;
use puzzlescrape::fetch::Fetcher;
use puzzlescrape::output::PuzzleDocument;
use puzzlescrape::pipeline::{Pipeline, RunOptions, ScanMode};
use puzzlescrape::readme;
use std::path::{Path, PathBuf};

/// Scrapes numbered puzzle posts into a JSON document.
#[derive(Parser, Debug)]
#[command(name = "puzzlescrape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape puzzle posts and write the JSON document (default).
    Scrape(ScrapeArgs),
    /// Rewrite the impossible-puzzle block in README.md.
    Readme {
        /// README to update.
        #[arg(long, default_value = "README.md")]
        readme: PathBuf,

        /// JSON object of puzzle number to name.
        #[arg(long, default_value = "impossible.json")]
        impossible: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct ScrapeArgs {
    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Count upward through page numbers instead of discovering links.
    #[arg(long)]
    sequential: bool,

    /// First puzzle number for --sequential.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=999))]
    start: Option<u32>,

    /// Stop after this many puzzles.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_records: Option<u64>,

    /// Where to write the JSON document.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Directory for raw HTML of pages that could not be identified.
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let console = Console::new();

    let result = match cli.command.unwrap_or(Command::Scrape(ScrapeArgs::default())) {
        Command::Scrape(args) => scrape(args, &console).await,
        Command::Readme { readme, impossible } => update_readme(&readme, &impossible, &console),
    };

    if let Err(e) = &result {
        console.error(&format!("{:#}", e));
    }
    result
}

fn update_readme(readme: &Path, impossible: &Path, console: &Console) -> Result<()> {
    let changed = readme::update_readme(readme, impossible)
        .with_context(|| format!("Failed to update {}", readme.display()))?;
    if changed {
        console.success("README updated.");
    } else {
        console.info("README already up to date.");
    }
    Ok(())
}

async fn scrape(args: ScrapeArgs, console: &Console) -> Result<()> {
    console.section("PuzzleScrape");

    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(dir) = args.debug_dir {
        config.scraping.debug_dir = Some(dir);
    }
    if let Some(path) = args.output {
        config.output.path = path;
    }
    config.validate().context("Invalid configuration")?;
    console.success(&format!("Scraping {}", config.site.domain));

    let mode = if args.sequential {
        ScanMode::Sequential {
            start: args.start.unwrap_or(config.scraping.start_id),
        }
    } else {
        ScanMode::Discover
    };
    let options = RunOptions {
        mode,
        max_records: args
            .max_records
            .map(|n| n as usize)
            .or(config.scraping.max_records),
    };

    let fetcher = Fetcher::new(config.fetch.clone()).context("Failed to create HTTP client")?;
    let pipeline = Pipeline::new(&fetcher, &config);

    match mode {
        ScanMode::Discover => console.step("Discovering puzzle pages..."),
        ScanMode::Sequential { start } => {
            console.step(&format!("Scanning sequentially from puzzle {:03}...", start))
        }
    }
    let records = pipeline.run(&config.site.seed_urls, &options).await;

    if records.is_empty() {
        console.warning("No puzzles were extracted; writing an empty document.");
    } else {
        for record in &records {
            console.info(&console.puzzle_line(record));
        }
        console.success(&format!("Extracted {} puzzles", records.len()));
    }

    let document = PuzzleDocument::new(&config.site.source_label, records);
    document
        .write_to(&config.output.path)
        .await
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;
    console.success(&format!("Wrote {}", config.output.path.display()));

    console.section("Done!");
    Ok(())
}
