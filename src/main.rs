// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use cti_extract::utils::logging::{format_error, format_info, format_success, format_warning};
use cti_extract::{
    Config, CtiReport, ExtractionPipeline, JsonExporter, NormalizedText, OllamaClient,
    ProgressTracker, ReportStore, SourceInfo, StoredReportMeta,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "cti_extract")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Hybrid regex + LLM threat intelligence extraction", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over text files and export JSON reports
    Extract {
        /// Input files containing raw report text
        files: Vec<PathBuf>,

        #[arg(short, long, default_value = "./exports")]
        output: PathBuf,

        #[arg(short, long)]
        pretty: bool,

        /// Also store each processed document for later retrieval
        #[arg(long)]
        store: bool,
    },

    /// Store documents in the retrieval database without extracting
    Ingest {
        files: Vec<PathBuf>,
    },

    /// Search stored reports by semantic similarity
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    Stats,

    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    cti_extract::utils::logging::init_logger(cli.color, cli.verbose);

    info!("CTI extraction pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("{}", format_error(&format!("{:#}", e)));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Extract {
            files,
            output,
            pretty,
            store,
        } => {
            cmd_extract(config, files, output, pretty, store).await?;
        }
        Commands::Ingest { files } => {
            cmd_ingest(config, files).await?;
        }
        Commands::Search { query, limit } => {
            cmd_search(config, &query, limit).await?;
        }
        Commands::Stats => {
            cmd_stats(config).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(config, confirm).await?;
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> Option<Arc<ReportStore>> {
    if !config.retrieval.enabled {
        return None;
    }
    match ReportStore::connect(config.retrieval.clone()).await {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Report store unavailable, continuing without retrieval: {}", e);
            None
        }
    }
}

async fn require_store(config: &Config) -> Result<ReportStore> {
    ReportStore::connect(config.retrieval.clone())
        .await
        .context("Failed to connect to report store")
}

fn source_for(path: &Path) -> SourceInfo {
    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    SourceInfo::new(id)
}

async fn cmd_extract(
    config: &Config,
    files: Vec<PathBuf>,
    output: PathBuf,
    pretty: bool,
    store_documents: bool,
) -> Result<()> {
    if files.is_empty() {
        warn!("No input files given");
        return Ok(());
    }

    let chat = OllamaClient::new(&config.llm);
    let mut pipeline =
        ExtractionPipeline::new(config.clone(), chat).context("Failed to build pipeline")?;

    if let Some(store) = connect_store(config).await {
        pipeline = pipeline.with_store(store);
    }

    let exporter = JsonExporter::new(&output, pretty)?;
    let progress = ProgressTracker::new(files.len());
    let mut written: Vec<PathBuf> = Vec::new();

    for path in &files {
        progress.set_message(format!("Processing {}", path.display()));

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                progress.inc_failed();
                continue;
            }
        };

        let input = NormalizedText::new(&content, source_for(path));
        progress.add_bytes_processed(input.len() as u64);

        match pipeline.process(&input).await {
            Ok(outcome) => match outcome.report {
                Some(report) => {
                    progress.add_entities(outcome.stats.entities_extracted);
                    match exporter.write_report(&report) {
                        Ok(report_path) => {
                            written.push(report_path);
                            progress.inc_processed();
                            log_report(&report, outcome.stats.chunk_success_rate());
                        }
                        Err(e) => {
                            error!("Failed to write report for {}: {}", path.display(), e);
                            progress.inc_failed();
                        }
                    }
                    if store_documents {
                        if let Err(e) = pipeline.ingest(&input.text, &input.source).await {
                            warn!("Failed to store {}: {}", path.display(), e);
                        }
                    }
                }
                None => {
                    progress.inc_skipped();
                }
            },
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                progress.inc_failed();
            }
        }
    }

    if !written.is_empty() {
        exporter.write_manifest(&written)?;
    }

    let stats = progress.get_stats();
    progress.finish();

    println!(
        "{}",
        format_success(&format!(
            "Processed {} documents ({} entities) in {}s",
            stats.documents_processed, stats.entities_extracted, stats.duration_secs
        ))
    );
    if stats.documents_skipped > 0 {
        println!(
            "{}",
            format_warning(&format!("{} documents classified as spam", stats.documents_skipped))
        );
    }
    if stats.documents_failed > 0 {
        println!(
            "{}",
            format_warning(&format!("{} documents failed", stats.documents_failed))
        );
    }

    Ok(())
}

fn log_report(report: &CtiReport, chunk_success_rate: f64) {
    info!(
        "Report {}: {} entities, level {}, primary actor {} ({:.0}% chunks ok)",
        report.metadata.source,
        report.entity_count(),
        report.threat_level,
        report.primary_actor.as_deref().unwrap_or("unknown"),
        chunk_success_rate
    );
}

async fn cmd_ingest(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    if files.is_empty() {
        warn!("No input files given");
        return Ok(());
    }

    let store = require_store(config).await?;
    let mut stored = 0usize;

    for path in &files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let input = NormalizedText::new(&content, source_for(path));

        let meta = StoredReportMeta {
            title: input.source.id.clone(),
            source_url: input.source.url.clone(),
        };
        let id = store.add_report(&input.text, &meta).await?;
        info!("Stored {} as {}", path.display(), id);
        stored += 1;
    }

    println!("{}", format_success(&format!("Stored {} documents", stored)));
    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    info!("Searching for: {}", query);

    let store = require_store(config).await?;
    let results = store.search(query, limit).await.context("Search failed")?;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Checking that documents have been ingested");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", results.len());
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        println!("\n{}. {} (Score: {:.4})", idx + 1, result.title, result.score);

        if let Some(distance) = result.distance {
            println!("   Distance: {:.4}", distance);
        }

        let preview: String = result.content.chars().take(300).collect();
        println!("   Preview:");
        for line in preview.lines().take(5) {
            println!("     {}", line);
        }
    }

    println!("\n{}", "=".repeat(80));
    info!("Search complete");

    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = require_store(config).await?;
    let count = store.count().await?;
    println!("{}", format_info(&format!("Stored reports: {}", count)));
    Ok(())
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete all stored reports. Use --confirm to proceed");
        return Ok(());
    }

    warn!("Resetting report store - all data will be lost");
    let store = require_store(config).await?;
    store.reset().await.context("Failed to reset store")?;
    println!("{}", format_success("Report store reset"));

    Ok(())
}
