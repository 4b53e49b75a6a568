//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cellstats_core::{ProgressReporter, run_author_stats, run_bib_stats};
use cellstats_remote::HttpRemote;
use cellstats_shared::{AppConfig, StatsConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// cellstats — curation statistics for knowledge-base cell types.
#[derive(Parser)]
#[command(
    name = "cellstats",
    version,
    about = "Cross-reference and aggregate cell-type curation statistics.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Cross-reference noted articles against cell-type provenance and
    /// render the bibliography badge.
    BibStats {
        /// Path to the local Turtle graph (overrides config).
        #[arg(long)]
        graph: Option<String>,

        /// Output directory for artifacts (overrides config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Merge per-entity editor/author data and render contributor statistics.
    AuthorStats {
        /// Output directory for artifacts (overrides config).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = [
        "cellstats",
        "cellstats_core",
        "cellstats_remote",
        "cellstats_cache",
        "cellstats_graph",
        "cellstats_report",
        "cellstats_shared",
    ]
    .map(|krate| format!("{krate}={level}"))
    .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::BibStats { graph, out } => cmd_bib_stats(graph.as_deref(), out.as_deref()).await,
        Command::AuthorStats { out } => cmd_author_stats(out.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Build the runtime config from the config file plus CLI overrides.
fn resolve_config(graph: Option<&str>, out: Option<&str>) -> Result<StatsConfig> {
    let config = load_config()?;
    let mut stats = StatsConfig::from(&config);
    if let Some(graph) = graph {
        stats.local_graph_path = PathBuf::from(graph);
    }
    if let Some(out) = out {
        stats.output_dir = PathBuf::from(out);
    }
    Ok(stats)
}

async fn cmd_bib_stats(graph: Option<&str>, out: Option<&str>) -> Result<()> {
    let config = resolve_config(graph, out)?;

    info!(
        graph = %config.local_graph_path.display(),
        out = %config.output_dir.display(),
        "running bibliography statistics"
    );

    let remote = HttpRemote::new(&config)?;
    let reporter = CliProgress::new();
    let result = run_bib_stats(&config, &remote, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Bibliography statistics complete!");
    println!("  Noted articles:      {}", result.total_articles);
    println!("  Referencing cells:   {}", result.matched_articles);
    println!("  Cell classes found:  {}", result.matched_cells);
    println!("  Badge:               {}", result.badge_path.display());
    println!("  Time:                {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_author_stats(out: Option<&str>) -> Result<()> {
    let config = resolve_config(None, out)?;

    info!(
        out = %config.output_dir.display(),
        curator = %config.curator_username,
        "running contributor statistics"
    );

    let remote = HttpRemote::new(&config)?;
    let reporter = CliProgress::new();
    let result = run_author_stats(&config, &remote, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Contributor statistics complete!");
    println!("  Cell types:       {}", result.figures.total);
    println!(
        "  Edited by {}: {} ({}%)",
        config.curator_username,
        result.figures.edited,
        result.figures.percentage_edited()
    );
    println!(
        "  Created by {}: {} ({}%)",
        config.curator_username,
        result.figures.created,
        result.figures.percentage_created()
    );
    println!("  New editor fetches: {}", result.editors_fetched);
    println!("  New author fetches: {}", result.authors_fetched);
    println!("  Unedited entities:  {}", result.unedited);
    println!();
    println!("  Top editors by total edits:");
    for editor in &result.top_by_edits {
        println!("    {:>8}  {}", editor.value, editor.username);
    }
    println!("  Top editors by distinct entities:");
    for editor in &result.top_by_entities {
        println!("    {:>8}  {}", editor.value, editor.username);
    }
    println!("{}", result.report);

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn key_progress(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}]"));
    }
}
