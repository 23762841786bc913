//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docstitch_core::{BatchOutcome, PageUpload, ProgressReporter, ReconcileConfig, reconcile};
use docstitch_extract::ExtractionClient;
use docstitch_schema::{CompareStrategy, DocumentProfile};
use docstitch_shared::{AppConfig, DocstitchError, ProviderConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docstitch — reconcile multi-page scans into one record.
#[derive(Parser)]
#[command(
    name = "docstitch",
    version,
    about = "Extract scanned document pages and merge them into one coherent record.",
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
    /// Reconcile one or more page scans into a single record.
    Reconcile {
        /// Page files in upload order (pdf, jpg, png, tiff, ...).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Extraction profile: invoice or registration.
        #[arg(short, long)]
        profile: Option<String>,

        /// Comparison strategy: adjacent or anchor.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Maximum concurrent provider calls.
        #[arg(long)]
        fan_out: Option<usize>,

        /// Pretty-print the resulting JSON.
        #[arg(long)]
        pretty: bool,
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

    let filter = match cli.verbose {
        0 => "docstitch=info",
        1 => "docstitch=debug",
        _ => "docstitch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
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
        Command::Reconcile {
            files,
            profile,
            strategy,
            fan_out,
            pretty,
        } => {
            cmd_reconcile(
                &files,
                profile.as_deref(),
                strategy.as_deref(),
                fan_out,
                pretty,
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_reconcile(
    files: &[PathBuf],
    profile: Option<&str>,
    strategy: Option<&str>,
    fan_out: Option<usize>,
    pretty: bool,
) -> Result<()> {
    let config = load_config()?;

    // CLI flags override config file values.
    let profile: DocumentProfile = profile
        .unwrap_or(&config.defaults.profile)
        .parse()
        .map_err(|e: String| eyre!(e))?;
    let strategy: CompareStrategy = strategy
        .unwrap_or(&config.defaults.strategy)
        .parse()
        .map_err(|e: String| eyre!(e))?;
    let fan_out = fan_out.unwrap_or(config.defaults.fan_out as usize);

    let provider = ProviderConfig::from_settings(&config.provider)?;
    let client = ExtractionClient::new(provider)?;

    let mut pages = Vec::with_capacity(files.len());
    for file in files {
        let bytes = std::fs::read(file).map_err(|e| DocstitchError::io(file, e))?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| eyre!("not a file path: {}", file.display()))?;
        pages.push(PageUpload { filename, bytes });
    }

    info!(
        pages = pages.len(),
        profile = %profile,
        strategy = %strategy,
        "reconciling batch"
    );

    let reconcile_config = ReconcileConfig {
        profile,
        strategy,
        fan_out,
    };

    let reporter = CliProgress::new();
    let outcome = match reconcile(&client, &reconcile_config, pages, &reporter).await {
        Ok(outcome) => outcome,
        Err(DocstitchError::Mismatch(report)) => {
            reporter.clear();
            // Structured rejection detail so the caller can fix the upload.
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "rejected": report,
                }))?
            );
            return Err(eyre!("pages do not belong to the same document"));
        }
        Err(e) => {
            reporter.clear();
            return Err(e.into());
        }
    };

    let output = serde_json::json!({
        "files": outcome.filenames(),
        "record": outcome.record(),
    });
    if pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{output}");
    }

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

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_extracted(&self, filename: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Extracted [{current}/{total}] {filename}"));
    }

    fn done(&self, _outcome: &BatchOutcome) {
        self.spinner.finish_and_clear();
    }
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
