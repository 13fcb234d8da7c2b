use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use charge_roi::config::{AllocationConfig, Config};
use charge_roi::dataset::{load_dataset, sample_dataset, Dataset};
use charge_roi::evaluate::{audit_country, evaluate_portfolio, EvaluationSettings, Portfolio};
use charge_roi::intel::IntelTable;
use charge_roi::output;
use charge_roi::scoring::{sweep, Factor, ScoringConfig, SweepPoint};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank markets by ROI score (default if no subcommand)
    Rank {
        /// Show only the best N markets
        #[arg(long)]
        top: Option<usize>,
        /// Drop markets that fail the margin of safety
        #[arg(long)]
        deployable_only: bool,
    },
    /// Split the capital mandate across the top markets
    Allocate {
        /// Capital to split, in millions
        #[arg(long)]
        capital: Option<f64>,
        /// Number of markets to fund
        #[arg(long)]
        top: Option<usize>,
        /// Drop markets that fail the margin of safety
        #[arg(long)]
        deployable_only: bool,
    },
    /// Explain one market's score, stage and decision
    Audit {
        /// Country name (case-insensitive)
        country: String,
    },
    /// Re-score one market while varying a single factor weight
    WhatIf {
        /// Country name (case-insensitive)
        country: String,
        /// Factor to vary: resilience, market-room or wealth
        #[arg(long)]
        factor: Factor,
        /// Comma-separated weights to try
        #[arg(long, value_delimiter = ',', default_value = "0,0.5,1,1.5,2")]
        values: Vec<f64>,
    },
    /// Create a config file interactively
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "charge-roi")]
#[command(about = "EV market ROI scoring and capital allocation CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/charge-roi/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Dataset file (JSON or YAML), overrides the config
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Resilience weight override
    #[arg(long, global = true)]
    resilience: Option<f64>,

    /// Market room weight override
    #[arg(long, global = true)]
    market_room: Option<f64>,

    /// Wealth weight override
    #[arg(long, global = true)]
    wealth: Option<f64>,

    /// Margin of safety override (0-1)
    #[arg(long, global = true)]
    margin: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Serialize)]
struct SweepOutput<'a> {
    country: &'a str,
    factor: Factor,
    points: &'a [SweepPoint],
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

/// Fold command-line weight and margin overrides into the scoring config
fn apply_scoring_overrides(cli: &Cli, config: &Config) -> ScoringConfig {
    let mut scoring = config.scoring.clone().unwrap_or_default();
    let mut weights = scoring.weights.unwrap_or_default();
    let overrides = [
        (Factor::Resilience, cli.resilience),
        (Factor::MarketRoom, cli.market_room),
        (Factor::Wealth, cli.wealth),
    ];
    for (factor, value) in overrides {
        if let Some(v) = value {
            weights = weights.with(factor, v);
        }
    }
    scoring.weights = Some(weights);
    if let Some(margin) = cli.margin {
        scoring.margin_of_safety = Some(margin);
    }
    scoring
}

fn apply_allocation_overrides(
    config: &Config,
    top: Option<usize>,
    capital: Option<f64>,
    deployable_only: bool,
) -> AllocationConfig {
    let mut allocation = config.allocation.clone().unwrap_or_default();
    if top.is_some() {
        allocation.top_n = top;
    }
    if capital.is_some() {
        allocation.total_capital = capital;
    }
    if deployable_only {
        allocation.deployable_only = Some(true);
    }
    allocation
}

fn report_validation(title: &str, errors: Vec<String>) -> ! {
    eprintln!("{}:", title);
    for error in errors {
        eprintln!("  - {}", error);
    }
    std::process::exit(EXIT_CONFIG);
}

fn resolve_dataset(cli: &Cli, config: &Config) -> Dataset {
    let path = cli.dataset.clone().or_else(|| config.dataset.clone());
    match path {
        Some(path) => match load_dataset(&path) {
            Ok(d) => d,
            Err(e) => exit_with(EXIT_DATA, format!("Dataset error: {:#}", e)),
        },
        None => {
            warn!("no dataset configured, using the built-in sample snapshot");
            sample_dataset()
        }
    }
}

fn print_portfolio(portfolio: &Portfolio, format: OutputFormat, allocation_view: bool) {
    let use_colors = output::should_use_colors();
    let rendered = match format {
        OutputFormat::Json => match output::to_json(portfolio) {
            Ok(json) => json,
            Err(e) => exit_with(EXIT_DATA, format!("Output error: {:#}", e)),
        },
        OutputFormat::Tsv => output::format_portfolio_tsv(portfolio),
        OutputFormat::Table if allocation_view => {
            output::format_allocation_table(portfolio, use_colors)
        }
        OutputFormat::Table => output::format_portfolio_table(portfolio, use_colors),
    };
    println!("{}", rendered);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    let config_path = cli.config.as_ref().map(PathBuf::from);

    // Init needs no existing config
    if matches!(cli.command, Some(Commands::Init)) {
        if let Err(e) = charge_roi::config::init::run_init_wizard(config_path) {
            exit_with(EXIT_CONFIG, format!("Init failed: {:#}", e));
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match charge_roi::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate scoring config at startup, command-line overrides included
    let scoring = apply_scoring_overrides(&cli, &config);
    if let Err(errors) = charge_roi::scoring::validate_scoring(&scoring) {
        report_validation("Scoring config errors", errors);
    }
    let params = scoring.params();

    let dataset = resolve_dataset(&cli, &config);
    debug!(
        snapshot = dataset.snapshot.as_deref().unwrap_or("(unlabelled)"),
        markets = dataset.countries.len(),
        "dataset ready"
    );

    let command = cli.command.unwrap_or(Commands::Rank {
        top: None,
        deployable_only: false,
    });

    match command {
        Commands::Rank {
            top,
            deployable_only,
        } => {
            let mut allocation = apply_allocation_overrides(&config, top, None, deployable_only);
            // Ranking shows every market unless asked for fewer
            if top.is_none() {
                allocation.top_n = Some(dataset.countries.len().max(1));
            }
            if let Err(errors) = charge_roi::config::validate_allocation(&allocation) {
                report_validation("Allocation config errors", errors);
            }
            // Ranking never depends on a capital split succeeding
            let settings = EvaluationSettings::new(params, &allocation).ranking_only();
            match evaluate_portfolio(&dataset.countries, &settings) {
                Ok(portfolio) => print_portfolio(&portfolio, cli.format, false),
                Err(e) => exit_with(EXIT_DATA, format!("Scoring error: {}", e)),
            }
        }
        Commands::Allocate {
            capital,
            top,
            deployable_only,
        } => {
            let allocation = apply_allocation_overrides(&config, top, capital, deployable_only);
            if let Err(errors) = charge_roi::config::validate_allocation(&allocation) {
                report_validation("Allocation config errors", errors);
            }
            let settings = EvaluationSettings::new(params, &allocation);
            match evaluate_portfolio(&dataset.countries, &settings) {
                Ok(portfolio) => print_portfolio(&portfolio, cli.format, true),
                Err(e) => exit_with(EXIT_DATA, format!("Allocation error: {}", e)),
            }
        }
        Commands::Audit { country } => {
            let mut intel = IntelTable::with_defaults();
            if let Some(overrides) = &config.intel {
                intel.extend(overrides);
            }
            let report = match audit_country(&dataset.countries, &country, &params, &intel) {
                Ok(r) => r,
                Err(e) => exit_with(EXIT_DATA, format!("Audit error: {}", e)),
            };
            let rendered = match cli.format {
                OutputFormat::Json => match output::to_json(&report) {
                    Ok(json) => json,
                    Err(e) => exit_with(EXIT_DATA, format!("Output error: {:#}", e)),
                },
                OutputFormat::Table | OutputFormat::Tsv => {
                    output::format_audit(&report, output::should_use_colors())
                }
            };
            println!("{}", rendered);
        }
        Commands::WhatIf {
            country,
            factor,
            values,
        } => {
            let record = match dataset.find(&country) {
                Some(r) => r,
                None => exit_with(EXIT_DATA, format!("Unknown country: {}", country.trim())),
            };
            let points = match sweep(record, &params.weights, factor, &values, params.scale) {
                Ok(p) => p,
                Err(e) => exit_with(EXIT_DATA, format!("Scoring error: {}", e)),
            };
            let rendered = match cli.format {
                OutputFormat::Json => {
                    let out = SweepOutput {
                        country: &record.name,
                        factor,
                        points: &points,
                    };
                    match output::to_json(&out) {
                        Ok(json) => json,
                        Err(e) => exit_with(EXIT_DATA, format!("Output error: {:#}", e)),
                    }
                }
                OutputFormat::Tsv => points
                    .iter()
                    .map(|p| format!("{}\t{:.4}", p.weight, p.score))
                    .collect::<Vec<_>>()
                    .join("\n"),
                OutputFormat::Table => {
                    output::format_sweep(&record.name, factor, &points, output::should_use_colors())
                }
            };
            println!("{}", rendered);
        }
        // Handled before the config is loaded
        Commands::Init => {}
    }

    debug!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
