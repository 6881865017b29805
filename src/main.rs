use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use covtable::config::Config;
use covtable::coverage::{
    get_total_line, parse_coverage_file, validate_threshold, CoverageRecord, ReportParser,
    Thresholds,
};
use covtable::report;

const CONFIG_FILE: &str = "covtable.toml";
const STDIN_PATH: &str = "-";

#[derive(Parser)]
#[command(name = "covtable")]
#[command(about = "Extract coverage tables from test runner output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: covtable.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log parser decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every coverage row
    Parse {
        /// Captured test output, or - for stdin
        #[arg(default_value = STDIN_PATH)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the `All files` row
    Total {
        /// Captured test output, or - for stdin
        #[arg(default_value = STDIN_PATH)]
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Fail when the `All files` row is below the thresholds
    Check {
        /// Captured test output, or - for stdin
        #[arg(default_value = STDIN_PATH)]
        input: PathBuf,

        /// Minimum statement coverage
        #[arg(long)]
        statements: Option<f64>,

        /// Minimum branch coverage
        #[arg(long)]
        branches: Option<f64>,

        /// Minimum function coverage
        #[arg(long)]
        functions: Option<f64>,

        /// Minimum line coverage
        #[arg(long)]
        lines: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "covtable=debug" } else { "covtable=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let parser = config.parser();

    match cli.command {
        Commands::Parse { input, format } => cmd_parse(&parser, &input, format),
        Commands::Total { input, format } => cmd_total(&parser, &input, format),
        Commands::Check {
            input,
            statements,
            branches,
            functions,
            lines,
        } => {
            let overrides = Thresholds {
                statements,
                branches,
                functions,
                lines,
            };
            cmd_check(&parser, &input, &config.thresholds.overridden_by(&overrides))
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                info!(path = %default_path.display(), "using config file");
                Config::load(default_path)
            } else {
                debug!("no config file, using built-in rules");
                Ok(Config::default())
            }
        }
    }
}

fn read_records(parser: &ReportParser, input: &Path) -> Result<Vec<CoverageRecord>> {
    if input == Path::new(STDIN_PATH) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read coverage log from stdin")?;
        return Ok(parser.parse(&content));
    }

    parse_coverage_file(input, parser)
}

fn cmd_parse(parser: &ReportParser, input: &Path, format: OutputFormat) -> Result<()> {
    let records = read_records(parser, input)?;

    match format {
        OutputFormat::Json => println!("{}", report::to_json(&records)?),
        OutputFormat::Table => report::print_table(&records),
    }

    Ok(())
}

fn cmd_total(parser: &ReportParser, input: &Path, format: OutputFormat) -> Result<()> {
    let records = read_records(parser, input)?;
    let total = get_total_line(&records)
        .ok_or_else(|| anyhow::anyhow!("No 'All files' row found in {}", input.display()))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(total)
                .context("Failed to serialize totals row")?;
            println!("{}", json);
        }
        OutputFormat::Table => report::print_table(std::slice::from_ref(total)),
    }

    Ok(())
}

fn cmd_check(parser: &ReportParser, input: &Path, thresholds: &Thresholds) -> Result<()> {
    if thresholds.is_empty() {
        anyhow::bail!("No thresholds configured. Pass --lines etc. or set [thresholds] in {}", CONFIG_FILE);
    }

    let records = read_records(parser, input)?;
    let total = get_total_line(&records)
        .ok_or_else(|| anyhow::anyhow!("No 'All files' row found in {}", input.display()))?;

    let result = validate_threshold(total, thresholds);
    println!("{}", "Coverage thresholds:".bold());
    result.print_summary();

    if !result.passed {
        println!(
            "\n{} {}",
            "✗".red(),
            format!("Below threshold: {}", result.failed_metrics().join(", ")).red()
        );
        std::process::exit(1);
    }

    println!("\n{} {}", "✓".green(), "All thresholds met".green());
    Ok(())
}
