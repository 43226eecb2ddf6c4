//! trivia-loader CLI - Load Open Trivia DB questions into PostgreSQL.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use trivia_loader::{infer_schema, Config, LoadError, Orchestrator};

#[derive(Parser)]
#[command(name = "trivia-loader")]
#[command(about = "Load Open Trivia DB questions into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the API URL for the configured question request
    Url,

    /// List trivia categories
    Categories,

    /// Fetch questions and print the inferred CREATE TABLE statement
    Schema,

    /// Fetch questions and load them into the target table
    Load {
        /// Delete the time range covered by the new rows before inserting
        #[arg(long)]
        purge: bool,

        /// Override the number of questions to fetch
        #[arg(long)]
        amount: Option<u32>,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), LoadError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    if let Commands::Load {
        amount: Some(amount),
        ..
    } = cli.command
    {
        config.trivia.amount = amount;
        config.validate()?;
    }

    let orchestrator = Orchestrator::new(config)?;

    match cli.command {
        Commands::Url => {
            println!("{}", orchestrator.questions_url());
        }

        Commands::Categories => {
            let categories = orchestrator.categories().await?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                for category in categories {
                    println!("{:>4}  {}", category.id, category.name);
                }
            }
        }

        Commands::Schema => {
            let dataset = orchestrator.fetch().await?;
            println!(
                "{}",
                infer_schema(&orchestrator.config().load.table, &dataset)
            );
        }

        Commands::Load { purge, .. } => {
            let purge = purge || orchestrator.config().load.purge_before_load;
            let report = orchestrator.run(purge).await?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nLoad completed!");
                println!("  Table: {}", report.table);
                println!("  Rows fetched: {}", report.rows_fetched);
                if let Some(deleted) = report.rows_deleted {
                    println!("  Rows deleted: {}", deleted);
                }
                println!("  Rows inserted: {}", report.rows_inserted);
            }
        }

        Commands::HealthCheck => {
            let result = orchestrator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Target (PostgreSQL {}): {} ({}ms)",
                    result.target,
                    if result.connected { "OK" } else { "FAILED" },
                    result.latency_ms
                );
                if let Some(ref err) = result.error {
                    println!("    Error: {}", err);
                }
            }

            if !result.connected {
                return Err(LoadError::connection(
                    result.target,
                    result.error.unwrap_or_else(|| "health check failed".to_string()),
                ));
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
