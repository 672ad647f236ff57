//! mysql-sp-extract: export stored routines from a MySQL-protocol database
//! as re-runnable SQL files.

use clap::{Args, Parser, Subcommand};
use mysql_sp_extract::{
    CatalogReader, Config, Exporter, ExtractError, RoutineKind, RoutineRef, RoutineSource,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mysql-sp-extract")]
#[command(about = "Export stored procedures and functions from MemSQL/SingleStore/MySQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (flags and env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

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

/// Connection flags shared by every subcommand. Each falls back to the
/// matching environment variable, then to the config file.
#[derive(Args)]
struct ConnectionArgs {
    /// Database host
    #[arg(long, env = "DB_HOST")]
    host: Option<String>,

    /// Database port
    #[arg(long, env = "DB_PORT")]
    port: Option<u16>,

    /// Login user
    #[arg(long, env = "DB_USER")]
    user: Option<String>,

    /// Login password
    #[arg(long, env = "DB_PASS")]
    password: Option<String>,

    /// Database (schema) holding the routines
    #[arg(long, env = "DB_NAME")]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract all routines to SQL files
    Run {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Directory receiving one .sql file per routine
        #[arg(long, env = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Extract procedures only, skip functions
        #[arg(long)]
        no_functions: bool,
    },

    /// List routines without writing any file
    List {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// List procedures only, skip functions
        #[arg(long)]
        no_functions: bool,
    },

    /// Test the database connection
    HealthCheck {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
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

async fn run() -> Result<(), ExtractError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(ExtractError::Config)?;

    let mut config = match cli.config {
        Some(ref path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Run {
            connection,
            output_dir,
            no_functions,
        } => {
            apply_connection_args(&mut config, connection);
            if let Some(dir) = output_dir {
                config.export.output_dir = dir;
            }
            if no_functions {
                config.export.include_functions = false;
            }
            config.validate()?;

            let mut reader = CatalogReader::connect(&config.connection).await?;
            let exporter = Exporter::new(
                config.export.output_dir.clone(),
                config.connection.database.clone(),
            );
            let result = exporter
                .extract_all(&mut reader, config.export.include_functions)
                .await;
            close_session(reader).await;
            let report = result?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("\nExtraction completed!");
                println!("  Procedures written: {}", report.procedures_written);
                if config.export.include_functions {
                    println!("  Functions written: {}", report.functions_written);
                }
                if !report.skipped_routines.is_empty() {
                    println!("  Skipped: {:?}", report.skipped_routines);
                }
                println!("  Duration: {:.2}s", report.duration_seconds);
                println!("  Output directory: {}", report.output_dir.display());
            }
        }

        Commands::List {
            connection,
            no_functions,
        } => {
            apply_connection_args(&mut config, connection);
            if no_functions {
                config.export.include_functions = false;
            }
            config.validate()?;

            let mut reader = CatalogReader::connect(&config.connection).await?;
            let result = list_routines(&mut reader, config.export.include_functions).await;
            close_session(reader).await;
            let routines = result?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&routines)?);
            } else {
                for routine in &routines {
                    println!("{:<9}  {}", routine.kind.sql_keyword(), routine.name);
                }
                println!(
                    "\n{} routine(s) in '{}'",
                    routines.len(),
                    config.connection.database
                );
            }
        }

        Commands::HealthCheck { connection } => {
            apply_connection_args(&mut config, connection);
            config.validate()?;

            let start = Instant::now();
            let mut reader = CatalogReader::connect(&config.connection).await?;
            let ping = reader.ping().await;
            let latency_ms = start.elapsed().as_millis() as u64;
            let version = reader.server_version().await.ok();
            close_session(reader).await;
            ping?;

            if cli.output_json {
                let health = serde_json::json!({
                    "connected": true,
                    "latency_ms": latency_ms,
                    "server_version": version,
                });
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("Health Check Results:");
                println!("  Connection: OK ({}ms)", latency_ms);
                if let Some(version) = version {
                    println!("  Server version: {}", version);
                }
            }
        }
    }

    Ok(())
}

fn apply_connection_args(config: &mut Config, args: ConnectionArgs) {
    if let Some(host) = args.host {
        config.connection.host = host;
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if let Some(user) = args.user {
        config.connection.user = user;
    }
    if let Some(password) = args.password {
        config.connection.password = password;
    }
    if let Some(database) = args.database {
        config.connection.database = database;
    }
}

async fn list_routines(
    reader: &mut CatalogReader,
    include_functions: bool,
) -> Result<Vec<RoutineRef>, ExtractError> {
    let mut routines = reader.list_routines(RoutineKind::Procedure).await?;
    if include_functions {
        routines.extend(reader.list_routines(RoutineKind::Function).await?);
    }
    Ok(routines)
}

/// Close the session on every path; a close failure never masks the
/// command's own result.
async fn close_session(reader: CatalogReader) {
    if let Err(e) = reader.close().await {
        warn!("Error closing session: {}", e);
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
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
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
