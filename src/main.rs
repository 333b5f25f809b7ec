use anyhow::{Context, Result};
use catalog_ingest::config::{
    DEFAULT_DATA_DIR, DEFAULT_DB_PATH, DEFAULT_PROFESSORS_FILE, DEFAULT_ROADMAP_PREFIX,
};
use catalog_ingest::{run_load, setup_database, IngestError, LoadReport, LoaderConfig};
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load course, professor and roadmap exports into the catalog store
#[derive(Parser, Debug)]
#[command(name = "catalog-ingest")]
#[command(version)]
struct Args {
    /// Directory holding the JSON exports
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "CATALOG_DATA_DIR")]
    data_dir: PathBuf,

    /// SQLite database file
    #[arg(long, default_value = DEFAULT_DB_PATH, env = "CATALOG_DB_PATH")]
    database: PathBuf,

    /// File-name prefix of degree roadmap files
    #[arg(long, default_value = DEFAULT_ROADMAP_PREFIX, env = "CATALOG_ROADMAP_PREFIX")]
    roadmap_prefix: String,

    /// Professor ratings file, relative to the data directory
    #[arg(long, default_value = DEFAULT_PROFESSORS_FILE, env = "CATALOG_PROFESSORS_FILE")]
    professors_file: PathBuf,

    /// Print the run report as JSON after loading
    #[arg(long)]
    report_json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            error!("{:#}", err);
            eprintln!("{}", failure_summary(code));
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = LoaderConfig {
        data_dir: args.data_dir.clone(),
        roadmap_prefix: args.roadmap_prefix.clone(),
        professors_file: args.professors_file.clone(),
    };

    info!(database = %args.database.display(), "opening store");
    let conn = Connection::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    setup_database(&conn)?;

    // conn is dropped on every early return above and below
    let report = run_load(&conn, &config)?;
    log_report(&report);

    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    conn.close()
        .map_err(|(_, e)| e)
        .context("Failed to close database")?;

    println!("✅ All data loaded successfully (Courses, Professors, Roadmaps, Prerequisites)");
    Ok(())
}

fn log_report(report: &LoadReport) {
    info!(
        files = report.files_scanned,
        pathway = report.pathway_files,
        flat = report.flat_files,
        unrecognized = report.unrecognized_files,
        "source files"
    );
    info!(
        courses = report.courses_upserted,
        professors = report.professors_upserted,
        roadmap_rows = report.roadmap_rows_inserted,
        prerequisites = report.prerequisites_inserted,
        pathways_missing = report.pathways_missing,
        elapsed_ms = report.elapsed_ms().unwrap_or_default(),
        "load complete"
    );
}

/// One-line stderr summary; the full error chain goes through tracing
fn failure_summary(code: u8) -> String {
    let kind = match code {
        2 => "invalid input or configuration",
        3 => "store failure",
        _ => "unexpected error",
    };
    format!("❌ Load failed: {} (exit code {})", kind, code)
}

/// 2 = bad input or configuration, 3 = store failure, 1 = anything else
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<IngestError>() {
        Some(e) if e.is_input_error() => 2,
        Some(IngestError::Store { .. }) => 3,
        Some(_) => 1,
        None if err.downcast_ref::<rusqlite::Error>().is_some() => 3,
        None => 1,
    }
}
