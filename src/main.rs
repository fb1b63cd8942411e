use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use retail_analytics::{
    insert_snapshot, load_csv_dir, load_snapshot, parse_timestamp, setup_database, verify_count,
    AnalyticsEngine, Clock, FixedClock, Report, ReportConfig, SystemClock,
};

#[derive(Debug, Parser)]
#[command(name = "retail-analytics", version, about = "Retail reporting queries over customers, transactions, products and regions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import customers/transactions/products/regions CSV files into SQLite
    Import {
        /// Directory holding customers.csv, transactions.csv, products.csv [, regions.csv]
        #[arg(long)]
        data_dir: PathBuf,

        #[arg(long, env = "RETAIL_DB", default_value = "retail.db")]
        db: PathBuf,
    },

    /// Run every report against the current database and print JSON
    Report {
        #[arg(long, env = "RETAIL_DB", default_value = "retail.db")]
        db: PathBuf,

        /// Reference time for churn and high-frequency checks (default: now)
        #[arg(long)]
        now: Option<String>,

        /// JSON file overriding report thresholds
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print only one section (e.g. spend_segments)
        #[arg(long)]
        section: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Import { data_dir, db } => run_import(&data_dir, &db),
        Command::Report {
            db,
            now,
            config,
            section,
        } => run_report(&db, now.as_deref(), config, section.as_deref()),
    }
}

fn run_import(data_dir: &Path, db_path: &Path) -> Result<()> {
    println!("🗄️  Import: CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading CSV files from {}...", data_dir.display());
    let snapshot = load_csv_dir(data_dir)?;
    println!(
        "✓ Loaded {} customers, {} products, {} regions, {} transactions",
        snapshot.customers.len(),
        snapshot.products.len(),
        snapshot.regions.len(),
        snapshot.transactions.len()
    );

    // 2. Setup database
    println!("\n🔧 Setting up database...");
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Insert
    println!("\n💾 Inserting rows...");
    let summary = insert_snapshot(&conn, &snapshot)?;
    println!("✓ Inserted: {} transactions", summary.transactions.inserted);
    println!("✓ Skipped duplicates: {}", summary.transactions.duplicates);

    // 4. Verify count
    println!("\n🔍 Verifying database...");
    let count = verify_count(&conn)?;
    println!("✓ Database contains {} transactions", count);

    Ok(())
}

fn run_report(
    db_path: &Path,
    now: Option<&str>,
    config_path: Option<PathBuf>,
    section: Option<&str>,
) -> Result<()> {
    if !db_path.exists() {
        eprintln!("❌ Database not found: {}", db_path.display());
        eprintln!("   Run: retail-analytics import --data-dir <DIR>");
        std::process::exit(1);
    }

    let config = match config_path {
        Some(path) => ReportConfig::from_file(&path)?,
        None => ReportConfig::default(),
    };

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let snapshot = load_snapshot(&conn)?;

    let now = match now {
        Some(raw) => parse_timestamp(raw)?.context("--now must not be blank")?,
        None => SystemClock.now(),
    };
    let engine = AnalyticsEngine::with_clock(config, FixedClock(now));
    let report = Report::generate(&engine, &snapshot);

    let output = match section {
        Some(name) => serde_json::to_string_pretty(&report.section(name)?)?,
        None => report.to_json_pretty()?,
    };
    println!("{}", output);

    Ok(())
}
