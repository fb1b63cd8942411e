// Retail Analytics - Core Library
// Exposes all modules for use in the CLI and tests

pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod money;
pub mod queries;
pub mod report;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ReportConfig;
pub use db::{
    ImportSummary, InsertStats,
    setup_database, insert_snapshot, load_snapshot, load_csv_dir, verify_count,
};
pub use entities::{Customer, Product, Region, Snapshot, Transaction, parse_timestamp};
pub use money::{ExactAverage, Money, Percent};
pub use queries::{AnalyticsEngine, SpendSegment, YearMonth};
pub use report::{Report, SECTIONS};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
