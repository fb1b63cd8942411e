use crate::entities::{parse_timestamp, Customer, Product, Region, Snapshot, Transaction};
use crate::money::Money;
use anyhow::{ensure, Context, Result};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Storage format for transaction dates
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode so snapshot reads don't block ingestion
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Reference tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS regions (
            region_id INTEGER PRIMARY KEY,
            region_name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            customer_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            region_id INTEGER REFERENCES regions(region_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS products (
            product_id INTEGER PRIMARY KEY,
            product_name TEXT NOT NULL,
            category TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Transactions (append-only facts, amounts in cents)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            transaction_id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL REFERENCES customers(customer_id),
            product_id INTEGER NOT NULL REFERENCES products(product_id),
            transaction_date TEXT,
            amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_customer ON transactions(customer_id, transaction_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_product ON transactions(product_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// INSERTS (idempotent: rows with an existing primary key are skipped)
// ============================================================================

/// Inserted vs skipped counts for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertStats {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Per-table results of importing a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub regions: InsertStats,
    pub customers: InsertStats,
    pub products: InsertStats,
    pub transactions: InsertStats,
}

fn record_insert(result: rusqlite::Result<usize>, stats: &mut InsertStats) -> Result<()> {
    match result {
        Ok(_) => {
            stats.inserted += 1;
            Ok(())
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            stats.duplicates += 1;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn insert_regions(conn: &Connection, regions: &[Region]) -> Result<InsertStats> {
    let mut stats = InsertStats::default();
    let mut stmt = conn.prepare("INSERT INTO regions (region_id, region_name) VALUES (?1, ?2)")?;

    for r in regions {
        record_insert(stmt.execute(params![r.region_id, r.region_name]), &mut stats)?;
    }

    Ok(stats)
}

pub fn insert_customers(conn: &Connection, customers: &[Customer]) -> Result<InsertStats> {
    let mut stats = InsertStats::default();
    let mut stmt =
        conn.prepare("INSERT INTO customers (customer_id, name, region_id) VALUES (?1, ?2, ?3)")?;

    for c in customers {
        record_insert(stmt.execute(params![c.customer_id, c.name, c.region_id]), &mut stats)?;
    }

    Ok(stats)
}

pub fn insert_products(conn: &Connection, products: &[Product]) -> Result<InsertStats> {
    let mut stats = InsertStats::default();
    let mut stmt = conn.prepare(
        "INSERT INTO products (product_id, product_name, category) VALUES (?1, ?2, ?3)",
    )?;

    for p in products {
        record_insert(
            stmt.execute(params![p.product_id, p.product_name, p.category]),
            &mut stats,
        )?;
    }

    Ok(stats)
}

pub fn insert_transactions(conn: &Connection, transactions: &[Transaction]) -> Result<InsertStats> {
    let mut stats = InsertStats::default();
    let mut stmt = conn.prepare(
        "INSERT INTO transactions (
            transaction_id, customer_id, product_id, transaction_date, amount_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for t in transactions {
        ensure!(
            !t.amount_spent.is_negative(),
            "transaction {} has negative amount {}",
            t.transaction_id,
            t.amount_spent
        );

        let date = t.transaction_date.map(|d| d.format(DATE_FORMAT).to_string());
        record_insert(
            stmt.execute(params![
                t.transaction_id,
                t.customer_id,
                t.product_id,
                date,
                t.amount_spent.cents(),
            ]),
            &mut stats,
        )?;
    }

    Ok(stats)
}

/// Insert all four relations in one write transaction
pub fn insert_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;

    let summary = ImportSummary {
        regions: insert_regions(&tx, &snapshot.regions)?,
        customers: insert_customers(&tx, &snapshot.customers)?,
        products: insert_products(&tx, &snapshot.products)?,
        transactions: insert_transactions(&tx, &snapshot.transactions)?,
    };

    tx.commit()?;

    info!(
        customers = summary.customers.inserted,
        products = summary.products.inserted,
        regions = summary.regions.inserted,
        transactions = summary.transactions.inserted,
        duplicates = summary.transactions.duplicates,
        "snapshot imported"
    );
    Ok(summary)
}

// ============================================================================
// SNAPSHOT READS
// ============================================================================

fn get_regions(conn: &Connection) -> Result<Vec<Region>> {
    let mut stmt = conn.prepare("SELECT region_id, region_name FROM regions ORDER BY region_id")?;

    let regions = stmt
        .query_map([], |row| {
            Ok(Region {
                region_id: row.get(0)?,
                region_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(regions)
}

fn get_customers(conn: &Connection) -> Result<Vec<Customer>> {
    let mut stmt =
        conn.prepare("SELECT customer_id, name, region_id FROM customers ORDER BY customer_id")?;

    let customers = stmt
        .query_map([], |row| {
            Ok(Customer {
                customer_id: row.get(0)?,
                name: row.get(1)?,
                region_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(customers)
}

fn get_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT product_id, product_name, category FROM products ORDER BY product_id",
    )?;

    let products = stmt
        .query_map([], |row| {
            Ok(Product {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                category: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(products)
}

fn get_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT transaction_id, customer_id, product_id, transaction_date, amount_cents
         FROM transactions
         ORDER BY transaction_id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let date: Option<String> = row.get(3)?;
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                date,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(transaction_id, customer_id, product_id, date, cents)| -> Result<Transaction> {
            let transaction_date = match date {
                Some(raw) => parse_timestamp(&raw)
                    .with_context(|| format!("Bad date stored for transaction {}", transaction_id))?,
                None => None,
            };
            Ok(Transaction::new(
                transaction_id,
                customer_id,
                product_id,
                transaction_date,
                Money::from_cents(cents),
            ))
        })
        .collect()
}

/// Read all four tables inside one read transaction, so joins across them
/// see a single point in time even while another connection is writing.
pub fn load_snapshot(conn: &Connection) -> Result<Snapshot> {
    let tx = conn.unchecked_transaction()?;

    let snapshot = Snapshot::new(
        get_customers(&tx)?,
        get_transactions(&tx)?,
        get_products(&tx)?,
        get_regions(&tx)?,
    );

    tx.finish()?;

    info!(
        customers = snapshot.customers.len(),
        transactions = snapshot.transactions.len(),
        products = snapshot.products.len(),
        regions = snapshot.regions.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// CSV INGESTION
// ============================================================================

/// Raw transactions.csv row, validated into a `Transaction`
#[derive(Debug, Deserialize)]
struct TransactionRecord {
    transaction_id: i64,
    customer_id: i64,
    product_id: i64,
    #[serde(default)]
    transaction_date: String,
    amount_spent: String,
}

impl TransactionRecord {
    fn into_transaction(self) -> Result<Transaction> {
        let amount: Money = self
            .amount_spent
            .parse()
            .with_context(|| format!("Bad amount for transaction {}", self.transaction_id))?;
        ensure!(
            !amount.is_negative(),
            "transaction {} has negative amount {}",
            self.transaction_id,
            amount
        );

        let date = parse_timestamp(&self.transaction_date)
            .with_context(|| format!("Bad date for transaction {}", self.transaction_id))?;

        Ok(Transaction::new(
            self.transaction_id,
            self.customer_id,
            self.product_id,
            date,
            amount,
        ))
    }
}

fn read_csv<T: DeserializeOwned, R: std::io::Read>(mut rdr: csv::Reader<R>, what: &str) -> Result<Vec<T>> {
    let mut rows = Vec::new();

    for (line, result) in rdr.deserialize().enumerate() {
        // +2: header line, then 1-based
        let row: T = result.with_context(|| format!("Failed to deserialize {} (line {})", what, line + 2))?;
        rows.push(row);
    }

    Ok(rows)
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))
}

pub fn load_customers_csv(path: &Path) -> Result<Vec<Customer>> {
    read_csv(open_csv(path)?, "customer")
}

pub fn load_products_csv(path: &Path) -> Result<Vec<Product>> {
    read_csv(open_csv(path)?, "product")
}

pub fn load_regions_csv(path: &Path) -> Result<Vec<Region>> {
    read_csv(open_csv(path)?, "region")
}

pub fn load_transactions_csv(path: &Path) -> Result<Vec<Transaction>> {
    parse_transactions(open_csv(path)?)
}

fn parse_transactions<R: std::io::Read>(rdr: csv::Reader<R>) -> Result<Vec<Transaction>> {
    read_csv::<TransactionRecord, _>(rdr, "transaction")?
        .into_iter()
        .map(TransactionRecord::into_transaction)
        .collect()
}

/// Load `customers.csv`, `transactions.csv`, `products.csv` and, if present,
/// `regions.csv` from a directory.
pub fn load_csv_dir(dir: &Path) -> Result<Snapshot> {
    let regions_path = dir.join("regions.csv");
    let regions = if regions_path.exists() {
        load_regions_csv(&regions_path)?
    } else {
        warn!(dir = %dir.display(), "no regions.csv, regional reports will be empty");
        Vec::new()
    };

    let snapshot = Snapshot::new(
        load_customers_csv(&dir.join("customers.csv"))?,
        load_transactions_csv(&dir.join("transactions.csv"))?,
        load_products_csv(&dir.join("products.csv"))?,
        regions,
    );

    let orphans = snapshot.orphaned_transactions().len();
    if orphans > 0 {
        warn!(orphans, "transactions reference unknown customers or products");
    }

    Ok(snapshot)
}
