// Database module - SQLite connection, schema and the import store

pub mod models;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

pub use models::{ImportRecord, ImportStatus, Product, SaleRecord, Supplier};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "HORTIFRUTI_DB";

/// Get the default database path (`$HORTIFRUTI_DB` or ~/.hortifruti/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(DB_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let data_dir = PathBuf::from(home).join(".hortifruti");

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&data_dir).context("Failed to create .hortifruti directory")?;

    Ok(data_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(path) => path,
        None => get_default_db_path()?,
    };
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;
    enable_foreign_keys(&conn)?;

    Ok(conn)
}

/// Open a private in-memory database with the schema applied
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    enable_foreign_keys(&conn)?;
    apply_schema(&conn)?;
    Ok(conn)
}

fn enable_foreign_keys(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;
    Ok(())
}

/// Initialize the database with schema
///
/// Creates the database file if needed and runs the schema SQL. Safe to call
/// on every start; all statements are `IF NOT EXISTS`.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(path) => path,
        None => get_default_db_path()?,
    };

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;
    apply_schema(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("schema.sql"))
        .context("Failed to execute schema")
}

/// Persistence capability needed by the import pipeline.
///
/// Every call runs against whatever connection or transaction the store was
/// built on, so the transactional scope is decided by the caller.
pub trait ImportStore {
    fn find_product_by_code(&self, code: &str) -> Result<Option<Product>>;
    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>>;
    fn insert_product(&self, product: &Product) -> Result<Product>;
    fn find_supplier_by_name(&self, name: &str) -> Result<Option<Supplier>>;
    fn insert_supplier(&self, supplier: &Supplier) -> Result<Supplier>;
    fn insert_import_record(&self, record: &ImportRecord) -> Result<ImportRecord>;
    fn update_import_record(&self, record: &ImportRecord) -> Result<()>;
    fn insert_sale(&self, sale: &SaleRecord) -> Result<i64>;
}

/// [`ImportStore`] over a SQLite connection.
///
/// Build it on a `rusqlite::Transaction` (which derefs to `Connection`) to
/// make every write part of that transaction.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

const PRODUCT_COLUMNS: &str = "id, code, name, description, unit_of_measure, supplier_id";

fn product_from_row(row: &rusqlite::Row) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: Some(row.get(0)?),
        code: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        unit_of_measure: row.get(4)?,
        supplier_id: row.get(5)?,
    })
}

impl ImportStore for SqliteStore<'_> {
    fn find_product_by_code(&self, code: &str) -> Result<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!("SELECT {} FROM products WHERE code = ?1", PRODUCT_COLUMNS),
                [code],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let product = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM products WHERE name = ?1 ORDER BY id LIMIT 1",
                    PRODUCT_COLUMNS
                ),
                [name],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    fn insert_product(&self, product: &Product) -> Result<Product> {
        self.conn.execute(
            "INSERT INTO products (code, name, description, unit_of_measure, supplier_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                product.code,
                product.name,
                product.description,
                product.unit_of_measure,
                product.supplier_id,
            ],
        )?;

        Ok(Product {
            id: Some(self.conn.last_insert_rowid()),
            ..product.clone()
        })
    }

    fn find_supplier_by_name(&self, name: &str) -> Result<Option<Supplier>> {
        let supplier = self
            .conn
            .query_row(
                "SELECT id, name, tax_id FROM suppliers WHERE name = ?1",
                [name],
                |row| {
                    Ok(Supplier {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        tax_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(supplier)
    }

    fn insert_supplier(&self, supplier: &Supplier) -> Result<Supplier> {
        self.conn.execute(
            "INSERT INTO suppliers (name, tax_id) VALUES (?1, ?2)",
            params![supplier.name, supplier.tax_id],
        )?;

        Ok(Supplier {
            id: Some(self.conn.last_insert_rowid()),
            ..supplier.clone()
        })
    }

    fn insert_import_record(&self, record: &ImportRecord) -> Result<ImportRecord> {
        self.conn.execute(
            "INSERT INTO import_history (source_file_name, total_revenue, import_date, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.source_file_name,
                record.total_revenue.as_ref().map(|d| d.to_string()),
                record.import_date,
                record.status.as_str(),
            ],
        )?;

        Ok(ImportRecord {
            id: Some(self.conn.last_insert_rowid()),
            ..record.clone()
        })
    }

    fn update_import_record(&self, record: &ImportRecord) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| anyhow!("Cannot update an import record that was never saved"))?;

        let updated = self.conn.execute(
            "UPDATE import_history
             SET source_file_name = ?1, total_revenue = ?2, import_date = ?3, status = ?4
             WHERE id = ?5",
            params![
                record.source_file_name,
                record.total_revenue.as_ref().map(|d| d.to_string()),
                record.import_date,
                record.status.as_str(),
                id,
            ],
        )?;

        if updated != 1 {
            return Err(anyhow!("Import record #{} not found", id));
        }
        Ok(())
    }

    fn insert_sale(&self, sale: &SaleRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sales (
                product_id, import_id, quantity_sold, unit_cost, total_cost,
                unit_sale_price, total_sale_price, sale_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                sale.product_id,
                sale.import_id,
                sale.quantity_sold.to_string(),
                sale.unit_cost.to_string(),
                sale.total_cost.to_string(),
                sale.unit_sale_price.to_string(),
                sale.total_sale_price.to_string(),
                sale.sale_date,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }
}

fn import_record_from_row(row: &rusqlite::Row) -> Result<ImportRecord, rusqlite::Error> {
    let status: String = row.get(4)?;
    Ok(ImportRecord {
        id: Some(row.get(0)?),
        source_file_name: row.get(1)?,
        total_revenue: get_optional_decimal_value(row, 2)?,
        import_date: row.get(3)?,
        status: status.parse::<ImportStatus>().map_err(|_| {
            rusqlite::Error::InvalidColumnType(4, "status".to_string(), rusqlite::types::Type::Text)
        })?,
    })
}

/// Import history, most recent sale date first
pub fn list_import_history(conn: &Connection) -> Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, source_file_name, total_revenue, import_date, status
         FROM import_history
         ORDER BY import_date DESC, id DESC",
    )?;

    let records = stmt
        .query_map([], import_record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Get a single import record by id
pub fn get_import_record(conn: &Connection, id: i64) -> Result<Option<ImportRecord>> {
    let record = conn
        .query_row(
            "SELECT id, source_file_name, total_revenue, import_date, status
             FROM import_history WHERE id = ?1",
            [id],
            import_record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Sales written by one import, in insertion order
pub fn list_sales_for_import(conn: &Connection, import_id: i64) -> Result<Vec<SaleRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, product_id, import_id, quantity_sold, unit_cost, total_cost,
                unit_sale_price, total_sale_price, sale_date
         FROM sales
         WHERE import_id = ?1
         ORDER BY id ASC",
    )?;

    let sales = stmt
        .query_map([import_id], |row| {
            Ok(SaleRecord {
                id: Some(row.get(0)?),
                product_id: row.get(1)?,
                import_id: row.get(2)?,
                quantity_sold: get_decimal_value(row, 3)?,
                unit_cost: get_decimal_value(row, 4)?,
                total_cost: get_decimal_value(row, 5)?,
                unit_sale_price: get_decimal_value(row, 6)?,
                total_sale_price: get_decimal_value(row, 7)?,
                sale_date: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sales)
}

/// Count rows of one of the pipeline tables
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    if !matches!(table, "suppliers" | "products" | "import_history" | "sales") {
        return Err(anyhow!("Unknown table: {}", table));
    }
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

/// Helper to read Decimal from SQLite (handles both INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::{Type, ValueRef};

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })?;
            Decimal::from_str(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => Decimal::try_from(f).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Real, Box::new(e))
        }),
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            Type::Null,
        )),
    }
}

/// Helper to read optional Decimal from SQLite
fn get_optional_decimal_value(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<Option<Decimal>, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        _ => get_decimal_value(row, idx).map(Some),
    }
}
