//! Sales report import coordinator
//!
//! Runs one upload end to end:
//!
//! 1. extract the PDF text and parse the sale rows (no database access);
//! 2. open a single SQLite transaction;
//! 3. create the import record, reconcile every row with the catalog and
//!    write its sale;
//! 4. store the aggregated revenue and commit.
//!
//! Any failure in steps 2-4 rolls back every write of the attempt, so the
//! import history never shows a partial batch.

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{error, info};

use crate::catalog::resolve_product;
use crate::db::{ImportRecord, ImportStatus, ImportStore, SaleRecord, SqliteStore};
use crate::error::ImportError;
use crate::importers::{analyze_pdf, analyze_report, ExtractedLineItem, ReportUpload};

/// Values stored on a sale, derived from one extracted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedSale {
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub unit_sale_price: Decimal,
    pub total_sale_price: Decimal,
}

/// Round a currency amount to cents (half away from zero), always 2 decimals
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Unit values are totals divided by the quantity sold, rounded to cents
pub fn derive_sale_values(item: &ExtractedLineItem) -> anyhow::Result<DerivedSale> {
    if item.quantity_sold <= Decimal::ZERO {
        return Err(anyhow!(
            "Invalid quantity {} for product {}",
            item.quantity_sold,
            item.code
        ));
    }

    let per_unit = |total: Decimal| {
        total
            .checked_div(item.quantity_sold)
            .map(round_money)
            .ok_or_else(|| anyhow!("Unit value overflow for product {}", item.code))
    };

    Ok(DerivedSale {
        unit_cost: per_unit(item.cost)?,
        total_cost: item.cost,
        unit_sale_price: per_unit(item.sale_amount)?,
        total_sale_price: item.sale_amount,
    })
}

/// Import an uploaded PDF sales report.
///
/// `import_date` stamps the import record and every sale; it is the date the
/// sales happened, not the upload time.
pub fn import_sales_report(
    conn: &mut Connection,
    upload: &ReportUpload,
    import_date: NaiveDate,
) -> Result<ImportRecord, ImportError> {
    info!("Starting import of {} for {}", upload.file_name, import_date);

    let analysis = analyze_pdf(&upload.bytes)?;
    persist_batch(conn, &upload.file_name, &analysis.items, import_date)
}

/// Import a report whose text was already extracted
pub fn import_report_text(
    conn: &mut Connection,
    file_name: &str,
    text: &str,
    import_date: NaiveDate,
) -> Result<ImportRecord, ImportError> {
    let analysis = analyze_report(text);
    persist_batch(conn, file_name, &analysis.items, import_date)
}

/// Persist an analyzed batch atomically.
///
/// Fails with [`ImportError::NoValidRecords`] before touching the database
/// when `items` is empty.
pub fn persist_batch(
    conn: &mut Connection,
    file_name: &str,
    items: &[ExtractedLineItem],
    import_date: NaiveDate,
) -> Result<ImportRecord, ImportError> {
    if items.is_empty() {
        return Err(ImportError::NoValidRecords);
    }

    let tx = conn
        .transaction()
        .map_err(|e| ImportError::from_persistence(e.into()))?;

    // Dropping `tx` on any early exit rolls it back
    let outcome = write_batch(&SqliteStore::new(&tx), file_name, items, import_date);
    match outcome {
        Ok(record) => {
            tx.commit()
                .context("Failed to commit import transaction")
                .map_err(ImportError::from_persistence)?;

            info!(
                "Import #{} completed: {} sales, revenue {}",
                record.id.unwrap_or_default(),
                items.len(),
                record.total_revenue.unwrap_or_default()
            );
            Ok(record)
        }
        Err(err) => {
            error!("Import transaction failed, rolling back: {:#}", err);
            if let Err(rollback_err) = tx.rollback() {
                error!("Rollback failed: {}", rollback_err);
            }
            Err(ImportError::from_persistence(err))
        }
    }
}

/// Write the import record and all sales through `store`.
///
/// The record is inserted as `Pending` and switched to `Completed` together
/// with its revenue once every sale is written.
pub fn write_batch<S: ImportStore + ?Sized>(
    store: &S,
    file_name: &str,
    items: &[ExtractedLineItem],
    import_date: NaiveDate,
) -> anyhow::Result<ImportRecord> {
    let mut record = store
        .insert_import_record(&ImportRecord {
            id: None,
            source_file_name: file_name.to_string(),
            total_revenue: None,
            import_date,
            status: ImportStatus::Pending,
        })
        .context("Failed to create import record")?;
    let import_id = record
        .id
        .ok_or_else(|| anyhow!("Import record was saved without an id"))?;
    info!("Import record #{} created", import_id);

    let mut total_revenue = Decimal::ZERO;

    for item in items {
        let product = resolve_product(store, &item.code, &item.description)
            .with_context(|| format!("Failed to resolve product {}", item.code))?;
        let product_id = product
            .id
            .ok_or_else(|| anyhow!("Product {} has no id", item.code))?;

        let derived = derive_sale_values(item)?;
        store
            .insert_sale(&SaleRecord {
                id: None,
                product_id,
                import_id,
                quantity_sold: item.quantity_sold,
                unit_cost: derived.unit_cost,
                total_cost: derived.total_cost,
                unit_sale_price: derived.unit_sale_price,
                total_sale_price: derived.total_sale_price,
                sale_date: import_date,
            })
            .with_context(|| format!("Failed to save sale of product {}", item.code))?;

        total_revenue += item.sale_amount;
    }

    record.total_revenue = Some(round_money(total_revenue));
    record.status = ImportStatus::Completed;
    store
        .update_import_record(&record)
        .context("Failed to finalize import record")?;

    Ok(record)
}
