use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle of one import batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImportStatus {
    Pending,   // Batch is being written (only visible inside its transaction)
    Completed, // Every line item was persisted
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "PENDING",
            ImportStatus::Completed => "COMPLETED",
            ImportStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ImportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "PENDENTE" => Ok(ImportStatus::Pending),
            "COMPLETED" | "CONCLUIDA" => Ok(ImportStatus::Completed),
            "FAILED" | "ERRO" => Ok(ImportStatus::Failed),
            _ => Err(()),
        }
    }
}

/// One uploaded sales report (import history entry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: Option<i64>,
    pub source_file_name: String,
    pub total_revenue: Option<Decimal>, // Set when the batch commits
    pub import_date: NaiveDate,         // Caller-supplied sale date, not upload time
    pub status: ImportStatus,
}

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub code: Option<String>, // Unique when present; legacy rows may lack it
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub supplier_id: Option<i64>,
}

/// Product supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: Option<i64>,
    pub name: String,
    pub tax_id: Option<String>, // CNPJ
}

/// Sale derived from one report line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Option<i64>,
    pub product_id: i64,
    pub import_id: i64,
    pub quantity_sold: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub unit_sale_price: Decimal,
    pub total_sale_price: Decimal,
    pub sale_date: NaiveDate,
}
