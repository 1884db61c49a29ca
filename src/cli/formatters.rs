//! Output formatting module for CLI display
//!
//! Keeps presentation (tables, JSON) apart from the import pipeline.

use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use hortifruti::db::ImportRecord;
use hortifruti::importers::{ExtractedLineItem, ReportAnalysis};
use hortifruti::utils::{format_currency, format_decimal_br};

/// Rows shown in the import preview
pub const PREVIEW_ROWS: usize = 10;

#[derive(Tabled)]
struct ItemPreview {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Sale")]
    sale: String,
    #[tabled(rename = "Markup")]
    markup: String,
}

/// Table with the first extracted rows of a report
pub fn format_preview_table(items: &[ExtractedLineItem]) -> String {
    let preview: Vec<ItemPreview> = items
        .iter()
        .take(PREVIEW_ROWS)
        .map(|item| ItemPreview {
            code: item.code.clone(),
            description: item.description.clone(),
            quantity: format_decimal_br(item.quantity_sold),
            cost: format_currency(item.cost),
            sale: format_currency(item.sale_amount),
            markup: format_decimal_br(item.markup),
        })
        .collect();

    Table::new(preview)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string()
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Sale date")]
    date: String,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Import history table
pub fn format_history_table(records: &[ImportRecord]) -> String {
    let rows: Vec<HistoryRow> = records
        .iter()
        .map(|r| HistoryRow {
            id: r.id.map(|id| id.to_string()).unwrap_or_default(),
            date: r.import_date.format("%d/%m/%Y").to_string(),
            file: r.source_file_name.clone(),
            revenue: r.total_revenue.map(format_currency).unwrap_or_else(|| "-".to_string()),
            status: r.status.as_str().to_string(),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string()
}

/// JSON for a dry run: everything that would be imported
pub fn format_analysis_json(file_name: &str, analysis: &ReportAnalysis) -> String {
    #[derive(Serialize)]
    struct JsonAnalysis<'a> {
        file: &'a str,
        items: &'a [ExtractedLineItem],
        skipped_lines: usize,
        total_sale_amount: String,
    }

    to_json(&JsonAnalysis {
        file: file_name,
        items: &analysis.items,
        skipped_lines: analysis.skipped_lines,
        total_sale_amount: analysis.total_sale_amount().to_string(),
    })
}

/// JSON for a committed import
pub fn format_import_json(record: &ImportRecord, sales: usize, skipped_lines: usize) -> String {
    #[derive(Serialize)]
    struct JsonImport<'a> {
        import: &'a ImportRecord,
        sales: usize,
        skipped_lines: usize,
    }

    to_json(&JsonImport {
        import: record,
        sales,
        skipped_lines,
    })
}

pub fn format_history_json(records: &[ImportRecord]) -> String {
    to_json(&records)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}
