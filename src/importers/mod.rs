// Import module - PDF sales report extraction and parsing

pub mod pdf_text;
pub mod sales_report;

use crate::error::ImportError;

pub use pdf_text::{extract_text, read_report_file, ReportUpload, MAX_REPORT_BYTES};
pub use sales_report::{analyze_report, parse_sales_line, ExtractedLineItem, ReportAnalysis};

/// Extract a PDF report and parse its sale rows.
///
/// Pure: nothing is written. An empty analysis is returned as-is; deciding
/// whether that is an error is up to the caller.
pub fn analyze_pdf(bytes: &[u8]) -> Result<ReportAnalysis, ImportError> {
    let text = extract_text(bytes)?;
    Ok(analyze_report(&text))
}
