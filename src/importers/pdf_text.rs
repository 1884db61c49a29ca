// PDF text extraction for uploaded sales reports

use std::any::Any;
use std::panic;
use std::path::Path;
use tracing::{debug, error};

use crate::error::ImportError;

/// Largest report accepted from disk (10 MiB)
pub const MAX_REPORT_BYTES: u64 = 10 * 1024 * 1024;

/// An uploaded report: original file name plus raw bytes
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ReportUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Load a report from disk, enforcing the upload size limit
pub fn read_report_file<P: AsRef<Path>>(path: P) -> Result<ReportUpload, ImportError> {
    let path = path.as_ref();

    let size = std::fs::metadata(path)
        .map_err(|e| ImportError::Extraction(format!("cannot read {:?}: {}", path, e)))?
        .len();
    if size > MAX_REPORT_BYTES {
        return Err(ImportError::Extraction(format!(
            "{:?} is {} bytes; reports are limited to {} bytes",
            path, size, MAX_REPORT_BYTES
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| ImportError::Extraction(format!("cannot read {:?}: {}", path, e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ReportUpload::new(file_name, bytes))
}

/// Extract the text layer of a PDF, line breaks preserved.
///
/// pdf-extract panics on some malformed documents (e.g. a page drawing text
/// without `/Resources`); those panics are reported as extraction errors too.
pub fn extract_text(bytes: &[u8]) -> Result<String, ImportError> {
    let text = match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            error!("Failed to extract text from PDF: {}", e);
            return Err(ImportError::Extraction(format!(
                "could not read the PDF content: {}",
                e
            )));
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!("PDF extraction panicked: {}", reason);
            return Err(ImportError::Extraction(format!(
                "could not read the PDF content: {}",
                reason
            )));
        }
    };

    debug!("Extracted {} characters of text from PDF", text.len());
    Ok(text)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "malformed document".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_corrupt_pdf_is_an_extraction_error() {
        let result = extract_text(b"this is not a pdf document");
        assert!(matches!(result, Err(ImportError::Extraction(_))));
    }

    #[test]
    fn test_empty_buffer_is_an_extraction_error() {
        assert!(matches!(extract_text(&[]), Err(ImportError::Extraction(_))));
    }

    #[test]
    fn test_panic_message_reads_string_payloads() {
        let payload = panic::catch_unwind(|| panic!("no resources on page")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "no resources on page");

        let payload = panic::catch_unwind(|| panic!("page {}", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "page 3");

        let payload = panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "malformed document");
    }

    #[test]
    fn test_page_without_resources_is_an_extraction_error() {
        // One page drawing text with /F1 while no /Resources dictionary exists
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] /Contents 4 0 R >>".to_string(),
            {
                let ops = "BT /F1 12 Tf 72 720 Td (1001Banana) Tj ET";
                format!("<< /Length {} >>\nstream\n{}\nendstream", ops.len(), ops)
            },
        ];
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref_at = pdf.len();
        pdf.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_at
            )
            .as_bytes(),
        );

        let result = panic::catch_unwind(|| extract_text(&pdf));

        let result = result.expect("extraction must not unwind");
        assert!(matches!(result, Err(ImportError::Extraction(_))));
    }

    #[test]
    fn test_read_report_file_keeps_file_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vendas_2024-03-15.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4")
            .unwrap();

        let upload = read_report_file(&path).unwrap();
        assert_eq!(upload.file_name, "vendas_2024-03-15.pdf");
        assert_eq!(upload.bytes, b"%PDF-1.4");
    }

    #[test]
    fn test_read_report_file_missing_file() {
        let result = read_report_file("/nonexistent/relatorio.pdf");
        assert!(matches!(result, Err(ImportError::Extraction(_))));
    }
}
