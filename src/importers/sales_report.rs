// Sales report parser - Extract sold items from the POS sales report text
//
// Each sale row is exported without delimiters:
//   <code><description><quantity><cost><real cost><sale amount><markup>
// e.g. "1001Banana Prata1.234,00100,00110,001.300,0050,00"
// Money fields always use Brazilian format with exactly two decimals, so the
// row is matched from the end and the description takes whatever is left.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use tracing::{debug, info};

/// Brazilian money field: thousands grouped by '.', two decimals after ','
const MONEY: &str = r"[0-9]{1,3}(?:\.[0-9]{3})*,[0-9]{2}";

static SALES_LINE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"^(?P<code>[0-9]+)(?P<description>.+?)(?P<quantity>{m})(?P<cost>{m})(?P<real_cost>{m})(?P<sale>{m})(?P<markup>-?{m})$",
        m = MONEY
    );
    Regex::new(&pattern).expect("sales line pattern must compile")
});

/// Shortest line that can still hold a sale row
const MIN_LINE_CHARS: usize = 10;

/// A sale row extracted from the report, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLineItem {
    pub code: String,
    pub description: String,
    pub quantity_sold: Decimal,
    pub cost: Decimal,
    pub real_cost: Decimal,
    pub sale_amount: Decimal,
    pub markup: Decimal, // Informative only, may be negative
}

/// Result of scanning a whole report
#[derive(Debug, Clone, Default)]
pub struct ReportAnalysis {
    /// Matched rows in report order
    pub items: Vec<ExtractedLineItem>,
    /// Non-blank lines that were not sale rows (headers, totals, noise)
    pub skipped_lines: usize,
}

impl ReportAnalysis {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_sale_amount(&self) -> Decimal {
        self.items.iter().map(|item| item.sale_amount).sum()
    }
}

/// Scan the report text line by line, keeping every sale row in order
pub fn analyze_report(text: &str) -> ReportAnalysis {
    let mut analysis = ReportAnalysis::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_sales_line(line) {
            Some(item) => analysis.items.push(item),
            None => {
                debug!("Skipping non-sale line: {}", line);
                analysis.skipped_lines += 1;
            }
        }
    }

    info!(
        "Extracted {} sale rows from report ({} lines skipped)",
        analysis.items.len(),
        analysis.skipped_lines
    );

    analysis
}

/// Parse one trimmed report line; `None` when it is not a sale row
pub fn parse_sales_line(line: &str) -> Option<ExtractedLineItem> {
    if line.chars().count() < MIN_LINE_CHARS
        || !line.starts_with(|c: char| c.is_ascii_digit())
        || !line.chars().any(|c| c.is_ascii_alphabetic())
    {
        return None;
    }

    let captures = SALES_LINE.captures(line)?;
    let field = |name: &str| captures.name(name).map(|m| m.as_str()).unwrap_or("");

    let quantity_sold = parse_brazilian_decimal(field("quantity")).ok()?;
    let sale_amount = parse_brazilian_decimal(field("sale")).ok()?;
    if quantity_sold <= Decimal::ZERO {
        return None;
    }

    Some(ExtractedLineItem {
        code: field("code").trim().to_string(),
        description: normalize_description(field("description")),
        quantity_sold,
        cost: parse_brazilian_decimal(field("cost")).ok()?,
        real_cost: parse_brazilian_decimal(field("real_cost")).ok()?,
        sale_amount,
        markup: parse_brazilian_decimal(field("markup")).ok()?,
    })
}

/// Trim and collapse whitespace runs to a single space
fn normalize_description(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse Brazilian number format: "1.234,56" → 1234.56
///
/// Dots are thousands separators and are dropped; the comma is the decimal
/// point. A leading '-' is kept.
pub fn parse_brazilian_decimal(s: &str) -> Result<Decimal> {
    let normalized = s.trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).context(format!("Failed to parse decimal: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_brazilian_decimal() {
        assert_eq!(parse_brazilian_decimal("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_brazilian_decimal("1.234.567,89").unwrap(), dec!(1234567.89));
        assert_eq!(parse_brazilian_decimal("0,50").unwrap(), dec!(0.50));
        assert_eq!(parse_brazilian_decimal("-12,30").unwrap(), dec!(-12.30));
        assert_eq!(parse_brazilian_decimal("100").unwrap(), dec!(100));
        assert!(parse_brazilian_decimal("abc").is_err());
        assert!(parse_brazilian_decimal("").is_err());
    }

    #[test]
    fn test_parse_line_with_thousands_groups() {
        let item = parse_sales_line("1001Banana Prata1.234,00100,00110,001.300,0050,00").unwrap();

        assert_eq!(item.code, "1001");
        assert_eq!(item.description, "Banana Prata");
        assert_eq!(item.quantity_sold, dec!(1234.00));
        assert_eq!(item.cost, dec!(100.00));
        assert_eq!(item.real_cost, dec!(110.00));
        assert_eq!(item.sale_amount, dec!(1300.00));
        assert_eq!(item.markup, dec!(50.00));
    }

    #[test]
    fn test_parse_line_with_accented_description() {
        let item = parse_sales_line("2002Maçã500,00250,00260,00600,00140,00").unwrap();

        assert_eq!(item.code, "2002");
        assert_eq!(item.description, "Maçã");
        assert_eq!(item.quantity_sold, dec!(500.00));
        assert_eq!(item.cost, dec!(250.00));
        assert_eq!(item.real_cost, dec!(260.00));
        assert_eq!(item.sale_amount, dec!(600.00));
        assert_eq!(item.markup, dec!(140.00));
    }

    #[test]
    fn test_parse_line_with_negative_markup() {
        let item = parse_sales_line("77Tomate Italiano12,0030,0031,5028,00-11,11").unwrap();

        assert_eq!(item.code, "77");
        assert_eq!(item.description, "Tomate Italiano");
        assert_eq!(item.quantity_sold, dec!(12.00));
        assert_eq!(item.sale_amount, dec!(28.00));
        assert_eq!(item.markup, dec!(-11.11));
    }

    #[test]
    fn test_description_whitespace_is_collapsed() {
        let item =
            parse_sales_line("3003  Alface    Crespa   Hidro 10,005,005,5015,0050,00").unwrap();
        assert_eq!(item.description, "Alface Crespa Hidro");
    }

    #[test]
    fn test_short_lines_are_rejected() {
        assert!(parse_sales_line("1Ab").is_none());
        assert!(parse_sales_line("12345Abc").is_none());
    }

    #[test]
    fn test_lines_not_starting_with_digit_are_rejected() {
        assert!(parse_sales_line("Banana Prata1.234,00100,00110,001.300,0050,00").is_none());
        assert!(parse_sales_line(" 1001Banana1,00100,00110,00130,0050,00").is_none());
    }

    #[test]
    fn test_lines_without_letters_are_rejected() {
        assert!(parse_sales_line("1001 1,00100,00110,00130,0050,00").is_none());
        assert!(parse_sales_line("15/03/2024 12:00:00").is_none());
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        assert!(parse_sales_line("1001Banana Prata0,00100,00110,00130,0050,00").is_none());
    }

    #[test]
    fn test_lines_with_wrong_money_shape_are_rejected() {
        // Three decimals on the last field
        assert!(parse_sales_line("1001Banana Prata1,00100,00110,00130,0050,000").is_none());
        // Only four money fields
        assert!(parse_sales_line("1001Banana Prata1,00100,00110,00130,00").is_none());
        // Header line
        assert!(parse_sales_line("Código Descrição Qtd Custo Custo Real Venda Markup").is_none());
    }

    #[test]
    fn test_analyzer_keeps_matching_lines_in_order() {
        let text = "\
RELATÓRIO DE VENDAS POR PRODUTO
Período: 15/03/2024 a 15/03/2024
Código Descrição Qtd Custo Custo Real Venda Markup
1001Banana Prata1.234,00100,00110,001.300,0050,00

2002Maçã500,00250,00260,00600,00140,00
Página 1 de 2
3003Alface Crespa10,005,005,5015,0050,00
TOTAL GERAL 1.744,00355,00375,501.915,00
";
        let analysis = analyze_report(text);

        let codes: Vec<&str> = analysis.items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["1001", "2002", "3003"]);
        assert_eq!(analysis.skipped_lines, 5);
        assert_eq!(analysis.total_sale_amount(), dec!(1915.00));
    }

    #[test]
    fn test_analyzer_handles_crlf_and_indentation() {
        let text = "   1001Banana Prata1.234,00100,00110,001.300,0050,00   \r\n\r\n";
        let analysis = analyze_report(text);
        assert_eq!(analysis.items.len(), 1);
        assert_eq!(analysis.skipped_lines, 0);
    }

    #[test]
    fn test_analyzer_on_empty_text() {
        let analysis = analyze_report("");
        assert!(analysis.is_empty());
        assert_eq!(analysis.skipped_lines, 0);
    }
}
