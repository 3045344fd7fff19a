//! Report format detection by bounded-prefix keyword sniffing.
//!
//! Only the first few thousand characters are inspected, so the cost is
//! independent of file size.

use mhub_core::ReportFormat;

/// Characters inspected for eBay header phrases.
pub const EBAY_PREFIX_CHARS: usize = 500;

/// Characters inspected for Amazon markers (the header may sit below a preamble).
pub const AMAZON_PREFIX_CHARS: usize = 2000;

const EBAY_MARKERS: &[&str] = &["verkaufsprotokollnummer", "angebotstitel", "verkauft für"];
const AMAZON_REPORT_MARKERS: &[&str] = &["einschließlich transaktionen", "custom transaction"];
const AMAZON_DATE_COLUMN: &str = "datum/uhrzeit";
const AMAZON_ID_COLUMNS: &[&str] = &["abrechnungsnummer", "bestellnummer"];

/// First `n` characters of `text`.
fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Classify raw report text.
pub fn detect_format(text: &str) -> ReportFormat {
    let head = char_prefix(text, EBAY_PREFIX_CHARS).to_lowercase();
    if EBAY_MARKERS.iter().any(|m| head.contains(m)) {
        return ReportFormat::EbayOrders;
    }

    let head = char_prefix(text, AMAZON_PREFIX_CHARS).to_lowercase();
    let has_columns = head.contains(AMAZON_DATE_COLUMN)
        && AMAZON_ID_COLUMNS.iter().any(|m| head.contains(m));
    if has_columns || AMAZON_REPORT_MARKERS.iter().any(|m| head.contains(m)) {
        return ReportFormat::AmazonTransactions;
    }

    ReportFormat::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_ebay() {
        let text = "\nVerkaufsprotokollnummer;Bestellnummer;Angebotstitel\n1;2;3";
        assert_eq!(detect_format(text), ReportFormat::EbayOrders);
    }

    #[test]
    fn test_detect_ebay_marker_past_prefix() {
        let text = format!("{}\nVerkaufsprotokollnummer;Angebotstitel", "x".repeat(600));
        assert_eq!(detect_format(&text), ReportFormat::Unknown);
    }

    #[test]
    fn test_detect_amazon_header_below_preamble() {
        let preamble = "\"Einige Beschreibung\"\n".repeat(6);
        let text = format!("{preamble}\"datum/uhrzeit\",\"abrechnungsnummer\",\"typ\"\n");
        assert_eq!(detect_format(&text), ReportFormat::AmazonTransactions);
    }

    #[test]
    fn test_detect_amazon_report_name() {
        let text = "\"Einschließlich Transaktionen in Amazon Marketplace\"\n";
        assert_eq!(detect_format(text), ReportFormat::AmazonTransactions);
    }

    #[test]
    fn test_date_column_alone_is_not_enough() {
        assert_eq!(detect_format("Datum/Uhrzeit,Betrag\n"), ReportFormat::Unknown);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format("date,amount\n2024-01-01,5"), ReportFormat::Unknown);
        assert_eq!(detect_format(""), ReportFormat::Unknown);
    }
}
