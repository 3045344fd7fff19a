//! Report builders for unit tests.

use crate::transaction_report;

const AMAZON_HEADER: [&str; 27] = [
    "Datum/Uhrzeit",
    "Abrechnungsnummer",
    "Typ",
    "Bestellnummer",
    "SKU",
    "Beschreibung",
    "Menge",
    "Marketplace",
    "Versand",
    "Ort der Bestellung",
    "Bundesland",
    "Postleitzahl",
    "Steuererhebungsmodell",
    "Umsätze",
    "Produktumsatzsteuer",
    "Gutschrift für Versandkosten",
    "Steuer auf Versandgutschrift",
    "Gutschrift für Geschenkverpackung",
    "Steuer auf Geschenkverpackungsgutschriften",
    "Rabatte aus Werbeaktionen",
    "Steuer auf Aktionsrabatte",
    "Einbehaltene Steuer auf Marketplace",
    "Verkaufsgebühren",
    "Gebühren zu Versand durch Amazon",
    "Andere Transaktionsgebühren",
    "Andere",
    "Gesamt",
];

const EBAY_HEADER: [&str; 21] = [
    "Verkaufsprotokollnummer",
    "Bestellnummer",
    "Nutzername des Käufers",
    "Name des Käufers",
    "E-Mail des Käufers",
    "Wohnort des Käufers",
    "Bundesland des Käufers",
    "PLZ des Käufers",
    "Land des Käufers",
    "Artikelnummer",
    "Angebotstitel",
    "Bestandseinheit",
    "Anzahl",
    "Verkauft für",
    "Verpackung und Versand",
    "Gesamtbetrag",
    "Gesamtbetrag inkl. MwSt.",
    "Verkauft am",
    "Bezahlt am",
    "Versandt am",
    "Transaktionsnummer",
];

fn quoted_line(cells: &[String], delimiter: &str) -> String {
    cells
        .iter()
        .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(delimiter)
}

fn sparse_cells(width: usize, cells: &[(usize, &str)]) -> Vec<String> {
    let mut row = vec![String::new(); width];
    for (idx, value) in cells {
        row[*idx] = value.to_string();
    }
    row
}

/// One Amazon row; unspecified cells are empty.
pub(crate) fn amazon_line(cells: &[(usize, &str)]) -> String {
    quoted_line(&sparse_cells(transaction_report::MIN_COLUMNS, cells), ",")
}

/// Amazon report with preamble, header and the given rows.
pub(crate) fn amazon_report(rows: &[String]) -> String {
    let header: Vec<String> = AMAZON_HEADER.iter().map(|h| h.to_string()).collect();
    let mut text = String::from(
        "\"Einschließlich Transaktionen in Amazon Marketplace, Versand durch Amazon \
         und Amazon Pay\"\n\
         \"Alle Beträge in EUR, sofern nicht anders angegeben\"\n\
         \"Definitionen:\"\n\
         \"Verkaufsgebühren: Beinhaltet variable Abschlussgebühren\"\n\
         \n",
    );
    text.push_str(&quoted_line(&header, ","));
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

/// Column positions of the eBay fixture header.
pub(crate) mod ebay_col {
    pub const RECORD: usize = 0;
    pub const ORDER_ID: usize = 1;
    pub const CITY: usize = 5;
    pub const TITLE: usize = 10;
    pub const SKU: usize = 11;
    pub const QUANTITY: usize = 12;
    pub const PRICE: usize = 13;
    pub const TOTAL: usize = 15;
    pub const SOLD_ON: usize = 17;
}

/// One eBay row; unspecified cells are empty.
pub(crate) fn ebay_line(cells: &[(usize, &str)]) -> String {
    quoted_line(&sparse_cells(EBAY_HEADER.len(), cells), ";")
}

/// eBay report with a leading blank line, header, rows and a trailer.
pub(crate) fn ebay_report(rows: &[String]) -> String {
    let header: Vec<String> = EBAY_HEADER.iter().map(|h| h.to_string()).collect();
    let mut text = String::from("\n");
    text.push_str(&quoted_line(&header, ";"));
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text.push_str("\"\";\"\";\"3 Verkaufsprotokolle\"\n");
    text
}
