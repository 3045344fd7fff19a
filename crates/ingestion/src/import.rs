//! Import entry point: normalize, detect, extract.

use crate::detector::detect_format;
use crate::{order_report, transaction_report};
use mhub_core::{Error, MarketplaceBundle, ReportFormat, Result};
use tracing::{debug, info};

/// Strip a byte order mark, replace non-breaking spaces and unify line endings.
pub fn prepare_text(raw: &str) -> String {
    raw.strip_prefix('\u{feff}')
        .unwrap_or(raw)
        .replace('\u{a0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Turn the decoded text of one export file into a marketplace bundle.
pub fn import(raw: &str) -> Result<MarketplaceBundle> {
    let text = prepare_text(raw);
    if text.trim().is_empty() {
        return Err(Error::EmptyInput);
    }

    let format = detect_format(&text);
    debug!(%format, chars = text.chars().count(), "report format detected");

    let lines: Vec<&str> = text.split('\n').collect();
    let bundle = match format {
        ReportFormat::AmazonTransactions => transaction_report::extract(&lines)?,
        ReportFormat::EbayOrders => order_report::extract(&lines)?,
        ReportFormat::Unknown => return Err(Error::FormatUnrecognized { detected: format }),
    };

    info!(
        marketplace = %bundle.marketplace,
        days = bundle.daily.len(),
        skus = bundle.sku.len(),
        orders = bundle.meta.orders,
        revenue = bundle.meta.revenue,
        "import complete"
    );

    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{amazon_line, amazon_report, ebay_col as c, ebay_line, ebay_report};
    use mhub_core::round2;

    fn amazon_sample() -> String {
        amazon_report(&[
            amazon_line(&[
                (0, "31.12.2024 23:12:04 UTC"),
                (2, "Bestellung"),
                (4, "SKU-1"),
                (5, "Napf"),
                (6, "1"),
                (10, "NRW"),
                (13, "19,99"),
                (26, "15,10"),
            ]),
            amazon_line(&[
                (0, "31.12.2024 09:01:00 UTC"),
                (2, "Bestellung"),
                (4, "SKU-2"),
                (5, "Leine"),
                (6, "2"),
                (10, "Bayern"),
                (13, "1.234,56"),
                (26, "1.000,00"),
            ]),
            amazon_line(&[
                (0, "01.01.2025 10:00:00 UTC"),
                (2, "Bestellung"),
                (4, "SKU-1"),
                (5, "Napf"),
                (6, "1"),
                (13, "0,333"),
                (26, "0,30"),
            ]),
        ])
    }

    #[test]
    fn test_prepare_text() {
        assert_eq!(prepare_text("\u{feff}a\u{a0}b\r\nc\rd"), "a b\nc\nd");
    }

    #[test]
    fn test_import_amazon() {
        let bundle = import(&amazon_sample()).unwrap();
        assert_eq!(bundle.marketplace, "amazon");
        assert_eq!(bundle.format, ReportFormat::AmazonTransactions);
        assert_eq!(bundle.meta.orders, 3);
        assert_eq!(bundle.states[0].name, "Bayern");
        assert_eq!(bundle.states[1].name, "Nordrhein-Westfalen");
    }

    #[test]
    fn test_import_handles_crlf_and_bom() {
        let text = format!("\u{feff}{}", amazon_sample().replace('\n', "\r\n"));
        let with_crlf = import(&text).unwrap();
        let plain = import(&amazon_sample()).unwrap();
        assert_eq!(with_crlf, plain);
    }

    #[test]
    fn test_import_is_deterministic() {
        let text = ebay_report(&[
            ebay_line(&[
                (c::RECORD, "1"),
                (c::ORDER_ID, "1"),
                (c::SKU, "A"),
                (c::TOTAL, "3,50"),
                (c::CITY, "Berlin"),
                (c::SOLD_ON, "18-Feb-26"),
            ]),
            ebay_line(&[
                (c::RECORD, "2"),
                (c::ORDER_ID, "2"),
                (c::SKU, "B"),
                (c::TOTAL, "3,50"),
                (c::CITY, "Hamburg"),
                (c::SOLD_ON, "18-Feb-26"),
            ]),
        ]);

        let first = import(&text).unwrap();
        let second = import(&text).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_meta_revenue_matches_daily_sum() {
        let bundle = import(&amazon_sample()).unwrap();
        let daily_sum: f64 = bundle.daily.iter().map(|d| d.metrics.revenue).sum();
        assert_eq!(bundle.meta.revenue, round2(daily_sum));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(import(""), Err(Error::EmptyInput)));
        assert!(matches!(import("\u{feff} \r\n\t"), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_unknown_format() {
        let err = import("date,amount\n2024-01-01,5\n").unwrap_err();
        assert!(matches!(
            err,
            Error::FormatUnrecognized { detected: ReportFormat::Unknown }
        ));
    }
}
