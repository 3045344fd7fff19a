//! Amazon custom transaction report extraction.
//!
//! Comma separated with fixed column positions. The header sits below a
//! short preamble, so it is searched within the first lines of the file.

use crate::accumulator::{sort_regions, BundleAccumulator};
use crate::locale::{parse_number, parse_timestamp, DateHour};
use crate::split::split_line;
use mhub_core::{Error, MarketplaceBundle, RegionRecord, ReportFormat, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Lines searched for the header.
pub const HEADER_LOOKAHEAD: usize = 15;

/// Narrower rows are dropped.
pub const MIN_COLUMNS: usize = 27;

const HEADER_MARKER: &str = "Datum/Uhrzeit";
const DELIMITER: u8 = b',';

/// Column positions.
mod col {
    pub const TIMESTAMP: usize = 0;
    pub const KIND: usize = 2;
    pub const SKU: usize = 4;
    pub const DESCRIPTION: usize = 5;
    pub const QUANTITY: usize = 6;
    pub const REGION: usize = 10;
    pub const SALES: usize = 13;
    pub const SHIPPING_CREDIT: usize = 15;
    pub const PROMO: usize = 19;
    pub const SELLING_FEES: usize = 22;
    pub const FBA_FEES: usize = 23;
    pub const OTHER_TRANSACTION_FEES: usize = 24;
    pub const OTHER: usize = 25;
    pub const TOTAL: usize = 26;
}

/// Transaction type of a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Order,
    Refund,
    ServiceFee,
    StorageFee,
    Other,
}

impl TransactionKind {
    /// Classify the raw type cell.
    pub fn classify(raw: &str) -> Self {
        if raw.contains("Lagergebühr") {
            TransactionKind::StorageFee
        } else if raw.contains("Servicegebühr") {
            TransactionKind::ServiceFee
        } else if raw.contains("Erstattung") {
            TransactionKind::Refund
        } else if raw.contains("Bestellung") {
            TransactionKind::Order
        } else {
            TransactionKind::Other
        }
    }
}

/// One parsed report row.
#[derive(Debug, Clone)]
struct TransactionRow {
    timestamp: DateHour,
    kind: TransactionKind,
    sku: String,
    description: String,
    quantity: f64,
    region: String,
    sales: f64,
    shipping_credit: f64,
    promo: f64,
    selling_fees: f64,
    fba_fees: f64,
    other_transaction_fees: f64,
    other: f64,
    total: f64,
}

impl TransactionRow {
    /// `None` when the timestamp cell is not a valid date.
    fn parse(fields: &[String]) -> Option<Self> {
        let timestamp = parse_timestamp(&fields[col::TIMESTAMP])?;
        let num = |idx: usize| parse_number(&fields[idx]);

        Some(Self {
            timestamp,
            kind: TransactionKind::classify(&fields[col::KIND]),
            sku: fields[col::SKU].trim().to_string(),
            description: fields[col::DESCRIPTION].clone(),
            quantity: num(col::QUANTITY),
            region: fields[col::REGION].trim().to_string(),
            sales: num(col::SALES),
            shipping_credit: num(col::SHIPPING_CREDIT),
            promo: num(col::PROMO),
            selling_fees: num(col::SELLING_FEES),
            fba_fees: num(col::FBA_FEES),
            other_transaction_fees: num(col::OTHER_TRANSACTION_FEES),
            other: num(col::OTHER),
            total: num(col::TOTAL),
        })
    }
}

/// Extract a bundle from normalized report lines.
pub fn extract(lines: &[&str]) -> Result<MarketplaceBundle> {
    let header_idx = lines
        .iter()
        .take(HEADER_LOOKAHEAD)
        .position(|line| line.contains(HEADER_MARKER))
        .ok_or_else(|| {
            Error::header_not_found(ReportFormat::AmazonTransactions, HEADER_LOOKAHEAD)
        })?;

    let mut acc = BundleAccumulator::new();

    for line in &lines[header_idx + 1..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        acc.stats.rows += 1;

        let fields = split_line(line, DELIMITER);
        if fields.len() < MIN_COLUMNS {
            acc.stats.short_rows += 1;
            continue;
        }
        let Some(row) = TransactionRow::parse(&fields) else {
            acc.stats.undated_rows += 1;
            continue;
        };

        apply_row(&mut acc, &row);
    }

    debug!(
        rows = acc.stats.rows,
        used = acc.stats.used_rows(),
        short = acc.stats.short_rows,
        undated = acc.stats.undated_rows,
        "amazon transaction rows read"
    );

    let mut bundle = acc.finish(ReportFormat::AmazonTransactions);
    bundle.states = normalize_regions(bundle.states);
    Ok(bundle)
}

fn apply_row(acc: &mut BundleAccumulator, row: &TransactionRow) {
    let date = row.timestamp.date;

    match row.kind {
        TransactionKind::Order => {
            let day = &mut acc.day(date).metrics;
            day.orders += 1;
            day.units += row.quantity;
            day.revenue += row.sales;
            day.fees += row.selling_fees;
            day.fba_fees += row.fba_fees;
            day.promo += row.promo;
            day.shipping_credit += row.shipping_credit;

            acc.add_hour(row.timestamp.hour);
            acc.add_weekday(date, row.sales);

            if !row.sku.is_empty() {
                let sku = acc.sku(&row.sku, &row.description);
                sku.revenue += row.sales;
                sku.units += row.quantity;
                sku.orders += 1;
                sku.fees += row.selling_fees;
                sku.fba_fees += row.fba_fees;
                sku.promo += row.promo;
                sku.net += row.total;
            }

            if !row.region.is_empty() {
                acc.add_region(&row.region, row.sales, row.quantity);
            }

            acc.orders += 1;
            acc.revenue += row.sales;
        }
        TransactionKind::Refund => {
            let day = &mut acc.day(date).metrics;
            day.refunds += 1;
            day.refund_units += row.quantity.abs();
            day.refund_amount += row.sales.abs();

            // Refunds only attach to SKUs already seen as orders.
            if let Some(sku) = acc.skus.get_mut(&row.sku) {
                sku.refunds += 1;
                sku.refund_amount += row.sales.abs();
            }
        }
        TransactionKind::ServiceFee => {
            acc.day(date).metrics.service_fees += row.other_transaction_fees + row.other;
        }
        TransactionKind::StorageFee => {
            acc.day(date).metrics.storage_fees += row.other;
        }
        TransactionKind::Other => {}
    }

    acc.day(date).metrics.net += row.total;
}

/// Canonical region name.
fn region_alias(name: &str) -> &str {
    match name {
        "NRW" => "Nordrhein-Westfalen",
        "Deutschland" | "DE" => "Unbekannt (DE)",
        other => other,
    }
}

/// Rename region abbreviations and merge entries that end up with the same name.
pub fn normalize_regions(regions: Vec<RegionRecord>) -> Vec<RegionRecord> {
    let mut merged: BTreeMap<String, RegionRecord> = BTreeMap::new();
    for region in regions {
        let name = region_alias(&region.name).to_string();
        let entry = merged
            .entry(name.clone())
            .or_insert_with(|| RegionRecord::new(name));
        entry.orders += region.orders;
        entry.revenue += region.revenue;
        entry.units += region.units;
    }

    let mut out: Vec<RegionRecord> = merged.into_values().collect();
    sort_regions(&mut out);
    out
}
