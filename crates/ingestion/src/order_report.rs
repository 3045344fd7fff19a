//! eBay order report extraction.
//!
//! Semicolon separated. Column positions vary between exports, so each
//! semantic role is located once from the header text and the rows are then
//! read by position.

use crate::accumulator::BundleAccumulator;
use crate::locale::{parse_number, parse_short_date};
use crate::split::split_line;
use mhub_core::{Error, MarketplaceBundle, ReportFormat, Result};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Lines searched for the header.
pub const HEADER_LOOKAHEAD: usize = 5;

/// Narrower rows are dropped.
pub const MIN_COLUMNS: usize = 20;

const HEADER_MARKERS: &[&str] = &["Verkaufsprotokollnummer", "Bestellnummer"];
const DELIMITER: u8 = b';';

/// Semantic column of the order report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    OrderId,
    Sku,
    Title,
    Quantity,
    UnitPrice,
    Total,
    SaleDate,
    BuyerCity,
    BuyerRegion,
    Shipping,
    ListingId,
}

/// Header text test for one role. Header cells are lowercased first.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Contains(&'static str),
    AllOf(&'static [&'static str]),
    Excluding(&'static str, &'static str),
}

impl Pattern {
    fn matches(self, header: &str) -> bool {
        match self {
            Pattern::Contains(needle) => header.contains(needle),
            Pattern::AllOf(needles) => needles.iter().all(|n| header.contains(n)),
            Pattern::Excluding(needle, unwanted) => {
                header.contains(needle) && !header.contains(unwanted)
            }
        }
    }
}

struct RoleMatcher {
    role: Role,
    any_of: &'static [Pattern],
}

/// Header patterns per role. When several header cells match a role the
/// leftmost one wins, so a second SKU, title, sale date or shipping column
/// further right is ignored.
const ROLE_TABLE: &[RoleMatcher] = &[
    RoleMatcher { role: Role::OrderId, any_of: &[Pattern::Contains("bestellnummer")] },
    RoleMatcher {
        role: Role::Sku,
        any_of: &[Pattern::Contains("bestandseinheit"), Pattern::Contains("sku")],
    },
    RoleMatcher { role: Role::Title, any_of: &[Pattern::Contains("angebotstitel")] },
    RoleMatcher { role: Role::Quantity, any_of: &[Pattern::Contains("anzahl")] },
    RoleMatcher { role: Role::UnitPrice, any_of: &[Pattern::Contains("verkauft für")] },
    RoleMatcher { role: Role::Total, any_of: &[Pattern::Excluding("gesamtbetrag", "inkl")] },
    RoleMatcher { role: Role::SaleDate, any_of: &[Pattern::Contains("verkauft am")] },
    RoleMatcher {
        role: Role::BuyerCity,
        any_of: &[
            Pattern::AllOf(&["versand nach", "ort"]),
            Pattern::Contains("wohnort des käufers"),
        ],
    },
    RoleMatcher {
        role: Role::BuyerRegion,
        any_of: &[
            Pattern::AllOf(&["versand nach", "bundesland"]),
            Pattern::Contains("bundesland des käufers"),
        ],
    },
    RoleMatcher { role: Role::Shipping, any_of: &[Pattern::Contains("verpackung und versand")] },
    RoleMatcher { role: Role::ListingId, any_of: &[Pattern::Contains("artikelnummer")] },
];

/// Role -> column index, resolved once per import.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: BTreeMap<Role, usize>,
}

impl ColumnMap {
    /// Resolve every role against the header cells. The first matching cell wins.
    pub fn resolve(header: &[String]) -> Self {
        let normalized: Vec<String> = header
            .iter()
            .map(|h| h.to_lowercase().replace('\u{a0}', " ").trim().to_string())
            .collect();

        let columns = ROLE_TABLE
            .iter()
            .filter_map(|matcher| {
                normalized
                    .iter()
                    .position(|h| matcher.any_of.iter().any(|p| p.matches(h)))
                    .map(|idx| (matcher.role, idx))
            })
            .collect();

        Self { columns }
    }

    /// Column index of a role, if the header had one.
    pub fn index(&self, role: Role) -> Option<usize> {
        self.columns.get(&role).copied()
    }

    /// Cell for `role`; unresolved roles and missing cells read as empty.
    pub fn cell<'a>(&self, row: &'a [String], role: Role) -> &'a str {
        self.index(role)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Extract a bundle from normalized report lines.
pub fn extract(lines: &[&str]) -> Result<MarketplaceBundle> {
    let header_idx = lines
        .iter()
        .take(HEADER_LOOKAHEAD)
        .position(|line| HEADER_MARKERS.iter().any(|m| line.contains(m)))
        .ok_or_else(|| Error::header_not_found(ReportFormat::EbayOrders, HEADER_LOOKAHEAD))?;

    let columns = ColumnMap::resolve(&split_line(lines[header_idx], DELIMITER));
    debug!(columns = ?columns.columns, "ebay column map");

    let mut acc = BundleAccumulator::new();
    let mut seen_orders: HashSet<String> = HashSet::new();

    for line in &lines[header_idx + 1..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        acc.stats.rows += 1;

        // Summary rows at the end of the export start with an empty quoted cell.
        if line.starts_with("\"\"") {
            acc.stats.blank_rows += 1;
            continue;
        }

        let row = split_line(line, DELIMITER);
        if row.len() < MIN_COLUMNS {
            acc.stats.short_rows += 1;
            continue;
        }

        let order_id = columns.cell(&row, Role::OrderId).trim();
        if order_id.is_empty() && row[0].trim().is_empty() {
            acc.stats.blank_rows += 1;
            continue;
        }

        let Some(date) = parse_short_date(columns.cell(&row, Role::SaleDate)) else {
            acc.stats.undated_rows += 1;
            continue;
        };

        let mut quantity = parse_number(columns.cell(&row, Role::Quantity));
        if quantity == 0.0 {
            quantity = 1.0;
        }
        let unit_price = parse_number(columns.cell(&row, Role::UnitPrice));
        // A blank and a literal zero total both fall back to price x quantity.
        let mut total = parse_number(columns.cell(&row, Role::Total));
        if total == 0.0 {
            total = unit_price * quantity;
        }

        let first_sight = !order_id.is_empty() && seen_orders.insert(order_id.to_string());

        let day = &mut acc.day(date).metrics;
        if first_sight {
            day.orders += 1;
        }
        day.units += quantity;
        day.revenue += total;
        day.net += total;

        if first_sight {
            acc.orders += 1;
        }
        acc.revenue += total;
        acc.add_weekday(date, total);

        let sku = columns.cell(&row, Role::Sku).trim();
        if !sku.is_empty() {
            let title = columns.cell(&row, Role::Title).trim();
            let record = acc.sku(sku, title);
            record.revenue += total;
            record.units += quantity;
            record.orders += 1;
            record.net += total;
        }

        let city = columns.cell(&row, Role::BuyerCity).trim();
        if !city.is_empty() {
            acc.add_region(city, total, quantity);
        }
    }

    debug!(
        rows = acc.stats.rows,
        used = acc.stats.used_rows(),
        short = acc.stats.short_rows,
        undated = acc.stats.undated_rows,
        blank = acc.stats.blank_rows,
        distinct_orders = seen_orders.len(),
        "ebay order rows read"
    );

    Ok(acc.finish(ReportFormat::EbayOrders))
}
