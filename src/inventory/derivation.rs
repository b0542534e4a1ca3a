// src/inventory/derivation.rs
//! Filtered, sorted and status-tagged views over the chemical list, plus the alert list.
//!
//! Everything here is a pure function of the lots, the view parameters and `today`.
//! Callers recompute the view after every state change.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::models::ChemicalLot;

/// Balance at or below this share of the received quantity is low stock.
pub const LOW_STOCK_RATIO: f64 = 0.1;
/// Lots expiring within this many days of today (inclusive) are near expiry.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

// ==================== VIEW PARAMETERS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Name,
    Date,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    #[default]
    Name,
    Quantity,
    Unit,
    Supplier,
    DateReceived,
    ExpiryDate,
    StorageLocation,
    Remark,
    CurrentBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default)]
pub struct ViewParams {
    pub search: String,
    pub filter: FilterMode,
    pub sort_by: SortKey,
    pub sort_order: SortDirection,
}

// ==================== FILTERING ====================

pub fn matches_search(lot: &ChemicalLot, term: &str, mode: FilterMode) -> bool {
    if term.is_empty() {
        return true;
    }

    match mode {
        FilterMode::Name => contains_ignore_case(&lot.name, term),
        FilterMode::Date => {
            lot.date_received.to_string().contains(term) || lot.expiry_date.to_string().contains(term)
        }
        FilterMode::Location => contains_ignore_case(&lot.storage_location, term),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn filter_lots<'a>(lots: &'a [ChemicalLot], term: &str, mode: FilterMode) -> Vec<&'a ChemicalLot> {
    lots.iter().filter(|lot| matches_search(lot, term, mode)).collect()
}

// ==================== SORTING ====================

/// Natural ordering of one field. Dates are `NaiveDate`, so they order chronologically.
pub fn compare_by(a: &ChemicalLot, b: &ChemicalLot, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Quantity => a.quantity.total_cmp(&b.quantity),
        SortKey::Unit => a.unit.as_ref().cmp(b.unit.as_ref()),
        SortKey::Supplier => a.supplier.cmp(&b.supplier),
        SortKey::DateReceived => a.date_received.cmp(&b.date_received),
        SortKey::ExpiryDate => a.expiry_date.cmp(&b.expiry_date),
        SortKey::StorageLocation => a.storage_location.cmp(&b.storage_location),
        SortKey::Remark => a.remark.cmp(&b.remark),
        SortKey::CurrentBalance => a.current_balance.total_cmp(&b.current_balance),
    }
}

/// Stable sort; ties keep their incoming relative order in both directions.
pub fn sort_lots(lots: &mut [&ChemicalLot], key: SortKey, direction: SortDirection) {
    lots.sort_by(|a, b| {
        let ordering = compare_by(a, b, key);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

// ==================== STATUS TAGS ====================

pub fn is_low_stock(lot: &ChemicalLot) -> bool {
    lot.current_balance <= lot.quantity * LOW_STOCK_RATIO
}

pub fn is_near_expiry(lot: &ChemicalLot, today: NaiveDate) -> bool {
    lot.expiry_date <= today + Duration::days(EXPIRY_WARNING_DAYS)
}

/// Two independent flags; a lot with neither is "Good".
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct StockStatus {
    pub low_stock: bool,
    pub near_expiry: bool,
}

impl StockStatus {
    pub fn of(lot: &ChemicalLot, today: NaiveDate) -> Self {
        Self {
            low_stock: is_low_stock(lot),
            near_expiry: is_near_expiry(lot, today),
        }
    }

    pub fn is_good(&self) -> bool {
        !self.low_stock && !self.near_expiry
    }

    pub fn labels(&self) -> Vec<&'static str> {
        if self.is_good() {
            return vec!["Good"];
        }
        let mut labels = Vec::with_capacity(2);
        if self.low_stock {
            labels.push("Low Stock");
        }
        if self.near_expiry {
            labels.push("Near Expiry");
        }
        labels
    }
}

// ==================== ALERTS ====================

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Expiry,
    LowStock,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub chemical_id: String,
    pub chemical_name: String,
    pub message: String,
}

/// Walks every lot in collection order; each lot yields zero, one or two alerts.
pub fn compute_alerts(lots: &[ChemicalLot], today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for lot in lots {
        let status = StockStatus::of(lot, today);

        if status.near_expiry {
            let message = if lot.expiry_date < today {
                format!("{} expired on {}", lot.name, lot.expiry_date)
            } else {
                format!("{} expires on {}", lot.name, lot.expiry_date)
            };
            alerts.push(Alert {
                kind: AlertKind::Expiry,
                chemical_id: lot.id.clone(),
                chemical_name: lot.name.clone(),
                message,
            });
        }

        if status.low_stock {
            alerts.push(Alert {
                kind: AlertKind::LowStock,
                chemical_id: lot.id.clone(),
                chemical_name: lot.name.clone(),
                message: format!(
                    "{} is low on stock: {:.2} {} of {} {} remaining",
                    lot.name, lot.current_balance, lot.unit, lot.quantity, lot.unit
                ),
            });
        }
    }

    alerts
}

// ==================== VIEW ====================

#[derive(Debug, Serialize)]
pub struct TaggedLot<'a> {
    #[serde(flatten)]
    pub lot: &'a ChemicalLot,
    pub status: StockStatus,
    pub tags: Vec<&'static str>,
}

impl<'a> TaggedLot<'a> {
    pub fn new(lot: &'a ChemicalLot, today: NaiveDate) -> Self {
        let status = StockStatus::of(lot, today);
        Self { lot, status, tags: status.labels() }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryView<'a> {
    pub items: Vec<TaggedLot<'a>>,
    pub total: usize,
    pub visible: usize,
    pub alerts: Vec<Alert>,
}

/// Filter, then sort, then tag. Alerts always cover the full, unfiltered list.
pub fn derive_view<'a>(lots: &'a [ChemicalLot], params: &ViewParams, today: NaiveDate) -> InventoryView<'a> {
    let mut visible = filter_lots(lots, &params.search, params.filter);
    sort_lots(&mut visible, params.sort_by, params.sort_order);

    let items: Vec<TaggedLot<'a>> = visible
        .into_iter()
        .map(|lot| TaggedLot::new(lot, today))
        .collect();

    InventoryView {
        total: lots.len(),
        visible: items.len(),
        items,
        alerts: compute_alerts(lots, today),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Unit;
    use std::str::FromStr;

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn lot(id: &str, name: &str, location: &str, expiry: &str, quantity: f64, balance: f64) -> ChemicalLot {
        ChemicalLot {
            id: id.to_string(),
            name: name.to_string(),
            quantity,
            unit: Unit::Milliliter,
            supplier: "Sigma".to_string(),
            date_received: date("2024-01-15"),
            expiry_date: date(expiry),
            storage_location: location.to_string(),
            remark: None,
            current_balance: balance,
        }
    }

    fn today() -> NaiveDate {
        date("2024-06-01")
    }

    fn sample() -> Vec<ChemicalLot> {
        vec![
            lot("1", "Ethanol", "Cabinet A", "2025-01-01", 1000.0, 800.0),
            lot("2", "Acetone", "Fridge 2", "2024-06-20", 500.0, 40.0),
            lot("3", "Hydrochloric Acid", "Acid Cabinet", "2024-12-31", 250.0, 250.0),
            lot("4", "methanol", "cabinet b", "2024-05-01", 100.0, 5.0),
        ]
    }

    fn ids(lots: &[&ChemicalLot]) -> Vec<String> {
        lots.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn test_empty_search_passes_everything() {
        let lots = sample();
        for mode in [FilterMode::Name, FilterMode::Date, FilterMode::Location] {
            assert_eq!(filter_lots(&lots, "", mode).len(), lots.len());
        }
    }

    #[test]
    fn test_filter_by_name_ignores_case() {
        let lots = sample();
        assert_eq!(ids(&filter_lots(&lots, "ACETONE", FilterMode::Name)), vec!["2"]);
        // substring match: "methanol" contains "ethanol"
        assert_eq!(ids(&filter_lots(&lots, "ETHANOL", FilterMode::Name)), vec!["1", "4"]);
        assert_eq!(ids(&filter_lots(&lots, "anol", FilterMode::Name)), vec!["1", "4"]);
        assert!(filter_lots(&lots, "Cabinet", FilterMode::Name).is_empty());
    }

    #[test]
    fn test_filter_by_location_ignores_case() {
        let lots = sample();
        assert_eq!(ids(&filter_lots(&lots, "CABINET", FilterMode::Location)), vec!["1", "3", "4"]);
        assert_eq!(ids(&filter_lots(&lots, "fridge", FilterMode::Location)), vec!["2"]);
    }

    #[test]
    fn test_filter_by_date_matches_either_date() {
        let mut lots = sample();
        lots[1].date_received = date("2023-11-05");

        assert_eq!(ids(&filter_lots(&lots, "2024-12", FilterMode::Date)), vec!["3"]);
        assert_eq!(ids(&filter_lots(&lots, "2023-11", FilterMode::Date)), vec!["2"]);
        // every other lot was received on 2024-01-15
        assert_eq!(ids(&filter_lots(&lots, "2024-01-15", FilterMode::Date)), vec!["1", "3", "4"]);
    }

    #[test]
    fn test_filter_is_a_subset() {
        let lots = sample();
        for term in ["a", "xyz", "2024", "Cab"] {
            for mode in [FilterMode::Name, FilterMode::Date, FilterMode::Location] {
                for hit in filter_lots(&lots, term, mode) {
                    assert!(lots.iter().any(|l| l == hit));
                }
            }
        }
    }

    #[test]
    fn test_sort_by_name_is_lexicographic() {
        let lots = sample();
        let mut view: Vec<&ChemicalLot> = lots.iter().collect();
        sort_lots(&mut view, SortKey::Name, SortDirection::Asc);
        // uppercase sorts before lowercase
        assert_eq!(ids(&view), vec!["2", "1", "3", "4"]);

        sort_lots(&mut view, SortKey::Name, SortDirection::Desc);
        assert_eq!(ids(&view), vec!["4", "3", "1", "2"]);
    }

    #[test]
    fn test_sort_by_balance_and_expiry() {
        let lots = sample();
        let mut view: Vec<&ChemicalLot> = lots.iter().collect();

        sort_lots(&mut view, SortKey::CurrentBalance, SortDirection::Asc);
        assert_eq!(ids(&view), vec!["4", "2", "3", "1"]);

        sort_lots(&mut view, SortKey::ExpiryDate, SortDirection::Desc);
        assert_eq!(ids(&view), vec!["1", "3", "2", "4"]);

        sort_lots(&mut view, SortKey::StorageLocation, SortDirection::Asc);
        assert_eq!(ids(&view), vec!["3", "1", "2", "4"]);

        sort_lots(&mut view, SortKey::Id, SortDirection::Desc);
        assert_eq!(ids(&view), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let lots = sample();
        for key in [SortKey::Name, SortKey::Quantity, SortKey::ExpiryDate, SortKey::Supplier, SortKey::Remark] {
            for dir in [SortDirection::Asc, SortDirection::Desc] {
                let mut once: Vec<&ChemicalLot> = lots.iter().collect();
                sort_lots(&mut once, key, dir);
                let mut twice = once.clone();
                sort_lots(&mut twice, key, dir);
                assert_eq!(ids(&once), ids(&twice));
            }
        }
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        assert!(is_low_stock(&lot("a", "x", "y", "2030-01-01", 100.0, 10.0)));
        assert!(is_low_stock(&lot("a", "x", "y", "2030-01-01", 50.0, 5.0)));
        assert!(is_low_stock(&lot("a", "x", "y", "2030-01-01", 100.0, 0.0)));
        assert!(!is_low_stock(&lot("a", "x", "y", "2030-01-01", 100.0, 10.01)));
    }

    #[test]
    fn test_near_expiry_boundary() {
        let today = today();
        assert!(is_near_expiry(&lot("a", "x", "y", "2024-07-01", 1.0, 1.0), today)); // +30 days
        assert!(!is_near_expiry(&lot("a", "x", "y", "2024-07-02", 1.0, 1.0), today)); // +31 days
        assert!(is_near_expiry(&lot("a", "x", "y", "2024-05-01", 1.0, 1.0), today)); // already expired
    }

    #[test]
    fn test_status_labels() {
        let today = today();
        let lots = sample();
        assert_eq!(StockStatus::of(&lots[0], today).labels(), vec!["Good"]);
        assert_eq!(StockStatus::of(&lots[1], today).labels(), vec!["Low Stock", "Near Expiry"]);
        assert_eq!(StockStatus::of(&lots[2], today).labels(), vec!["Good"]);
        assert_eq!(StockStatus::of(&lots[3], today).labels(), vec!["Low Stock", "Near Expiry"]);
    }

    #[test]
    fn test_alerts_follow_collection_order() {
        let alerts = compute_alerts(&sample(), today());
        let summary: Vec<(&str, AlertKind)> = alerts
            .iter()
            .map(|a| (a.chemical_id.as_str(), a.kind))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2", AlertKind::Expiry),
                ("2", AlertKind::LowStock),
                ("4", AlertKind::Expiry),
                ("4", AlertKind::LowStock),
            ]
        );
        assert_eq!(alerts[0].message, "Acetone expires on 2024-06-20");
        assert_eq!(alerts[2].message, "methanol expired on 2024-05-01");
        assert!(alerts[3].message.starts_with("methanol is low on stock: 5.00 mL"));
    }

    #[test]
    fn test_alerts_ignore_search() {
        let lots = sample();
        let params = ViewParams {
            search: "hydrochloric".to_string(),
            ..ViewParams::default()
        };
        let view = derive_view(&lots, &params, today());
        assert_eq!(view.total, 4);
        assert_eq!(view.visible, 1);
        assert_eq!(view.items[0].lot.id, "3");
        assert_eq!(view.items[0].tags, vec!["Good"]);
        assert_eq!(view.alerts.len(), 4);
    }

    #[test]
    fn test_view_params_parse_from_query_strings() {
        assert_eq!(FilterMode::from_str("location").unwrap(), FilterMode::Location);
        assert_eq!(SortKey::from_str("current_balance").unwrap(), SortKey::CurrentBalance);
        assert_eq!(SortKey::from_str("expiry_date").unwrap(), SortKey::ExpiryDate);
        assert_eq!(SortDirection::from_str("desc").unwrap(), SortDirection::Desc);
        assert_eq!(SortKey::from_str("id").unwrap(), SortKey::Id);
        assert!(SortKey::from_str("colour").is_err());
    }

    #[test]
    fn test_view_serializes_flat_lot_with_tags() {
        let lots = sample();
        let view = derive_view(&lots, &ViewParams::default(), today());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["items"][0]["name"], "Acetone");
        assert_eq!(json["items"][0]["tags"][0], "Low Stock");
        assert_eq!(json["items"][0]["status"]["near_expiry"], true);
        assert_eq!(json["alerts"][0]["kind"], "expiry");
    }
}
