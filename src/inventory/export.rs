// src/inventory/export.rs
//! Portable reports of the inventory: a quoted delimited-text document and a printable HTML page.

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{ApiError, ApiResult};
use crate::inventory::derivation::StockStatus;
use crate::models::{ChemicalLot, UsageEvent};

pub const REPORT_TITLE: &str = "Chemical Inventory Report";

pub const CHEMICAL_COLUMNS: [&str; 9] = [
    "Name", "Current Balance", "Unit", "Original Quantity", "Supplier",
    "Date Received", "Expiry Date", "Storage Location", "Remark",
];

pub const USAGE_COLUMNS: [&str; 5] = [
    "Chemical Name", "Quantity Used", "Date Used", "Person In Charge", "Remark",
];

pub fn export_filename(date: NaiveDate) -> String {
    format!("chemical-inventory-{}.csv", date.format("%Y-%m-%d"))
}

fn quoted_writer(buffer: Vec<u8>) -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buffer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ApiResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))
}

/// Renders lots and usage history into one document.
///
/// Layout: title, generation timestamp, the chemicals section, one blank line,
/// then the usage section. Every value is quoted; embedded quotes are doubled.
pub fn format_report(
    lots: &[ChemicalLot],
    usage_history: &[UsageEvent],
    generated_at: DateTime<Utc>,
) -> ApiResult<String> {
    let mut writer = quoted_writer(Vec::new());

    writer.write_record([REPORT_TITLE])?;
    writer.write_record([format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))])?;
    writer.write_record(["Chemicals"])?;
    writer.write_record(CHEMICAL_COLUMNS)?;

    for lot in lots {
        writer.write_record([
            lot.name.clone(),
            format!("{:.2}", lot.current_balance),
            lot.unit.to_string(),
            lot.quantity.to_string(),
            lot.supplier.clone(),
            lot.date_received.to_string(),
            lot.expiry_date.to_string(),
            lot.storage_location.clone(),
            lot.remark.clone().unwrap_or_default(),
        ])?;
    }

    let mut buffer = finish(writer)?;
    buffer.push(b'\n');

    let mut writer = quoted_writer(buffer);
    writer.write_record(["Usage History"])?;
    writer.write_record(USAGE_COLUMNS)?;

    for event in usage_history {
        writer.write_record([
            event.chemical_name.clone(),
            event.quantity_used.to_string(),
            event.date_used.to_string(),
            event.person_in_charge.clone(),
            event.remark.clone().unwrap_or_default(),
        ])?;
    }

    let buffer = finish(writer)?;
    String::from_utf8(buffer).map_err(|e| ApiError::InternalServerError(e.to_string()))
}

// ==================== PRINT REPORT ====================

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Printable HTML table of the lots and their status tags.
pub fn render_print_report(lots: &[ChemicalLot], today: NaiveDate, generated_at: DateTime<Utc>) -> String {
    let mut rows = String::new();

    for lot in lots {
        let status = StockStatus::of(lot, today);
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{:.2} {}</td><td>{} {}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&lot.name),
            lot.current_balance,
            lot.unit,
            lot.quantity,
            lot.unit,
            escape_html(&lot.supplier),
            lot.date_received,
            lot.expiry_date,
            escape_html(&lot.storage_location),
            escape_html(lot.remark.as_deref().unwrap_or("")),
            status.labels().join(", "),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; font-size: 12px; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #444; padding: 4px; text-align: left; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>Generated: {generated}</p>
<table>
<thead><tr><th>Name</th><th>Current Balance</th><th>Original Quantity</th><th>Supplier</th><th>Date Received</th><th>Expiry Date</th><th>Storage Location</th><th>Remark</th><th>Status</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        title = REPORT_TITLE,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        rows = rows,
    )
}
