// src/export.rs
// Spreadsheet export of search results

use crate::models::video::VideoRecord;
use chrono::{DateTime, Duration, Utc};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const SHEET_TITLE: &str = "YouTube Search Results";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("spreadsheet writer error: {0}")]
    Xlsx(#[from] XlsxError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub width: f64,
}

/// A single table, independent of the output format.
#[derive(Debug, Clone)]
pub struct ExportSheet {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

pub trait TabularExportSink: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn extension(&self) -> &'static str;
    fn render(&self, sheet: &ExportSheet) -> Result<Vec<u8>, ExportError>;
}

/// Writes `.xlsx` workbooks with a bold header row.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxSink;

impl TabularExportSink for XlsxSink {
    fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn render(&self, sheet: &ExportSheet) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.title)?;

        for (col, column) in sheet.columns.iter().enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, column.header, &header_format)?;
            worksheet.set_column_width(col, column.width)?;
        }

        for (row, cells) in sheet.rows.iter().enumerate() {
            let row = (row + 1) as u32;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => worksheet.write_string(row, col, text)?,
                    Cell::Number(value) => worksheet.write_number(row, col, *value)?,
                };
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Search parameters echoed back by the UI, used only for the file name.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub keyword: Option<String>,
    pub country: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub upload_period: Option<String>,
}

const COLUMNS: [Column; 14] = [
    Column { header: "No.", width: 6.0 },
    Column { header: "Channel", width: 25.0 },
    Column { header: "Channel ID", width: 20.0 },
    Column { header: "Title", width: 40.0 },
    Column { header: "Category", width: 15.0 },
    Column { header: "Uploaded", width: 12.0 },
    Column { header: "Views", width: 12.0 },
    Column { header: "Subscribers (x10k)", width: 12.0 },
    Column { header: "URL", width: 50.0 },
    Column { header: "Duration (s)", width: 8.0 },
    Column { header: "Duration", width: 10.0 },
    Column { header: "Length", width: 12.0 },
    Column { header: "Status", width: 10.0 },
    Column { header: "Thumbnail URL", width: 50.0 },
];

pub fn build_sheet(records: &[VideoRecord]) -> ExportSheet {
    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            vec![
                Cell::Number((index + 1) as f64),
                Cell::Text(record.channel_name.clone()),
                Cell::Text(record.channel_id.clone()),
                Cell::Text(record.title.clone()),
                Cell::Text(record.primary_category.clone()),
                Cell::Text(format_upload_date(&record.published_at)),
                Cell::Text(format_thousands(record.view_count)),
                Cell::Text(format_subscribers(record.subscriber_count.unwrap_or(0))),
                Cell::Text(record.watch_url.clone()),
                Cell::Number(record.duration_seconds as f64),
                Cell::Text(format_duration(record.duration_seconds)),
                Cell::Text(
                    record
                        .duration_category
                        .map(|c| c.label().to_string())
                        .unwrap_or_else(|| "Unknown".to_string()),
                ),
                Cell::Text(record.status.clone()),
                Cell::Text(record.thumbnail_url.clone().unwrap_or_default()),
            ]
        })
        .collect();

    ExportSheet {
        title: SHEET_TITLE.to_string(),
        columns: COLUMNS.to_vec(),
        rows,
    }
}

/// `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "00:00".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Subscriber count in units of ten thousand.
pub fn format_subscribers(count: u64) -> String {
    if count == 0 {
        return "0".to_string();
    }
    let units = count as f64 / 10_000.0;
    if count < 10_000 {
        format!("{:.2}", units)
    } else if count < 100_000 {
        format!("{:.1}", units)
    } else {
        format!("{}", units.round() as u64)
    }
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `YYYY-MM-DD` from an RFC 3339 timestamp; empty when unparseable.
pub fn format_upload_date(published_at: &str) -> String {
    DateTime::parse_from_rfc3339(published_at)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// `YouTube_<keyword>_<country><range>_[<count>]_<timestamp>.<ext>`, with
/// the timestamp in Korea Standard Time.
pub fn export_filename(params: &ExportParams, count: usize, now: DateTime<Utc>, extension: &str) -> String {
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let keyword = non_empty(&params.keyword).unwrap_or_else(|| "all".to_string());
    let country = non_empty(&params.country).unwrap_or_else(|| "worldwide".to_string());
    let start = non_empty(&params.start_date).map(|d| d.replace('-', ""));
    let end = non_empty(&params.end_date).map(|d| d.replace('-', ""));

    let range = match (start, end) {
        (Some(start), Some(end)) => format!("_{}-{}", start, end),
        (Some(start), None) => format!("_{}~", start),
        (None, Some(end)) => format!("_~{}", end),
        (None, None) => non_empty(&params.upload_period)
            .map(|period| format!("_{}", period))
            .unwrap_or_default(),
    };

    let timestamp = (now + Duration::hours(9)).format("%Y-%m-%dT%H-%M-%S");

    format!(
        "YouTube_{}_{}{}_[{}]_{}.{}",
        keyword, country, range, count, timestamp, extension
    )
}
