//! Tabular import/export.
//!
//! Fixed column order, one callout per row:
//! ticker, callout price, target 1-3, stop-loss, current price,
//! % since callout, target 1-3 hit, stop hit, % made, target 1-3 hit date.
//! Percent columns are formatted strings on export; absent numeric cells
//! render empty. Import is lenient about "$", thousands separators, "%" and
//! the usual date formats.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{HitStatus, Position, StopStatus};
use crate::store::ImportRecord;

const EXPORT_HEADER: &[&str] = &[
    "Ticker",
    "Callout Price",
    "Target 1",
    "Target 2",
    "Target 3",
    "Stop Loss",
    "Current Price",
    "% Since Callout",
    "T1 Hit",
    "T2 Hit",
    "T3 Hit",
    "Stop Hit",
    "% Made",
    "T1 Date",
    "T2 Date",
    "T3 Date",
];

fn parse_decimal(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

fn parse_date(cell: &str) -> Option<NaiveDate> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%y"))
        .ok()
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Parse CSV text into import records. A leading header row (detected by a
/// non-numeric callout cell) is skipped; fully blank rows are dropped; rows
/// with bad required fields still come through so the store can count them
/// as errors.
pub fn read_import_csv(data: &str) -> anyhow::Result<Vec<ImportRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        // header row
        if idx == 0 && parse_decimal(cell(&row, 1)).is_none() && !cell(&row, 0).trim().is_empty() {
            continue;
        }

        records.push(ImportRecord {
            ticker: cell(&row, 0).trim().to_string(),
            date: None,
            callout_price: parse_decimal(cell(&row, 1)).unwrap_or_default(),
            target1: parse_decimal(cell(&row, 2)),
            target2: parse_decimal(cell(&row, 3)),
            target3: parse_decimal(cell(&row, 4)),
            stop_loss: parse_decimal(cell(&row, 5)),
            buy_zone_low: None,
            buy_zone_high: None,
            current_price: parse_decimal(cell(&row, 6)).unwrap_or_default(),
            percent_since_callout: parse_decimal(cell(&row, 7)).unwrap_or_default(),
            target1_hit: HitStatus::from_cell(cell(&row, 8)),
            target2_hit: HitStatus::from_cell(cell(&row, 9)),
            target3_hit: HitStatus::from_cell(cell(&row, 10)),
            stop_hit: StopStatus::from_cell(cell(&row, 11)),
            percent_made: parse_decimal(cell(&row, 12)).unwrap_or_default(),
            target1_date: parse_date(cell(&row, 13)),
            target2_date: parse_date(cell(&row, 14)),
            target3_date: parse_date(cell(&row, 15)),
        });
    }
    Ok(records)
}

fn fmt_opt(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_percent(value: Decimal) -> String {
    format!("{}%", value.round_dp(2))
}

fn fmt_opt_date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.to_string()).unwrap_or_default()
}

/// Project positions into the export table.
pub fn write_export_csv(positions: &[Position]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for pos in positions {
        writer.write_record(&[
            pos.ticker.clone(),
            pos.callout_price.to_string(),
            fmt_opt(pos.target1),
            fmt_opt(pos.target2),
            fmt_opt(pos.target3),
            fmt_opt(pos.stop_loss),
            pos.current_price.to_string(),
            fmt_percent(pos.percent_since_callout),
            pos.target1_hit.to_string(),
            pos.target2_hit.to_string(),
            pos.target3_hit.to_string(),
            pos.stop_hit.to_string(),
            fmt_percent(pos.percent_made),
            fmt_opt_date(pos.target1_date),
            fmt_opt_date(pos.target2_date),
            fmt_opt_date(pos.target3_date),
        ])?;
    }

    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPosition;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_lenient() {
        assert_eq!(parse_decimal(" $1,234.50 "), Some(dec!(1234.50)));
        assert_eq!(parse_decimal("12.34%"), Some(dec!(12.34)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(parse_date("2025-06-02"), Some(expected));
        assert_eq!(parse_date("06/02/2025"), Some(expected));
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_read_import_csv_with_header() {
        let data = "Ticker,Callout Price,Target 1,Target 2,Target 3,Stop Loss,Current Price,% Since Callout,T1 Hit,T2 Hit,T3 Hit,Stop Hit,% Made,T1 Date,T2 Date,T3 Date\n\
                    AAPL,$150.00,160,170,,140,155.5,3.67%,YES,no,,N/A,6.67%,2025-06-02,,\n\
                    ,,,,,,,,,,,,,,,\n\
                    MSFT,0,,,,,,,,,,,,,,\n";
        let records = read_import_csv(data).unwrap();
        assert_eq!(records.len(), 2);

        let aapl = &records[0];
        assert_eq!(aapl.ticker, "AAPL");
        assert_eq!(aapl.callout_price, dec!(150.00));
        assert_eq!(aapl.target1, Some(dec!(160)));
        assert_eq!(aapl.target3, None);
        assert_eq!(aapl.stop_loss, Some(dec!(140)));
        assert_eq!(aapl.target1_hit, HitStatus::Yes);
        assert_eq!(aapl.target2_hit, HitStatus::No);
        assert_eq!(aapl.stop_hit, StopStatus::NotApplicable);
        assert_eq!(
            aapl.target1_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
        );

        // invalid callout still comes through; the store counts it
        assert_eq!(records[1].ticker, "MSFT");
        assert_eq!(records[1].callout_price, Decimal::ZERO);
    }

    #[test]
    fn test_read_import_csv_without_header() {
        let data = "TSLA,200,250,,,180,210,5%,NO,,,N/A,0%,,,\n";
        let records = read_import_csv(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, "TSLA");
        assert_eq!(records[0].callout_price, dec!(200));
    }

    #[test]
    fn test_export_formats_percents_and_blanks() {
        let mut pos = Position::new(NewPosition {
            ticker: "AAPL".into(),
            callout_price: dec!(150),
            target1: Some(dec!(160)),
            current_price: dec!(155),
            ..Default::default()
        });
        pos.percent_since_callout = dec!(3.3333);

        let csv = write_export_csv(&[pos]).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("Ticker,"));
        let row = lines.next().unwrap();
        assert!(row.contains("AAPL"));
        assert!(row.contains("3.33%"));
        assert!(row.contains("0%") || row.contains("0.00%"));
        // undefined target2 renders as an empty cell
        assert!(row.contains(",160,,"));
    }
}
