// CSV decoding for the spreadsheet export.
//
// The export is small and mostly well-formed, but cells can hold commas
// inside double quotes ("Smith, J."). Decoding is best-effort: a malformed
// row never aborts the load, it just yields whatever fields it has.
use crate::types::Record;
use tracing::debug;

/// Decode a CSV payload into records keyed by the header line.
///
/// - Fewer than two lines (header only, or nothing) gives no records.
/// - Short rows are padded with empty strings; extra values are dropped.
/// - A blank line between rows still counts as a row, with every field empty.
pub fn decode_csv(text: &str) -> Vec<Record> {
    let mut lines = text.trim().lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| h.trim().trim_matches('"').trim().to_string())
        .collect();

    let mut records = Vec::new();
    let mut short_rows = 0usize;
    for line in lines {
        let values = split_line(line);
        if values.len() < headers.len() {
            short_rows += 1;
        }
        let mut values = values.into_iter();
        let record: Record = headers
            .iter()
            .map(|h| (h.clone(), values.next().unwrap_or_default()))
            .collect();
        records.push(record);
    }
    if short_rows > 0 {
        debug!(short_rows, "padded CSV rows with missing trailing fields");
    }
    records
}

/// Split one CSV line on commas that sit outside double quotes.
///
/// A quote toggles quoted mode and is itself dropped; each field is trimmed.
pub fn split_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                values.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    values.push(current.trim().to_string());
    values
}
