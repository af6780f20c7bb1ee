// src/export.rs
//! Result export: structured (serde/JSON) and tabular (CSV).
//!
//! The CSV header is always the full canonical column set, so an empty
//! result still yields a single header line.

use crate::record::{AggregatedResult, JobRecord};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const CSV_FILENAME: &str = "jobs.csv";

fn encode_row<I, S>(cells: I) -> Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(cells)?;
    w.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

pub fn csv_header() -> Result<Vec<u8>, csv::Error> {
    encode_row(JobRecord::FIELD_NAMES)
}

/// Header chunk followed by one chunk per record, produced lazily.
pub fn csv_chunks(
    result: AggregatedResult,
) -> impl Iterator<Item = Result<Vec<u8>, csv::Error>> + Send + 'static {
    std::iter::once_with(csv_header).chain(
        result
            .into_records()
            .into_iter()
            .map(|rec| encode_row(rec.csv_cells())),
    )
}

/// Whole table in one buffer.
pub fn to_csv_bytes(result: &AggregatedResult) -> Result<Vec<u8>, csv::Error> {
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    w.write_record(JobRecord::FIELD_NAMES)?;
    for rec in result.records() {
        w.write_record(rec.csv_cells())?;
    }
    w.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Structured form; unknown fields are explicit `null`.
pub fn to_json(result: &AggregatedResult) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(result)
}
