// tests/export_csv.rs
use std::collections::BTreeMap;

use job_aggregator::export::{csv_chunks, to_csv_bytes, to_json};
use job_aggregator::{AggregatedResult, JobRecord, SourceId};

fn parse(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_reader(bytes);
    let header = rdr.headers().unwrap().iter().map(str::to_string).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

#[test]
fn zero_records_still_emit_exactly_one_header_row() {
    let res = AggregatedResult::new(vec![], "rust", None, BTreeMap::new());
    let bytes = to_csv_bytes(&res).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();

    assert_eq!(text.lines().count(), 1);
    let (header, rows) = parse(&bytes);
    assert_eq!(header, JobRecord::FIELD_NAMES.to_vec());
    assert!(rows.is_empty());

    // the streamed variant yields just the header chunk
    let chunks: Vec<_> = csv_chunks(res).collect::<Result<_, _>>().unwrap();
    assert_eq!(chunks.len(), 1);
}

#[test]
fn unknown_is_an_empty_cell_and_zero_is_kept() {
    let mut rec = JobRecord::empty("r1", SourceId::from("indeed"));
    rec.title = Some("Dev".into());
    rec.min_amount = Some(0.0);
    let res = AggregatedResult::new(vec![rec], "rust", None, BTreeMap::new());

    let (header, rows) = parse(&to_csv_bytes(&res).unwrap());
    let col = |name: &str| header.iter().position(|h| h == name).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][col("title")], "Dev");
    assert_eq!(rows[0][col("min_amount")], "0");
    assert_eq!(rows[0][col("max_amount")], "");
    assert_eq!(rows[0][col("company")], "");
}

#[test]
fn structured_form_uses_null_for_unknown() {
    let mut rec = JobRecord::empty("r1", SourceId::from("indeed"));
    rec.min_amount = Some(0.0);
    let mut errors = BTreeMap::new();
    errors.insert(SourceId::from("linkedin"), "rate limited".to_string());
    let res = AggregatedResult::new(vec![rec], "rust", Some("Remote".into()), errors);

    let v = to_json(&res).unwrap();
    assert_eq!(v["total"], 1);
    assert_eq!(v["search_term"], "rust");
    assert_eq!(v["location"], "Remote");
    assert_eq!(v["source_errors"]["linkedin"], "rate limited");
    let job = &v["jobs"][0];
    assert!(job["max_amount"].is_null());
    assert!(job["title"].is_null());
    assert_eq!(job["min_amount"], 0.0);
}
