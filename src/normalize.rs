// src/normalize.rs
//! Record normalization: the single place where loosely-typed adapter rows
//! become strongly-typed [`JobRecord`]s.
//!
//! Rules, per field:
//! - absent, `Null`, NaN/inf and textual empty markers (`""`, `nan`, `None`,
//!   `N/A`, `<NA>`, `NaT`, ...) are unknown (`None`);
//! - a value that cannot be coerced to the field's type is unknown as well,
//!   and counted as an anomaly; it never discards the row;
//! - keys that are not canonical fields are ignored.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat};
use metrics::counter;
use sha2::{Digest, Sha256};

use crate::record::JobRecord;
use crate::sources::{RawRow, RawValue, SourceId};

/// Text values treated as "no data" (compared trimmed, case-insensitive).
const EMPTY_MARKERS: &[&str] = &["", "nan", "none", "null", "n/a", "na", "<na>", "nat"];

/// Integers above this are taken as epoch milliseconds rather than seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

const CURRENCY_PREFIXES: &[char] = &['$', '€', '£', '¥', '₹'];

type Coerced<T> = Result<Option<T>, &'static str>;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Map one raw row from `source` onto the canonical schema. Never fails.
    pub fn normalize(&self, source: &SourceId, row: RawRow) -> JobRecord {
        let mut r = FieldReader {
            source,
            row,
            anomalies: 0,
        };

        let id = r.text("id");
        let mut rec = JobRecord::empty(String::new(), source.clone());
        rec.job_url = r.text("job_url");
        rec.job_url_direct = r.text("job_url_direct");
        rec.title = r.text("title");
        rec.company = r.text("company");
        rec.location = r.text("location");
        rec.date_posted = r.date("date_posted");
        rec.job_type = r.text("job_type");
        rec.salary_source = r.text("salary_source");
        rec.interval = r.text("interval");
        rec.min_amount = r.float("min_amount");
        rec.max_amount = r.float("max_amount");
        rec.currency = r.text("currency");
        rec.is_remote = r.boolean("is_remote");
        rec.job_level = r.text("job_level");
        rec.job_function = r.text("job_function");
        rec.listing_type = r.text("listing_type");
        rec.emails = r.text_list("emails");
        rec.description = r.text("description");
        rec.company_industry = r.text("company_industry");
        rec.company_url = r.text("company_url");
        rec.company_logo = r.text("company_logo");
        rec.company_url_direct = r.text("company_url_direct");
        rec.company_addresses = r.text("company_addresses");
        rec.company_num_employees = r.text("company_num_employees");
        rec.company_revenue = r.text("company_revenue");
        rec.company_description = r.text("company_description");
        rec.skills = r.text_list("skills");
        rec.experience_range = r.text("experience_range");
        rec.company_rating = r.float("company_rating");
        rec.company_reviews_count = r.int("company_reviews_count");
        rec.vacancy_count = r.int("vacancy_count");
        rec.work_from_home_type = r.text("work_from_home_type");

        rec.id = id.unwrap_or_else(|| stable_id(&rec));

        if r.anomalies > 0 {
            counter!("normalize_field_anomalies_total", "source" => source.to_string())
                .increment(r.anomalies);
        }
        counter!("normalize_records_total").increment(1);
        rec
    }
}

/// Deterministic id for rows that carry none: same listing, same id.
pub fn stable_id(rec: &JobRecord) -> String {
    let mut hasher = Sha256::new();
    for part in [
        Some(rec.site.as_str()),
        rec.job_url.as_deref(),
        rec.title.as_deref(),
        rec.company.as_deref(),
        rec.location.as_deref(),
    ] {
        hasher.update(part.unwrap_or_default().as_bytes());
        hasher.update([0x1f]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(rec.site.as_str().len() + 17);
    out.push_str(rec.site.as_str());
    out.push('-');
    for b in digest.iter().take(8) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

struct FieldReader<'a> {
    source: &'a SourceId,
    row: RawRow,
    anomalies: u64,
}

impl FieldReader<'_> {
    fn read<T>(&mut self, key: &str, coerce: fn(RawValue) -> Coerced<T>) -> Option<T> {
        let raw = self.row.remove(key)?;
        match coerce(raw) {
            Ok(v) => v,
            Err(reason) => {
                self.anomalies += 1;
                tracing::debug!(source = %self.source, field = key, reason, "field degraded to unknown");
                None
            }
        }
    }

    fn text(&mut self, key: &str) -> Option<String> {
        self.read(key, to_text)
    }

    fn text_list(&mut self, key: &str) -> Option<String> {
        self.read(key, to_text_list)
    }

    fn float(&mut self, key: &str) -> Option<f64> {
        self.read(key, to_float)
    }

    fn int(&mut self, key: &str) -> Option<i64> {
        self.read(key, to_int)
    }

    fn boolean(&mut self, key: &str) -> Option<bool> {
        self.read(key, to_bool)
    }

    fn date(&mut self, key: &str) -> Option<String> {
        self.read(key, to_date)
    }
}

fn is_empty_marker(s: &str) -> bool {
    let t = s.trim();
    EMPTY_MARKERS.iter().any(|m| m.eq_ignore_ascii_case(t))
}

fn to_text(v: RawValue) -> Coerced<String> {
    match v {
        RawValue::Null => Ok(None),
        RawValue::Text(s) if is_empty_marker(&s) => Ok(None),
        RawValue::Text(s) => Ok(Some(s.trim().to_string())),
        RawValue::Bool(b) => Ok(Some(b.to_string())),
        RawValue::Int(i) => Ok(Some(i.to_string())),
        RawValue::Float(f) if !f.is_finite() => Ok(None),
        RawValue::Float(f) => Ok(Some(f.to_string())),
        RawValue::Date(d) => Ok(Some(d.format("%Y-%m-%d").to_string())),
        RawValue::DateTime(dt) => Ok(Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true))),
        RawValue::List(_) | RawValue::Map(_) => Err("non-scalar value"),
    }
}

/// Collection fields accept a list of scalars, joined with ", ".
fn to_text_list(v: RawValue) -> Coerced<String> {
    match v {
        RawValue::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(s) = to_text(item)? {
                    parts.push(s);
                }
            }
            Ok((!parts.is_empty()).then(|| parts.join(", ")))
        }
        other => to_text(other),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches(CURRENCY_PREFIXES)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn to_float(v: RawValue) -> Coerced<f64> {
    match v {
        RawValue::Null => Ok(None),
        RawValue::Float(f) if !f.is_finite() => Ok(None),
        RawValue::Float(f) => Ok(Some(f)),
        RawValue::Int(i) => Ok(Some(i as f64)),
        RawValue::Text(s) if is_empty_marker(&s) => Ok(None),
        RawValue::Text(s) => parse_number(&s).map(Some).ok_or("not a number"),
        _ => Err("not a number"),
    }
}

fn float_to_int(f: f64) -> Coerced<i64> {
    if !f.is_finite() {
        return Ok(None);
    }
    if f.fract() != 0.0 || f.abs() > i64::MAX as f64 {
        return Err("not an integer");
    }
    Ok(Some(f as i64))
}

fn to_int(v: RawValue) -> Coerced<i64> {
    match v {
        RawValue::Null => Ok(None),
        RawValue::Int(i) => Ok(Some(i)),
        RawValue::Float(f) => float_to_int(f),
        RawValue::Text(s) if is_empty_marker(&s) => Ok(None),
        RawValue::Text(s) => match parse_number(&s) {
            Some(f) => float_to_int(f),
            None => Err("not an integer"),
        },
        _ => Err("not an integer"),
    }
}

fn to_bool(v: RawValue) -> Coerced<bool> {
    match v {
        RawValue::Null => Ok(None),
        RawValue::Bool(b) => Ok(Some(b)),
        RawValue::Int(0) => Ok(Some(false)),
        RawValue::Int(1) => Ok(Some(true)),
        RawValue::Float(f) if !f.is_finite() => Ok(None),
        RawValue::Text(s) if is_empty_marker(&s) => Ok(None),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err("not a boolean"),
        },
        _ => Err("not a boolean"),
    }
}

fn epoch_to_date(raw: i64) -> Coerced<String> {
    let secs = if raw.unsigned_abs() > EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        raw / 1000
    } else {
        raw
    };
    DateTime::from_timestamp(secs, 0)
        .map(|dt| Some(dt.format("%Y-%m-%d").to_string()))
        .ok_or("timestamp out of range")
}

fn to_date(v: RawValue) -> Coerced<String> {
    match v {
        RawValue::Int(i) => epoch_to_date(i),
        RawValue::Float(f) if !f.is_finite() => Ok(None),
        RawValue::Float(f) if f.abs() < i64::MAX as f64 => epoch_to_date(f.trunc() as i64),
        RawValue::Float(_) => Err("timestamp out of range"),
        RawValue::Bool(_) => Err("not a date"),
        other => to_text(other),
    }
}
