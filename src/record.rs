// src/record.rs
//! Canonical job listing and the per-request aggregate that carries them.
//!
//! Every optional field uses `None` for "unknown". Serialization keeps those
//! as explicit `null` so clients can tell unknown apart from empty or zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sources::{RawRow, RawValue, SourceId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub site: SourceId,
    pub job_url: Option<String>,
    pub job_url_direct: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub job_type: Option<String>,
    pub salary_source: Option<String>,
    pub interval: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub currency: Option<String>,
    pub is_remote: Option<bool>,
    pub job_level: Option<String>,
    pub job_function: Option<String>,
    pub listing_type: Option<String>,
    pub emails: Option<String>,
    pub description: Option<String>,
    pub company_industry: Option<String>,
    pub company_url: Option<String>,
    pub company_logo: Option<String>,
    pub company_url_direct: Option<String>,
    pub company_addresses: Option<String>,
    pub company_num_employees: Option<String>,
    pub company_revenue: Option<String>,
    pub company_description: Option<String>,
    pub skills: Option<String>,
    pub experience_range: Option<String>,
    pub company_rating: Option<f64>,
    pub company_reviews_count: Option<i64>,
    pub vacancy_count: Option<i64>,
    pub work_from_home_type: Option<String>,
}

/// Typed view of one field, used by the CSV writer and `to_raw_row`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Float(Option<f64>),
    Int(Option<i64>),
    Bool(Option<bool>),
}

impl FieldValue<'_> {
    /// CSV cell; unknown renders as an empty cell.
    pub fn to_cell(self) -> String {
        match self {
            FieldValue::Text(v) => v.unwrap_or_default().to_string(),
            FieldValue::Float(v) => v.map(|f| f.to_string()).unwrap_or_default(),
            FieldValue::Int(v) => v.map(|i| i.to_string()).unwrap_or_default(),
            FieldValue::Bool(v) => v.map(|b| b.to_string()).unwrap_or_default(),
        }
    }

    fn to_raw(self) -> RawValue {
        match self {
            FieldValue::Text(v) => v.map(str::to_string).into(),
            FieldValue::Float(v) => v.into(),
            FieldValue::Int(v) => v.into(),
            FieldValue::Bool(v) => v.into(),
        }
    }
}

impl JobRecord {
    /// Canonical column order, shared by JSON consumers and the CSV export.
    pub const FIELD_NAMES: [&'static str; 34] = [
        "id",
        "site",
        "job_url",
        "job_url_direct",
        "title",
        "company",
        "location",
        "date_posted",
        "job_type",
        "salary_source",
        "interval",
        "min_amount",
        "max_amount",
        "currency",
        "is_remote",
        "job_level",
        "job_function",
        "listing_type",
        "emails",
        "description",
        "company_industry",
        "company_url",
        "company_logo",
        "company_url_direct",
        "company_addresses",
        "company_num_employees",
        "company_revenue",
        "company_description",
        "skills",
        "experience_range",
        "company_rating",
        "company_reviews_count",
        "vacancy_count",
        "work_from_home_type",
    ];

    /// A record with only the mandatory fields set.
    pub fn empty(id: impl Into<String>, site: SourceId) -> Self {
        Self {
            id: id.into(),
            site,
            job_url: None,
            job_url_direct: None,
            title: None,
            company: None,
            location: None,
            date_posted: None,
            job_type: None,
            salary_source: None,
            interval: None,
            min_amount: None,
            max_amount: None,
            currency: None,
            is_remote: None,
            job_level: None,
            job_function: None,
            listing_type: None,
            emails: None,
            description: None,
            company_industry: None,
            company_url: None,
            company_logo: None,
            company_url_direct: None,
            company_addresses: None,
            company_num_employees: None,
            company_revenue: None,
            company_description: None,
            skills: None,
            experience_range: None,
            company_rating: None,
            company_reviews_count: None,
            vacancy_count: None,
            work_from_home_type: None,
        }
    }

    /// All fields in `FIELD_NAMES` order.
    pub fn fields(&self) -> [FieldValue<'_>; 34] {
        use FieldValue::*;
        fn t(v: &Option<String>) -> FieldValue<'_> {
            FieldValue::Text(v.as_deref())
        }
        [
            Text(Some(self.id.as_str())),
            Text(Some(self.site.as_str())),
            t(&self.job_url),
            t(&self.job_url_direct),
            t(&self.title),
            t(&self.company),
            t(&self.location),
            t(&self.date_posted),
            t(&self.job_type),
            t(&self.salary_source),
            t(&self.interval),
            Float(self.min_amount),
            Float(self.max_amount),
            t(&self.currency),
            Bool(self.is_remote),
            t(&self.job_level),
            t(&self.job_function),
            t(&self.listing_type),
            t(&self.emails),
            t(&self.description),
            t(&self.company_industry),
            t(&self.company_url),
            t(&self.company_logo),
            t(&self.company_url_direct),
            t(&self.company_addresses),
            t(&self.company_num_employees),
            t(&self.company_revenue),
            t(&self.company_description),
            t(&self.skills),
            t(&self.experience_range),
            Float(self.company_rating),
            Int(self.company_reviews_count),
            Int(self.vacancy_count),
            t(&self.work_from_home_type),
        ]
    }

    /// Back to the adapter-boundary shape (unknown → `Null`).
    pub fn to_raw_row(&self) -> RawRow {
        Self::FIELD_NAMES
            .iter()
            .zip(self.fields())
            .map(|(name, value)| (name.to_string(), value.to_raw()))
            .collect()
    }

    pub fn csv_cells(&self) -> Vec<String> {
        self.fields().into_iter().map(FieldValue::to_cell).collect()
    }
}

/// Outcome of one search across all requested sources.
///
/// Fields are private so `total` always equals the number of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedResult {
    #[serde(rename = "jobs")]
    records: Vec<JobRecord>,
    total: usize,
    search_term: String,
    location: Option<String>,
    source_errors: BTreeMap<SourceId, String>,
}

impl AggregatedResult {
    pub fn new(
        records: Vec<JobRecord>,
        search_term: impl Into<String>,
        location: Option<String>,
        source_errors: BTreeMap<SourceId, String>,
    ) -> Self {
        Self {
            total: records.len(),
            records,
            search_term: search_term.into(),
            location,
            source_errors,
        }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<JobRecord> {
        self.records
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn source_errors(&self) -> &BTreeMap<SourceId, String> {
        &self.source_errors
    }

    /// True when at least one source failed entirely.
    pub fn is_partial(&self) -> bool {
        !self.source_errors.is_empty()
    }
}
