// src/search/request.rs
//! Raw search input and its validated form.
//!
//! `SearchInput` is whatever the caller sent; `SearchRequest` only exists
//! once every constraint holds. Validation reports all violations at once.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::sources::SourceId;

pub const RESULTS_WANTED_MIN: i64 = 1;
pub const RESULTS_WANTED_MAX: i64 = 100;
pub const DEFAULT_RESULTS_WANTED: u32 = 20;
pub const DISTANCE_MAX: i64 = 500;
pub const DEFAULT_DISTANCE: u32 = 50;
pub const DEFAULT_COUNTRY: &str = "usa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Fulltime,
    Parttime,
    Contract,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::Fulltime,
        JobType::Parttime,
        JobType::Contract,
        JobType::Internship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Fulltime => "fulltime",
            JobType::Parttime => "parttime",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|jt| jt.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionFormat {
    #[default]
    Markdown,
    Html,
    Plain,
}

impl DescriptionFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" => Some(Self::Markdown),
            "html" => Some(Self::Html),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Request body as received. Every field is kept as raw JSON so that a
/// wrongly typed value becomes a violation for that field instead of a
/// rejected body. `None` is an absent key, `Some(Value::Null)` an explicit
/// `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchInput {
    #[serde(default, deserialize_with = "present")]
    pub search_term: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Value>,
    #[serde(default, alias = "sources", deserialize_with = "present")]
    pub site_name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub results_wanted: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub hours_old: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub country_indeed: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub job_type: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub is_remote: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub distance: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description_format: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin_fetch_description: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// Validated search. Serializes with the wire names upstream scrapers expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    search_term: String,
    location: Option<String>,
    #[serde(rename = "site_name")]
    sources: Vec<SourceId>,
    results_wanted: u32,
    hours_old: Option<u32>,
    #[serde(rename = "country_indeed")]
    country: String,
    job_type: Option<JobType>,
    is_remote: bool,
    distance: Option<u32>,
    description_format: DescriptionFormat,
    linkedin_fetch_description: bool,
}

impl SearchRequest {
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// The same search addressed to `source` alone.
    pub fn for_source(&self, source: &SourceId) -> SearchRequest {
        SearchRequest {
            sources: vec![source.clone()],
            ..self.clone()
        }
    }

    pub fn results_wanted(&self) -> u32 {
        self.results_wanted
    }

    pub fn hours_old(&self) -> Option<u32> {
        self.hours_old
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn job_type(&self) -> Option<JobType> {
        self.job_type
    }

    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    pub fn description_format(&self) -> DescriptionFormat {
        self.description_format
    }

    pub fn linkedin_fetch_description(&self) -> bool {
        self.linkedin_fetch_description
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid search request: {}", summary(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::new(field, message)],
        }
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

/// What validation checks ids and countries against.
#[derive(Debug, Clone)]
pub struct Constraints<'a> {
    pub known_sources: &'a [SourceId],
    pub default_sources: &'a [SourceId],
    pub countries: &'a [&'a str],
}

/// Field-by-field coercion of raw JSON, collecting every problem.
#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }

    /// Trimmed, non-blank text. Absent, `null` and blank are all `None`.
    fn text(&mut self, field: &str, v: Option<Value>) -> Option<String> {
        match v? {
            Value::Null => None,
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            other => {
                self.fail(field, format!("must be a string, got {}", kind_of(&other)));
                None
            }
        }
    }

    /// Outer `None`: absent or not an integer (reported). `Some(None)`: explicit `null`.
    fn int(&mut self, field: &str, v: Option<Value>) -> Option<Option<i64>> {
        let parsed = match v? {
            Value::Null => return Some(None),
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, "must be an integer");
            return None;
        }
        Some(parsed)
    }

    fn boolean(&mut self, field: &str, v: Option<Value>) -> Option<bool> {
        let parsed = match v? {
            Value::Null => return None,
            Value::Bool(b) => Some(b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        if parsed.is_none() {
            self.fail(field, "must be a boolean");
        }
        parsed
    }

    fn string_list(&mut self, field: &str, v: Option<Value>) -> Option<Vec<String>> {
        match v? {
            Value::Null => None,
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s),
                        other => self.fail(field, format!("entries must be strings, got {}", kind_of(&other))),
                    }
                }
                Some(out)
            }
            other => {
                self.fail(field, format!("must be a list of strings, got {}", kind_of(&other)));
                Some(Vec::new())
            }
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

impl SearchInput {
    /// Validate against `c`. `null` means "use the default" except for
    /// `distance` and `hours_old`, where it means "no limit".
    pub fn validate(self, c: &Constraints<'_>) -> Result<SearchRequest, ValidationError> {
        let mut ck = Checker::default();

        let search_term = ck.text("search_term", self.search_term).unwrap_or_else(|| {
            if !ck.violations.iter().any(|v| v.field == "search_term") {
                ck.fail("search_term", "must not be empty");
            }
            String::new()
        });

        let sources = match ck.string_list("site_name", self.site_name) {
            None => c.default_sources.to_vec(),
            Some(list) => {
                let mut out: Vec<SourceId> = Vec::with_capacity(list.len());
                for raw in list {
                    let id = SourceId::new(raw.trim().to_ascii_lowercase());
                    if !c.known_sources.contains(&id) {
                        ck.fail("site_name", format!("unknown source '{}'", raw.trim()));
                    } else if !out.contains(&id) {
                        out.push(id);
                    }
                }
                out
            }
        };
        if sources.is_empty() && !ck.violations.iter().any(|v| v.field == "site_name") {
            ck.fail("site_name", "at least one source is required");
        }

        let results_wanted = match ck.int("results_wanted", self.results_wanted).flatten() {
            None => DEFAULT_RESULTS_WANTED,
            Some(n) if (RESULTS_WANTED_MIN..=RESULTS_WANTED_MAX).contains(&n) => n as u32,
            Some(n) => {
                ck.fail(
                    "results_wanted",
                    format!("must be between {RESULTS_WANTED_MIN} and {RESULTS_WANTED_MAX}, got {n}"),
                );
                DEFAULT_RESULTS_WANTED
            }
        };

        let hours_old = match ck.int("hours_old", self.hours_old).flatten() {
            None => None,
            Some(h) if h >= 1 && h <= u32::MAX as i64 => Some(h as u32),
            Some(h) => {
                ck.fail("hours_old", format!("must be a positive number of hours, got {h}"));
                None
            }
        };

        let distance = match ck.int("distance", self.distance) {
            None => Some(DEFAULT_DISTANCE),
            Some(None) => None,
            Some(Some(d)) if (0..=DISTANCE_MAX).contains(&d) => Some(d as u32),
            Some(Some(d)) => {
                ck.fail("distance", format!("must be between 0 and {DISTANCE_MAX}, got {d}"));
                None
            }
        };

        let country = match ck.text("country_indeed", self.country_indeed) {
            None => DEFAULT_COUNTRY.to_string(),
            Some(raw) => {
                let lc = raw.to_ascii_lowercase();
                if !c.countries.iter().any(|k| *k == lc) {
                    ck.fail("country_indeed", format!("unknown country '{raw}'"));
                }
                lc
            }
        };

        let job_type = match ck.text("job_type", self.job_type) {
            None => None,
            Some(raw) => {
                let parsed = JobType::parse(&raw);
                if parsed.is_none() {
                    ck.fail(
                        "job_type",
                        format!("must be one of fulltime, parttime, contract, internship; got '{raw}'"),
                    );
                }
                parsed
            }
        };

        let description_format = match ck.text("description_format", self.description_format) {
            None => DescriptionFormat::default(),
            Some(raw) => DescriptionFormat::parse(&raw).unwrap_or_else(|| {
                ck.fail(
                    "description_format",
                    format!("must be one of markdown, html, plain; got '{raw}'"),
                );
                DescriptionFormat::default()
            }),
        };

        let location = ck.text("location", self.location);
        let is_remote = ck.boolean("is_remote", self.is_remote).unwrap_or(false);
        let linkedin_fetch_description = ck
            .boolean("linkedin_fetch_description", self.linkedin_fetch_description)
            .unwrap_or(false);

        if !ck.violations.is_empty() {
            return Err(ValidationError {
                violations: ck.violations,
            });
        }

        Ok(SearchRequest {
            search_term,
            location,
            sources,
            results_wanted,
            hours_old,
            country,
            job_type,
            is_remote,
            distance,
            description_format,
            linkedin_fetch_description,
        })
    }
}
