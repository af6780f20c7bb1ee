// src/sources/mod.rs
pub mod http;
pub mod types;

pub use http::HttpSourceAdapter;
pub use types::{row_from_json, RawRow, RawValue, SourceAdapter, SourceId};
