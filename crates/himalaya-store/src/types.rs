//! Airtable REST response types for the list-records endpoint.
//!
//! Airtable omits a field entirely when the cell is empty, so every value in
//! `fields` is optional and loosely typed. Typing happens in
//! [`crate::normalize`], not here.

use serde::Deserialize;

/// Top-level response from `GET /v0/{base}/{table}`.
#[derive(Debug, Deserialize)]
pub struct ListRecordsResponse {
    #[serde(default)]
    pub records: Vec<AirtableRecord>,

    /// Cursor for the next page. Absent on the last page.
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableRecord {
    /// Airtable record id, e.g. `"recA1b2C3d4E5f6G7"`.
    pub id: String,

    /// Cell values keyed by column name.
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,

    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
}
