use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Primary personnel record. `id` is `<17-digit base>_<2-digit sequence>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub family_name: String,
    pub first_name: String,
    pub dept_id: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    pub deleted: bool,
}

/// Denormalized projection of a user joined with its department at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: String,
    pub full_name: String,
    pub dept_id: String,
    pub dept_name: String,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserParam {
    pub family_name: String,
    pub first_name: String,
    pub dept_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserParam {
    pub id: String,
    pub family_name: String,
    pub first_name: String,
    pub dept_id: String,
    /// Version the caller last read.
    pub version: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUserParam {
    pub name: Option<String>,
    pub dept_id: Option<String>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page_no: u32,
    pub page_size: u32,
}

/// Filter and window handed to the summary store; offsets are already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryQuery {
    pub name: Option<String>,
    pub dept_id: Option<String>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: u32,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub name: String,
    pub dept_id: String,
    pub dept_name: String,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub items: Vec<SearchResultItem>,
    pub prev_page_no: Option<u32>,
    pub next_page_no: Option<u32>,
    pub page_size: u32,
}

impl From<UserSummary> for SearchResultItem {
    fn from(value: UserSummary) -> Self {
        Self {
            name: value.full_name,
            dept_id: value.dept_id,
            dept_name: value.dept_name,
            updated_at: value.updated_at,
            user_id: value.user_id,
            version: value.version,
        }
    }
}

/// Comma-joins keys in the order given, keeping duplicates.
pub fn join_keys<S: AsRef<str>>(keys: &[S]) -> String {
    keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}
