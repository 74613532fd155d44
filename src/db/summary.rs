use super::{parse_time, placeholders};
use crate::errors::AppResult;
use crate::models::{SummaryQuery, UserSummary};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

const SUMMARY_COLUMNS: &str = "user_id, full_name, dept_id, dept_name, updated_at, version";

// User joined with its department as of now.
const PROJECTION_SOURCE: &str = "SELECT u.id AS id,
            u.family_name || ' ' || u.first_name AS full_name,
            u.dept_id AS dept_id,
            d.name AS dept_name,
            u.version AS version
     FROM users u
     INNER JOIN departments d ON d.id = u.dept_id";

pub struct SummaryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SummaryStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn copy_from_users(&self, user_ids: &[&str], now: DateTime<Utc>) -> AppResult<usize> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "INSERT INTO user_summary ({})
             SELECT src.id, src.full_name, src.dept_id, src.dept_name, ?, src.version
             FROM ({}) AS src
             WHERE src.id IN ({})",
            SUMMARY_COLUMNS,
            PROJECTION_SOURCE,
            placeholders(user_ids.len())
        );
        self.execute_with_ids(&query, user_ids, now)
    }

    pub fn refresh_from_users(&self, user_ids: &[&str], now: DateTime<Utc>) -> AppResult<usize> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "UPDATE user_summary
             SET full_name = src.full_name,
                 dept_id = src.dept_id,
                 dept_name = src.dept_name,
                 updated_at = ?,
                 version = src.version
             FROM ({}) AS src
             WHERE user_summary.user_id = src.id AND src.id IN ({})",
            PROJECTION_SOURCE,
            placeholders(user_ids.len())
        );
        self.execute_with_ids(&query, user_ids, now)
    }

    fn execute_with_ids(&self, query: &str, user_ids: &[&str], now: DateTime<Utc>) -> AppResult<usize> {
        let now = now.to_rfc3339();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(user_ids.len() + 1);
        values.push(&now);
        for id in user_ids {
            values.push(id);
        }
        let affected = self.conn.execute(query, rusqlite::params_from_iter(values))?;
        Ok(affected)
    }

    pub fn find(&self, user_id: &str) -> AppResult<Option<UserSummary>> {
        let query = format!("SELECT {} FROM user_summary WHERE user_id = ?1", SUMMARY_COLUMNS);
        let summary = self
            .conn
            .query_row(&query, [user_id], parse_summary_row)
            .optional()?;
        Ok(summary)
    }

    pub fn search(&self, filters: &SummaryQuery) -> AppResult<Vec<UserSummary>> {
        let mut query = format!("SELECT {} FROM user_summary WHERE 1 = 1", SUMMARY_COLUMNS);
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(name) = &filters.name {
            query.push_str(" AND full_name LIKE ? ESCAPE '\\'");
            params_vec.push(format!("%{}%", escape_like(name)));
        }
        if let Some(dept_id) = &filters.dept_id {
            query.push_str(" AND dept_id = ?");
            params_vec.push(dept_id.clone());
        }
        if let Some(begin_date) = filters.begin_date {
            query.push_str(" AND date(updated_at) >= ?");
            params_vec.push(begin_date.format("%Y-%m-%d").to_string());
        }
        if let Some(end_date) = filters.end_date {
            query.push_str(" AND date(updated_at) <= ?");
            params_vec.push(end_date.format("%Y-%m-%d").to_string());
        }

        query.push_str(" ORDER BY user_id ASC LIMIT ? OFFSET ?");
        tracing::debug!(query = %query, filters = params_vec.len(), "summary search");

        let limit = i64::from(filters.limit);
        let offset = i64::try_from(filters.offset).unwrap_or(i64::MAX);

        let mut statement = self.conn.prepare(&query)?;
        let mut dyn_params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|param| param as &dyn rusqlite::ToSql)
            .collect();
        dyn_params.push(&limit);
        dyn_params.push(&offset);

        let rows = statement.query_map(rusqlite::params_from_iter(dyn_params), parse_summary_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_summary_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        user_id: row.get(0)?,
        full_name: row.get(1)?,
        dept_id: row.get(2)?,
        dept_name: row.get(3)?,
        updated_at: parse_time(&row.get::<_, String>(4)?)?,
        version: row.get(5)?,
    })
}
