use super::placeholders;
use crate::errors::AppResult;
use crate::models::Department;
use rusqlite::{params, Connection, OptionalExtension};

pub fn upsert(conn: &Connection, department: &Department) -> AppResult<()> {
    conn.execute(
        "INSERT INTO departments (id, name, deleted) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, deleted = excluded.deleted",
        params![department.id, department.name, department.deleted],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Department>> {
    let department = conn
        .query_row(
            "SELECT id, name, deleted FROM departments WHERE id = ?1",
            [id],
            |row| {
                Ok(Department {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    deleted: row.get::<_, i32>(2)? != 0,
                })
            },
        )
        .optional()?;
    Ok(department)
}

pub fn count_active(conn: &Connection, ids: &[&str]) -> AppResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let query = format!(
        "SELECT COUNT(DISTINCT id) FROM departments WHERE deleted = 0 AND id IN ({})",
        placeholders(ids.len())
    );
    let count: i64 = conn.query_row(&query, rusqlite::params_from_iter(ids.iter()), |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or_default())
}
