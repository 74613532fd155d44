pub mod departments;
pub mod existence;
pub mod summary;
pub mod users;

use crate::config::DepartmentSeed;
use crate::errors::{AppError, AppResult};
use crate::models::Department;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub use existence::ExistenceChecker;
pub use summary::SummaryStore;
pub use users::UserStore;

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    // IMMEDIATE takes the write lock up front so checks and writes cannot interleave with another writer.
    pub fn write_transaction<T>(&self, work: impl FnOnce(&Transaction<'_>) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = work(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn read_transaction<T>(&self, work: impl FnOnce(&Transaction<'_>) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self.lock()?;
        conn.execute_batch("PRAGMA query_only = ON")?;
        let result = run_deferred(&mut conn, work);
        conn.execute_batch("PRAGMA query_only = OFF")?;
        result
    }

    pub fn insert_department(&self, department: &Department) -> AppResult<()> {
        self.write_transaction(|tx| departments::upsert(tx, department))
    }

    pub fn seed_departments(&self, seeds: &[DepartmentSeed]) -> AppResult<usize> {
        if seeds.is_empty() {
            return Ok(0);
        }
        self.write_transaction(|tx| {
            let mut seeded = 0usize;
            for seed in seeds {
                departments::upsert(
                    tx,
                    &Department {
                        id: seed.id.clone(),
                        name: seed.name.clone(),
                        deleted: false,
                    },
                )?;
                seeded += 1;
            }
            Ok(seeded)
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }
}

fn run_deferred<T>(
    conn: &mut Connection,
    work: impl FnOnce(&Transaction<'_>) -> AppResult<T>,
) -> AppResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn is_primary_key_violation(error: &AppError) -> bool {
    match error {
        AppError::Store(rusqlite::Error::SqliteFailure(code, message)) => {
            code.code == ErrorCode::ConstraintViolation
                && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || message.as_deref().is_some_and(|value| {
                        value.contains("UNIQUE constraint failed")
                            || value.contains("PRIMARY KEY constraint failed")
                    }))
        }
        _ => false,
    }
}

pub(crate) fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use crate::models::Department;

    pub fn open(dir: &tempfile::TempDir) -> Database {
        let db = Database::new(&dir.path().join("test.db")).expect("db");
        for (id, name) in [("01", "Sales"), ("02", "Engineering"), ("03", "Finance")] {
            db.insert_department(&Department {
                id: id.to_string(),
                name: name.to_string(),
                deleted: false,
            })
            .expect("insert department");
        }
        db
    }
}
