use super::placeholders;
use crate::errors::AppResult;
use crate::models::User;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct UserStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> UserStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, user: &User, now: DateTime<Utc>) -> AppResult<usize> {
        self.insert_many(std::slice::from_ref(user), now)
    }

    // One multi-row INSERT, so SQLite reports all rows or fails.
    pub fn insert_many(&self, users: &[User], now: DateTime<Utc>) -> AppResult<usize> {
        if users.is_empty() {
            return Ok(0);
        }
        let now = now.to_rfc3339();
        let rows = vec!["(?, ?, ?, ?, ?, ?, ?)"; users.len()].join(", ");
        let query = format!(
            "INSERT INTO users (id, family_name, first_name, dept_id, version, created_at, updated_at) VALUES {}",
            rows
        );

        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(users.len() * 7);
        for user in users {
            values.push(&user.id);
            values.push(&user.family_name);
            values.push(&user.first_name);
            values.push(&user.dept_id);
            values.push(&user.version);
            values.push(&now);
            values.push(&now);
        }

        let inserted = self.conn.execute(&query, rusqlite::params_from_iter(values))?;
        Ok(inserted)
    }

    pub fn update(&self, user: &User, now: DateTime<Utc>) -> AppResult<usize> {
        self.update_many(std::slice::from_ref(user), now)
    }

    pub fn update_many(&self, users: &[User], now: DateTime<Utc>) -> AppResult<usize> {
        let now = now.to_rfc3339();
        let mut statement = self.conn.prepare_cached(
            "UPDATE users
             SET family_name = ?1, first_name = ?2, dept_id = ?3, version = version + 1, updated_at = ?4
             WHERE id = ?5 AND version = ?6",
        )?;
        let mut updated = 0usize;
        for user in users {
            updated += statement.execute(params![
                user.family_name,
                user.first_name,
                user.dept_id,
                now,
                user.id,
                user.version,
            ])?;
        }
        Ok(updated)
    }

    pub fn count_existing(&self, ids: &[&str]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let query = format!(
            "SELECT COUNT(DISTINCT id) FROM users WHERE id IN ({})",
            placeholders(ids.len())
        );
        let count: i64 = self
            .conn
            .query_row(&query, rusqlite::params_from_iter(ids.iter()), |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn find(&self, id: &str) -> AppResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, family_name, first_name, dept_id, version FROM users WHERE id = ?1",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }
}

fn parse_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        family_name: row.get(1)?,
        first_name: row.get(2)?,
        dept_id: row.get(3)?,
        version: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::UserStore;
    use crate::db::{is_primary_key_violation, test_support};
    use crate::models::User;
    use chrono::Utc;

    fn user(id: &str, version: i64) -> User {
        User {
            id: id.to_string(),
            family_name: "Smith".to_string(),
            first_name: "Jane".to_string(),
            dept_id: "01".to_string(),
            version,
        }
    }

    #[test]
    fn insert_many_reports_every_row() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = test_support::open(&dir);
        let inserted = db
            .write_transaction(|tx| {
                UserStore::new(tx).insert_many(&[user("b_01", 0), user("b_02", 0), user("b_03", 0)], Utc::now())
            })
            .expect("insert");
        assert_eq!(inserted, 3);

        let existing = db
            .read_transaction(|tx| UserStore::new(tx).count_existing(&["b_01", "b_03", "b_03", "b_09"]))
            .expect("count");
        assert_eq!(existing, 2);
    }

    #[test]
    fn duplicate_insert_surfaces_primary_key_violation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = test_support::open(&dir);
        db.write_transaction(|tx| UserStore::new(tx).insert(&user("a_01", 0), Utc::now()))
            .expect("first insert");
        let error = db
            .write_transaction(|tx| UserStore::new(tx).insert(&user("a_01", 0), Utc::now()))
            .expect_err("second insert");
        assert!(is_primary_key_violation(&error));
    }

    #[test]
    fn update_applies_only_on_matching_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = test_support::open(&dir);
        db.write_transaction(|tx| UserStore::new(tx).insert(&user("a_01", 0), Utc::now()))
            .expect("insert");

        let mut renamed = user("a_01", 0);
        renamed.first_name = "Janet".to_string();
        let first = db
            .write_transaction(|tx| UserStore::new(tx).update(&renamed, Utc::now()))
            .expect("update");
        let stale = db
            .write_transaction(|tx| UserStore::new(tx).update(&renamed, Utc::now()))
            .expect("stale update");
        assert_eq!(first, 1);
        assert_eq!(stale, 0);

        let stored = db
            .read_transaction(|tx| UserStore::new(tx).find("a_01"))
            .expect("find")
            .expect("exists");
        assert_eq!(stored.version, 1);
        assert_eq!(stored.first_name, "Janet");
    }
}
