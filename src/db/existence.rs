use super::departments;
use super::users::UserStore;
use crate::errors::AppResult;
use rusqlite::Connection;
use std::collections::BTreeSet;

pub struct ExistenceChecker<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ExistenceChecker<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn department_exists(&self, dept_id: &str) -> AppResult<bool> {
        self.all_departments_exist(&[dept_id])
    }

    pub fn all_departments_exist(&self, dept_ids: &[&str]) -> AppResult<bool> {
        let distinct = distinct(dept_ids);
        Ok(departments::count_active(self.conn, &distinct)? == distinct.len())
    }

    pub fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        self.all_users_exist(&[user_id])
    }

    pub fn any_user_exists(&self, user_ids: &[&str]) -> AppResult<bool> {
        let distinct = distinct(user_ids);
        Ok(UserStore::new(self.conn).count_existing(&distinct)? > 0)
    }

    pub fn all_users_exist(&self, user_ids: &[&str]) -> AppResult<bool> {
        let distinct = distinct(user_ids);
        Ok(UserStore::new(self.conn).count_existing(&distinct)? == distinct.len())
    }
}

fn distinct<'a>(keys: &[&'a str]) -> Vec<&'a str> {
    keys.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::ExistenceChecker;
    use crate::db::{test_support, UserStore};
    use crate::models::User;
    use chrono::Utc;

    #[test]
    fn set_checks_ignore_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = test_support::open(&dir);
        db.write_transaction(|tx| {
            UserStore::new(tx).insert(
                &User {
                    id: "a_01".to_string(),
                    family_name: "Smith".to_string(),
                    first_name: "Jane".to_string(),
                    dept_id: "01".to_string(),
                    version: 0,
                },
                Utc::now(),
            )
        })
        .expect("insert");

        db.read_transaction(|tx| {
            let checker = ExistenceChecker::new(tx);
            assert!(checker.department_exists("01")?);
            assert!(!checker.department_exists("99")?);
            assert!(checker.all_departments_exist(&["01", "02", "01"])?);
            assert!(!checker.all_departments_exist(&["01", "99"])?);

            assert!(checker.user_exists("a_01")?);
            assert!(checker.all_users_exist(&["a_01", "a_01"])?);
            assert!(!checker.all_users_exist(&["a_01", "b_01"])?);
            assert!(checker.any_user_exists(&["b_01", "a_01"])?);
            assert!(!checker.any_user_exists(&["b_01"])?);
            Ok(())
        })
        .expect("checks");
    }
}
