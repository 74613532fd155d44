use crate::audit::{
    notify_best_effort, AuditNotifier, OP_BULK_CREATE_USERS, OP_BULK_UPDATE_USERS, OP_CREATE_USER, OP_UPDATE_USER,
};
use crate::db::{is_primary_key_violation, Database, ExistenceChecker, SummaryStore, UserStore};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::id_generator::{record_id, IdGenerator};
use crate::messages::MessageCatalog;
use crate::models::{join_keys, CreateUserParam, UpdateUserParam, User};
use chrono::Utc;
use rusqlite::Transaction;
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_BATCH_SIZE: usize = 99;

/// Sequences the user write path: department check, user existence check, guarded write,
/// summary sync. Each request runs in one write transaction; any failure rolls all of it back
/// and no audit notification is sent.
#[derive(Clone)]
pub struct WriteCoordinator {
    db: Arc<Database>,
    ids: Arc<dyn IdGenerator>,
    messages: MessageCatalog,
    audit: Arc<dyn AuditNotifier>,
}

impl WriteCoordinator {
    pub fn new(
        db: Arc<Database>,
        ids: Arc<dyn IdGenerator>,
        messages: MessageCatalog,
        audit: Arc<dyn AuditNotifier>,
    ) -> Self {
        Self {
            db,
            ids,
            messages,
            audit,
        }
    }

    pub fn create_user(&self, operator: &str, param: &CreateUserParam) -> AppResult<()> {
        let base = self.ids.next_base();
        let user = build_new_user(&base, 1, param);
        self.db.write_transaction(|tx| self.insert_users(tx, std::slice::from_ref(&user)))?;

        tracing::info!(operator, user_id = %user.id, "user created");
        notify_best_effort(self.audit.as_ref(), OP_CREATE_USER, operator);
        Ok(())
    }

    /// All users in one call share a base id and differ only by the `_NN` suffix, in input order.
    pub fn bulk_create_users(&self, operator: &str, params: &[CreateUserParam]) -> AppResult<()> {
        ensure_batch_size(params.len())?;
        let base = self.ids.next_base();
        let users: Vec<User> = params
            .iter()
            .enumerate()
            .map(|(index, param)| build_new_user(&base, index + 1, param))
            .collect();
        self.db.write_transaction(|tx| self.insert_users(tx, &users))?;

        tracing::info!(operator, base = %base, count = users.len(), "users created");
        notify_best_effort(self.audit.as_ref(), OP_BULK_CREATE_USERS, operator);
        Ok(())
    }

    pub fn update_user(&self, operator: &str, param: &UpdateUserParam) -> AppResult<()> {
        let user = build_updated_user(param);
        self.db.write_transaction(|tx| self.update_users(tx, std::slice::from_ref(&user)))?;

        tracing::info!(operator, user_id = %user.id, version = user.version + 1, "user updated");
        notify_best_effort(self.audit.as_ref(), OP_UPDATE_USER, operator);
        Ok(())
    }

    pub fn bulk_update_users(&self, operator: &str, params: &[UpdateUserParam]) -> AppResult<()> {
        ensure_batch_size(params.len())?;
        ensure_distinct_ids(params)?;
        let users: Vec<User> = params.iter().map(build_updated_user).collect();
        self.db.write_transaction(|tx| self.update_users(tx, &users))?;

        tracing::info!(operator, count = users.len(), "users updated");
        notify_best_effort(self.audit.as_ref(), OP_BULK_UPDATE_USERS, operator);
        Ok(())
    }

    fn insert_users(&self, tx: &Transaction<'_>, users: &[User]) -> AppResult<()> {
        let now = Utc::now();
        let checker = ExistenceChecker::new(tx);
        let dept_ids: Vec<&str> = users.iter().map(|user| user.dept_id.as_str()).collect();
        let user_ids: Vec<&str> = users.iter().map(|user| user.id.as_str()).collect();

        if !checker.all_departments_exist(&dept_ids)? {
            return Err(self.reject(ErrorCode::DepartmentMissingOnCreate, &dept_ids));
        }
        if checker.any_user_exists(&user_ids)? {
            return Err(self.reject(ErrorCode::RecordAlreadyExists, &user_ids));
        }

        // A concurrent writer outside this process can still win the race; the primary key
        // turns that into the same duplicate error.
        let inserted = match UserStore::new(tx).insert_many(users, now) {
            Ok(inserted) => inserted,
            Err(error) if is_primary_key_violation(&error) => {
                return Err(self.reject(ErrorCode::RecordAlreadyExists, &user_ids));
            }
            Err(error) => return Err(error),
        };
        if inserted != users.len() {
            return Err(self.reject(ErrorCode::InsertCountMismatch, &user_ids));
        }

        let copied = SummaryStore::new(tx).copy_from_users(&user_ids, now)?;
        if copied != users.len() {
            return Err(self.reject(ErrorCode::SummaryCopyCountMismatch, &user_ids));
        }
        Ok(())
    }

    fn update_users(&self, tx: &Transaction<'_>, users: &[User]) -> AppResult<()> {
        let now = Utc::now();
        let checker = ExistenceChecker::new(tx);
        let dept_ids: Vec<&str> = users.iter().map(|user| user.dept_id.as_str()).collect();
        let user_ids: Vec<&str> = users.iter().map(|user| user.id.as_str()).collect();

        if !checker.all_departments_exist(&dept_ids)? {
            return Err(self.reject(ErrorCode::DepartmentMissingOnUpdate, &dept_ids));
        }
        if !checker.all_users_exist(&user_ids)? {
            return Err(self.reject(ErrorCode::RecordMissing, &user_ids));
        }

        // A stale version and a row that vanished both show up here as a short count.
        let updated = UserStore::new(tx).update_many(users, now)?;
        if updated != users.len() {
            return Err(self.reject(ErrorCode::UpdateCountMismatch, &user_ids));
        }

        let refreshed = SummaryStore::new(tx).refresh_from_users(&user_ids, now)?;
        if refreshed != users.len() {
            return Err(self.reject(ErrorCode::SummaryRefreshCountMismatch, &user_ids));
        }
        Ok(())
    }

    fn reject(&self, code: ErrorCode, keys: &[&str]) -> AppError {
        let context = join_keys(keys);
        tracing::warn!(code = code.code(), context = %context, "user write rejected");
        AppError::Business(self.messages.business(code, context))
    }
}

fn build_new_user(base: &str, sequence: usize, param: &CreateUserParam) -> User {
    User {
        id: record_id(base, sequence),
        family_name: param.family_name.clone(),
        first_name: param.first_name.clone(),
        dept_id: param.dept_id.clone(),
        version: 0,
    }
}

fn build_updated_user(param: &UpdateUserParam) -> User {
    User {
        id: param.id.clone(),
        family_name: param.family_name.clone(),
        first_name: param.first_name.clone(),
        dept_id: param.dept_id.clone(),
        version: param.version,
    }
}

fn ensure_batch_size(len: usize) -> AppResult<()> {
    if len == 0 {
        return Err(AppError::InvalidInput("at least one user is required".to_string()));
    }
    if len > MAX_BATCH_SIZE {
        return Err(AppError::InvalidInput(format!(
            "at most {} users can be written in one call",
            MAX_BATCH_SIZE
        )));
    }
    Ok(())
}

fn ensure_distinct_ids(params: &[UpdateUserParam]) -> AppResult<()> {
    let mut seen = BTreeSet::new();
    match params.iter().find(|param| !seen.insert(param.id.as_str())) {
        Some(repeated) => Err(AppError::InvalidInput(format!(
            "user {} appears more than once in one update",
            repeated.id
        ))),
        None => Ok(()),
    }
}
