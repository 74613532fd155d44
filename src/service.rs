use crate::audit::{self, AuditNotifier};
use crate::config::ServiceConfig;
use crate::coordinator::WriteCoordinator;
use crate::db::{Database, SummaryStore, UserStore};
use crate::errors::AppResult;
use crate::id_generator::{IdGenerator, TimestampIdGenerator};
use crate::messages::MessageCatalog;
use crate::models::{CreateUserParam, SearchResult, SearchUserParam, UpdateUserParam, User, UserSummary};
use crate::search::SearchAssembler;
use std::sync::Arc;

/// Entry point for callers. Every collaborator is passed in or built here; nothing is looked up
/// at runtime.
#[derive(Clone)]
pub struct PersonnelService {
    db: Arc<Database>,
    writes: WriteCoordinator,
    search: SearchAssembler,
}

impl PersonnelService {
    pub fn open(config: &ServiceConfig) -> AppResult<Self> {
        config.validate()?;
        let db = Arc::new(Database::new(&config.database_path)?);
        let seeded = db.seed_departments(&config.departments)?;
        if seeded > 0 {
            tracing::info!(count = seeded, "seeded departments from config");
        }

        let audit: Arc<dyn AuditNotifier> = Arc::from(audit::from_config(&config.audit));
        Ok(Self::with_components(
            db,
            Arc::new(TimestampIdGenerator::new()),
            MessageCatalog::new(config.messages.clone()),
            audit,
        ))
    }

    pub fn with_components(
        db: Arc<Database>,
        ids: Arc<dyn IdGenerator>,
        messages: MessageCatalog,
        audit: Arc<dyn AuditNotifier>,
    ) -> Self {
        Self {
            writes: WriteCoordinator::new(db.clone(), ids, messages, audit),
            search: SearchAssembler::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn create_user(&self, operator: &str, param: &CreateUserParam) -> AppResult<()> {
        self.writes.create_user(operator, param)
    }

    pub fn bulk_create_users(&self, operator: &str, params: &[CreateUserParam]) -> AppResult<()> {
        self.writes.bulk_create_users(operator, params)
    }

    pub fn update_user(&self, operator: &str, param: &UpdateUserParam) -> AppResult<()> {
        self.writes.update_user(operator, param)
    }

    pub fn bulk_update_users(&self, operator: &str, params: &[UpdateUserParam]) -> AppResult<()> {
        self.writes.bulk_update_users(operator, params)
    }

    pub fn search_users(&self, operator: &str, param: &SearchUserParam) -> AppResult<SearchResult> {
        self.search.search_users(operator, param)
    }

    pub fn find_user(&self, user_id: &str) -> AppResult<Option<User>> {
        self.db.read_transaction(|tx| UserStore::new(tx).find(user_id))
    }

    pub fn find_summary(&self, user_id: &str) -> AppResult<Option<UserSummary>> {
        self.db.read_transaction(|tx| SummaryStore::new(tx).find(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::PersonnelService;
    use crate::config::{DepartmentSeed, ServiceConfig};
    use crate::models::{CreateUserParam, SearchUserParam};

    #[test]
    fn open_seeds_departments_and_serves_requests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ServiceConfig::new(dir.path().join("personnel.sqlite"));
        config.departments = vec![DepartmentSeed {
            id: "01".to_string(),
            name: "Sales".to_string(),
        }];

        let service = PersonnelService::open(&config).expect("open service");
        service
            .create_user(
                "op-1",
                &CreateUserParam {
                    family_name: "Smith".to_string(),
                    first_name: "Jane".to_string(),
                    dept_id: "01".to_string(),
                },
            )
            .expect("create");

        let page = service
            .search_users(
                "op-1",
                &SearchUserParam {
                    page_no: 1,
                    page_size: 10,
                    ..SearchUserParam::default()
                },
            )
            .expect("search");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].dept_name, "Sales");
        assert!(service.database().path().ends_with("personnel.sqlite"));
    }

    #[test]
    fn open_rejects_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ServiceConfig::new(dir.path().join("personnel.sqlite"));
        config.audit.timeout_ms = 0;
        assert!(PersonnelService::open(&config).is_err());
    }
}
