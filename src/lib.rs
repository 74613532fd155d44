pub mod audit;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod errors;
pub mod id_generator;
pub mod messages;
pub mod models;
pub mod search;
pub mod service;

pub use crate::config::ServiceConfig;
pub use crate::errors::{AppError, AppResult, BusinessError, ErrorCode};
pub use crate::service::PersonnelService;

use tracing_appender::non_blocking::WorkerGuard;

/// Installs the global JSON subscriber. Keep the returned guard alive for the life of the
/// process; dropping it flushes buffered log lines.
pub fn init_tracing(config: &ServiceConfig) -> AppResult<WorkerGuard> {
    let (writer, guard) = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, "personnel.log"))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .json()
        .with_writer(writer)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))?;

    Ok(guard)
}
