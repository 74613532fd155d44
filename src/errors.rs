use serde::{Serialize, Serializer};
use thiserror::Error;

/// Business failures raised by the write path. Each variant maps to one stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DepartmentMissingOnCreate,
    DepartmentMissingOnUpdate,
    RecordAlreadyExists,
    RecordMissing,
    InsertCountMismatch,
    UpdateCountMismatch,
    SummaryCopyCountMismatch,
    SummaryRefreshCountMismatch,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        Self::DepartmentMissingOnCreate,
        Self::DepartmentMissingOnUpdate,
        Self::RecordAlreadyExists,
        Self::RecordMissing,
        Self::InsertCountMismatch,
        Self::UpdateCountMismatch,
        Self::SummaryCopyCountMismatch,
        Self::SummaryRefreshCountMismatch,
    ];

    pub fn code(self) -> u16 {
        match self {
            Self::DepartmentMissingOnCreate => 401,
            Self::DepartmentMissingOnUpdate => 402,
            Self::RecordAlreadyExists => 101,
            Self::RecordMissing => 102,
            Self::InsertCountMismatch => 201,
            Self::UpdateCountMismatch => 202,
            Self::SummaryCopyCountMismatch => 301,
            Self::SummaryRefreshCountMismatch => 302,
        }
    }

    /// Key used for message catalog lookups.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DepartmentMissingOnCreate => "401",
            Self::DepartmentMissingOnUpdate => "402",
            Self::RecordAlreadyExists => "101",
            Self::RecordMissing => "102",
            Self::InsertCountMismatch => "201",
            Self::UpdateCountMismatch => "202",
            Self::SummaryCopyCountMismatch => "301",
            Self::SummaryRefreshCountMismatch => "302",
        }
    }
}

// Callers see the numeric code, never the variant name.
impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{} {}{}", .code.code(), .message, context_suffix(.context))]
pub struct BusinessError {
    pub code: ErrorCode,
    pub message: String,
    pub context: Option<String>,
}

fn context_suffix(context: &Option<String>) -> String {
    context.as_deref().map(|ctx| format!(" [{}]", ctx)).unwrap_or_default()
}

impl BusinessError {
    pub fn new(code: ErrorCode, message: impl Into<String>, context: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("BUSINESS_RULE: {0}")]
    Business(BusinessError),
    #[error("STORE_FAILURE: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("AUDIT_FAILURE: {0}")]
    Audit(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    pub fn business_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Business(error) => Some(error.code),
            _ => None,
        }
    }
}

impl From<BusinessError> for AppError {
    fn from(value: BusinessError) -> Self {
        Self::Business(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", value))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::{AppError, BusinessError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<u16> = ErrorCode::ALL.iter().map(|code| code.code()).collect();
        assert_eq!(codes.len(), ErrorCode::ALL.len());
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str(), code.code().to_string());
        }
    }

    #[test]
    fn business_error_display_includes_context() {
        let error = AppError::from(BusinessError::new(
            ErrorCode::RecordMissing,
            "record not found",
            Some("a_01,b_01".to_string()),
        ));
        assert_eq!(error.to_string(), "BUSINESS_RULE: 102 record not found [a_01,b_01]");
        assert_eq!(error.business_code(), Some(ErrorCode::RecordMissing));
    }

    #[test]
    fn business_error_serializes_numeric_code() {
        let error = BusinessError::new(
            ErrorCode::DepartmentMissingOnCreate,
            "The specified department does not exist.",
            Some("99".to_string()),
        );
        let value = serde_json::to_value(&error).expect("encode");
        assert_eq!(value["code"], 401);
        assert_eq!(value["context"], "99");
        assert_eq!(value["message"], "The specified department does not exist.");

        for code in ErrorCode::ALL {
            assert_eq!(serde_json::to_value(code).expect("encode"), code.code());
        }
    }

    #[test]
    fn store_errors_carry_no_business_code() {
        let error = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(error.business_code().is_none());
        assert!(error.to_string().starts_with("STORE_FAILURE"));
    }
}
