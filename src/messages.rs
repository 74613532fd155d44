use crate::errors::{BusinessError, ErrorCode};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

static DEFAULT_MESSAGES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("401", "The specified department does not exist."),
        ("402", "The specified department does not exist."),
        ("101", "The user is already registered."),
        ("102", "The user does not exist."),
        ("201", "Failed to register the user."),
        ("202", "Failed to update the user. It may have been changed by another operator."),
        ("301", "Failed to register the user summary."),
        ("302", "Failed to update the user summary."),
    ])
});

/// Error text lookup keyed by code string. Configured overrides win over built-in texts.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    overrides: BTreeMap<String, String>,
}

impl MessageCatalog {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn lookup(&self, key: &str) -> String {
        if let Some(text) = self.overrides.get(key) {
            return text.clone();
        }
        DEFAULT_MESSAGES
            .get(key)
            .map(|text| (*text).to_string())
            .unwrap_or_else(|| format!("error {}", key))
    }

    pub fn business(&self, code: ErrorCode, context: impl Into<String>) -> BusinessError {
        BusinessError::new(code, self.lookup(code.as_str()), Some(context.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::MessageCatalog;
    use crate::errors::ErrorCode;
    use std::collections::BTreeMap;

    #[test]
    fn every_code_has_a_default_message() {
        let catalog = MessageCatalog::default();
        for code in ErrorCode::ALL {
            assert!(!catalog.lookup(code.as_str()).starts_with("error "));
        }
    }

    #[test]
    fn overrides_replace_defaults_and_unknown_keys_fall_back() {
        let catalog = MessageCatalog::new(BTreeMap::from([(
            "102".to_string(),
            "no such user".to_string(),
        )]));
        assert_eq!(catalog.lookup("102"), "no such user");
        assert_eq!(catalog.lookup("999"), "error 999");

        let error = catalog.business(ErrorCode::RecordMissing, "x_01");
        assert_eq!(error.message, "no such user");
        assert_eq!(error.context.as_deref(), Some("x_01"));
    }
}
