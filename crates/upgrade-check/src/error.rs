//! Error types for upgrade verification

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("Target unreachable: {url} ({attempts} attempt)")]
    Unreachable { url: String, attempts: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl VerifyError {
    pub fn not_found(selector: impl Into<String>) -> Self {
        VerifyError::ElementNotFound {
            selector: selector.into(),
        }
    }

    /// True when an expected affordance was absent within its wait budget.
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            VerifyError::ElementNotFound { .. } | VerifyError::Timeout(_)
        )
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absence_classification() {
        assert!(VerifyError::not_found("#add_to_cart").is_absence());
        assert!(VerifyError::Timeout("#anchorBankwire".into()).is_absence());
        assert!(!VerifyError::AssertionFailed("x".into()).is_absence());
        assert!(!VerifyError::Authentication("x".into()).is_absence());
    }
}
