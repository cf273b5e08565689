use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Failures crossing the boundary to an external collaborator. Callers either
/// retry (when `is_retryable`), fall back to offline data, or surface a retry
/// option set; these never escape to the end user as-is.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_covers_transport_and_server_errors() {
        assert!(ProviderError::Api {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_retryable());
        assert!(ProviderError::Api {
            status: 429,
            message: "slow down".to_string()
        }
        .is_retryable());
        assert!(!ProviderError::Api {
            status: 401,
            message: "bad key".to_string()
        }
        .is_retryable());
        assert!(!ProviderError::Auth("expired".to_string()).is_retryable());
        assert!(!ProviderError::MissingConfig("OPENAI_API_KEY").is_retryable());
    }
}
