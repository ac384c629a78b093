use thiserror::Error;

/// Message returned to clients for every rejected state-changing request
pub const VERIFICATION_FAILED: &str = "CSRF token verification failed";

#[derive(Error, Debug)]
pub enum CsrfError {
    #[error("CSRF token is too short to carry a signature")]
    MalformedToken,

    #[error("CSRF token signature does not match the server secret")]
    SecretMismatch,

    #[error("Missing CSRF token")]
    MissingToken,

    #[error("CSRF token does not match the cookie token")]
    TokenMismatch,

    #[error("Failed to provision CSRF secret: {0}")]
    StartupProvisioning(#[from] std::io::Error),

    #[error("Invalid CSRF configuration: {0}")]
    InvalidConfig(String),
}

impl CsrfError {
    /// Whether this error comes from a client-supplied token rather than the server
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            CsrfError::MalformedToken
                | CsrfError::SecretMismatch
                | CsrfError::MissingToken
                | CsrfError::TokenMismatch
        )
    }
}

impl From<CsrfError> for hello_htmx_core::Error {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::MalformedToken
            | CsrfError::SecretMismatch
            | CsrfError::MissingToken
            | CsrfError::TokenMismatch => {
                hello_htmx_core::Error::Forbidden(VERIFICATION_FAILED.to_string())
            }
            CsrfError::StartupProvisioning(e) => hello_htmx_core::Error::Io(e),
            CsrfError::InvalidConfig(msg) => hello_htmx_core::Error::Internal(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, CsrfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_become_forbidden() {
        for err in [
            CsrfError::MalformedToken,
            CsrfError::SecretMismatch,
            CsrfError::MissingToken,
            CsrfError::TokenMismatch,
        ] {
            assert!(err.is_token_error());
            let core: hello_htmx_core::Error = err.into();
            assert_eq!(core.status_code(), 403);
            assert_eq!(core.detail(), VERIFICATION_FAILED);
        }
    }

    #[test]
    fn test_provisioning_error_is_server_side() {
        let err = CsrfError::from(std::io::Error::other("disk full"));
        assert!(!err.is_token_error());
        let core: hello_htmx_core::Error = err.into();
        assert_eq!(core.status_code(), 500);
    }
}
