//! # hello-htmx CSRF Protection
//!
//! Double-submit CSRF protection with HMAC-signed tokens.
//!
//! A token is 64 hex characters of randomness followed by the hex HMAC-SHA256
//! of that prefix under the server secret. The cookie carries the token;
//! state-changing requests must echo it in the `x-csrftoken` header or the
//! `_csrf_token` form field.
//!
//! ## Quick Start
//!
//! ```rust
//! use hello_htmx_csrf::{CsrfConfig, RotatingCsrfMiddleware, token};
//!
//! let config = CsrfConfig::new("a-long-random-secret").unwrap();
//! let csrf = RotatingCsrfMiddleware::new(config);
//!
//! let issued = csrf.inner().generate_token();
//! assert!(token::is_valid(&issued, b"a-long-random-secret"));
//! assert!(!token::is_valid("invalid_token", b"a-long-random-secret"));
//! ```
//!
//! ## Secret provisioning
//!
//! ```no_run
//! use hello_htmx_csrf::{CsrfConfig, SecretProvisioner};
//!
//! // HELLO_HTMX_CSRF_SECRET, then CSRF_SECRET, then ./.state/csrf_secret
//! let secret = SecretProvisioner::new(".").resolve().unwrap();
//! let config = CsrfConfig::new(secret).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod rotation;
pub mod secret;
pub mod state;
pub mod token;

pub use config::{CsrfConfig, SameSite};
pub use error::{CsrfError, Result, VERIFICATION_FAILED};
pub use middleware::CsrfMiddleware;
pub use rotation::RotatingCsrfMiddleware;
pub use secret::{CsrfSecret, SecretProvisioner, SecretSource, resolve_secret};
pub use state::{ActiveCsrfToken, csrf_token};
