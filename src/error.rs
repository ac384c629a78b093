// Startup errors for the hello-htmx binary

use crate::config::ConfigError;
use hello_htmx_csrf::CsrfError;
use hello_htmx_templates::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSRF setup failed: {0}")]
    Csrf(#[from] CsrfError),

    #[error("Template setup failed: {0}")]
    Template(#[from] TemplateError),

    #[error("Server error: {0}")]
    Server(#[from] hello_htmx_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
