//! # hello-htmx
//!
//! A server-rendered to-do list driven by HTMX fragments, layered as
//! models, repository, service and routes. Every unsafe request is checked
//! against a signed double-submit CSRF cookie, and safe requests carrying a
//! stale or forged cookie get a fresh one.
//!
//! ```no_run
//! use hello_htmx::{AppConfig, create_app};
//!
//! # async fn run() -> Result<(), hello_htmx::AppError> {
//! let config = AppConfig::load()?;
//! let app = create_app(&config)?;
//! app.listen(config.socket_addr()?).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use app::{build_application, create_app, create_app_with_secret, csrf_config};
pub use config::{AppConfig, ConfigError};
pub use error::{AppError, Result};
pub use models::{Todo, TodoCreate, TodoUpdate, ValidationError};
pub use repositories::{InMemoryTodoRepository, TodoRepository};
pub use routes::AppState;
pub use services::TodoService;
