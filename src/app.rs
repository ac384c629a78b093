//! Application wiring.
//!
//! Middleware runs in this order: request id, access logging, then the
//! rotating CSRF layer, which wraps the double-submit check, then the router.

use crate::config::AppConfig;
use crate::error::Result;
use crate::routes::{AppState, register_routes};
use crate::services::TodoService;
use hello_htmx_core::{Application, LoggingMiddleware, RequestIdMiddleware, Router};
use hello_htmx_csrf::{CsrfConfig, CsrfSecret, RotatingCsrfMiddleware, SecretProvisioner};
use hello_htmx_templates::TemplateService;
use tracing::info;

/// CSRF settings for the given secret
pub fn csrf_config(config: &AppConfig, secret: CsrfSecret) -> Result<CsrfConfig> {
    Ok(CsrfConfig::new(secret)?.with_cookie_secure(config.cookie_secure))
}

/// Assemble the middleware stack around the routes
pub fn build_application(state: AppState, csrf: CsrfConfig) -> Application {
    let mut router = Router::new();
    register_routes(&mut router, state);

    Application::new(router)
        .with_middleware(RequestIdMiddleware)
        .with_middleware(LoggingMiddleware)
        .with_middleware(RotatingCsrfMiddleware::new(csrf))
}

/// Build the application around an already resolved secret
pub fn create_app_with_secret(config: &AppConfig, secret: CsrfSecret) -> Result<Application> {
    let csrf = csrf_config(config, secret)?;
    let templates = TemplateService::new(config.template_config())?;
    let state = AppState::new(TodoService::in_memory(), templates, &csrf.cookie_name);

    Ok(build_application(state, csrf))
}

/// Build the application, provisioning the CSRF secret under `state_dir`
pub fn create_app(config: &AppConfig) -> Result<Application> {
    let provisioner = SecretProvisioner::new(&config.state_dir);
    let secret = provisioner.resolve()?;
    info!(
        templates = %config.template_dir.display(),
        "Application configured"
    );

    create_app_with_secret(config, secret)
}
