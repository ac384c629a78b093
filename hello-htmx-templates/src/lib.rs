//! Handlebars templating for hello-htmx.
//!
//! [`TemplateService`] renders off the async executor and wraps the result in
//! an HTML [`HttpResponse`].
//!
//! ```no_run
//! use hello_htmx_templates::{TemplateConfig, TemplateService};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TemplateService::new(TemplateConfig::new("templates"))?;
//! let response = service
//!     .render_response("index", &json!({"title": "Hello"}), 200)
//!     .await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::TemplateConfig;
pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};

use hello_htmx_core::HttpResponse;
use serde::Serialize;

/// Async rendering front for [`TemplateEngine`]
#[derive(Clone)]
pub struct TemplateService {
    engine: TemplateEngine,
}

impl TemplateService {
    pub fn new(config: TemplateConfig) -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new(config)?,
        })
    }

    /// Render a template on the blocking pool
    pub async fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        let engine = self.engine.clone();
        let template = template.to_string();
        let data = serde_json::to_value(data)?;

        tokio::task::spawn_blocking(move || engine.render(&template, &data))
            .await
            .map_err(|e| TemplateError::RenderError(e.to_string()))?
    }

    /// Render a template into an HTML response with the given status
    pub async fn render_response<T: Serialize>(
        &self,
        template: &str,
        data: &T,
        status: u16,
    ) -> Result<HttpResponse> {
        let html = self.render(template, data).await?;
        Ok(HttpResponse::new(status).with_html(html))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    pub fn config(&self) -> &TemplateConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }
}
