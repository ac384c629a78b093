use crate::{config::CsrfConfig, error::CsrfError, state::ActiveCsrfToken, token};
use async_trait::async_trait;
use cookie::Cookie;
use hello_htmx_core::{
    Error as CoreError, FORM_URLENCODED, HttpRequest, HttpResponse, Middleware, Next,
    parse_form_map,
};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Double-submit CSRF protection middleware
///
/// Safe methods get a signed token cookie issued when they arrive without one.
/// Every other method must echo the cookie's token back in the configured
/// header or form field.
#[derive(Clone)]
pub struct CsrfMiddleware {
    config: Arc<CsrfConfig>,
}

impl CsrfMiddleware {
    pub fn new(config: CsrfConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Whether the request must carry a submitted token
    pub fn needs_protection(&self, request: &HttpRequest) -> bool {
        !self.config.is_safe_method(request.method) && !self.bypasses(request)
    }

    /// Requests the middleware never inspects
    pub(crate) fn bypasses(&self, request: &HttpRequest) -> bool {
        request.is_websocket_upgrade() || self.config.is_excluded(&request.path)
    }

    /// Generate a new signed token
    pub fn generate_token(&self) -> String {
        token::generate_token(self.config.secret.as_bytes())
    }

    /// Cookie carrying `token`
    pub fn token_cookie(&self, token: &str) -> Cookie<'static> {
        self.config.build_cookie(token)
    }

    /// Validate an unsafe request, returning the token it submitted
    pub fn validate_request(&self, request: &HttpRequest) -> Result<String, CsrfError> {
        let supplied = self
            .token_from_header(request)
            .or_else(|| self.token_from_form(request))
            .ok_or(CsrfError::MissingToken)?;

        let cookie = request
            .cookie(&self.config.cookie_name)
            .ok_or(CsrfError::MissingToken)?;

        token::tokens_match(cookie, &supplied, self.config.secret.as_bytes())?;
        Ok(supplied)
    }

    fn token_from_header(&self, request: &HttpRequest) -> Option<String> {
        request
            .header(&self.config.header_name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn token_from_form(&self, request: &HttpRequest) -> Option<String> {
        if request.content_type() != Some(FORM_URLENCODED) {
            return None;
        }

        parse_form_map(&request.body)
            .ok()?
            .remove(&self.config.field_name)
            .filter(|value| !value.is_empty())
    }

    async fn handle_safe(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, CoreError> {
        let existing = req.cookie(&self.config.cookie_name).map(str::to_string);
        let issue_cookie = existing.is_none();
        let token = existing.unwrap_or_else(|| self.generate_token());

        req.extensions.insert(ActiveCsrfToken(token.clone()));

        let result = next(req).await;
        if !issue_cookie {
            return result;
        }

        // Error responses carry the new cookie too
        let mut response = result.unwrap_or_else(|err| {
            if err.is_server_error() {
                error!(error = %err, "Request handling failed");
            } else {
                debug!(status = err.status_code(), error = %err, "Request rejected");
            }
            HttpResponse::from_error(&err)
        });
        trace!(cookie = %self.config.cookie_name, "Issuing CSRF cookie");
        response.cookies.push(self.token_cookie(&token));

        Ok(response)
    }
}

#[async_trait]
impl Middleware for CsrfMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, CoreError> {
        if self.bypasses(&req) {
            return next(req).await;
        }

        if self.config.is_safe_method(req.method) {
            return self.handle_safe(req, next).await;
        }

        match self.validate_request(&req) {
            Ok(token) => {
                req.extensions.insert(ActiveCsrfToken(token));
                next(req).await
            }
            Err(err) => {
                warn!(
                    method = %req.method,
                    path = %req.path,
                    reason = %err,
                    "CSRF verification failed"
                );
                Err(err.into())
            }
        }
    }
}
