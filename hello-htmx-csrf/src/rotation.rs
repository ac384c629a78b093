//! Cookie rotation in front of [`CsrfMiddleware`].
//!
//! A cookie signed with a previous secret (or forged outright) would otherwise
//! be reused on every safe request and make each later form submission fail.
//! On safe methods such a cookie is dropped from the request, so the wrapped
//! middleware treats the visit as first contact and issues a fresh token.

use crate::{config::CsrfConfig, middleware::CsrfMiddleware, token};
use async_trait::async_trait;
use hello_htmx_core::{Error, HttpRequest, HttpResponse, Middleware, Next};
use tracing::debug;

/// CSRF middleware that replaces invalid cookies instead of trusting them
#[derive(Clone)]
pub struct RotatingCsrfMiddleware {
    inner: CsrfMiddleware,
}

impl RotatingCsrfMiddleware {
    pub fn new(config: CsrfConfig) -> Self {
        Self::wrap(CsrfMiddleware::new(config))
    }

    /// Decorate an existing CSRF middleware
    pub fn wrap(inner: CsrfMiddleware) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &CsrfMiddleware {
        &self.inner
    }

    /// Drop the token cookie when it should be reissued.
    ///
    /// Returns whether the cookie was removed. Never rejects: unsafe methods are
    /// left for the wrapped middleware to verify.
    pub fn rotate_if_invalid(&self, req: &mut HttpRequest) -> bool {
        let config = self.inner.config();

        if !config.is_safe_method(req.method) {
            return false;
        }

        let stale = req
            .cookie(&config.cookie_name)
            .is_some_and(|cookie| !token::is_valid(cookie, config.secret.as_bytes()));

        if stale {
            debug!(
                cookie = %config.cookie_name,
                path = %req.path,
                "Discarding invalid CSRF cookie"
            );
            req.remove_cookie(&config.cookie_name);
        }

        stale
    }
}

#[async_trait]
impl Middleware for RotatingCsrfMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        if !self.inner.bypasses(&req) {
            self.rotate_if_invalid(&mut req);
        }

        self.inner.handle(req, next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ActiveCsrfToken;
    use hello_htmx_core::{HandlerFuture, HttpMethod};

    const SECRET: &str = "rotation-secret";

    fn rotating() -> RotatingCsrfMiddleware {
        RotatingCsrfMiddleware::new(CsrfConfig::new(SECRET).unwrap())
    }

    fn echo_cookie() -> Next {
        Box::new(|req: HttpRequest| {
            Box::pin(async move {
                let seen = req.cookie("csrf_token").unwrap_or("<none>").to_string();
                let active = req
                    .extensions
                    .get::<ActiveCsrfToken>()
                    .map(|t| t.0.clone())
                    .unwrap_or_default();
                Ok(HttpResponse::ok()
                    .with_header("x-seen-cookie", seen)
                    .with_body(active.into_bytes()))
            }) as HandlerFuture
        })
    }

    #[test]
    fn test_invalid_cookie_removed_on_safe_method() {
        let mw = rotating();
        let mut req = HttpRequest::new(HttpMethod::GET, "/").with_cookie("csrf_token", "invalid_token");

        assert!(mw.rotate_if_invalid(&mut req));
        assert!(req.cookie("csrf_token").is_none());
    }

    #[test]
    fn test_valid_cookie_kept() {
        let mw = rotating();
        let token = mw.inner().generate_token();
        let mut req = HttpRequest::new(HttpMethod::HEAD, "/").with_cookie("csrf_token", token.clone());

        assert!(!mw.rotate_if_invalid(&mut req));
        assert_eq!(req.cookie("csrf_token"), Some(token.as_str()));
    }

    #[test]
    fn test_unsafe_method_never_rotates() {
        let mw = rotating();
        let mut req = HttpRequest::new(HttpMethod::POST, "/").with_cookie("csrf_token", "invalid_token");

        assert!(!mw.rotate_if_invalid(&mut req));
        assert_eq!(req.cookie("csrf_token"), Some("invalid_token"));
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_reissued() {
        let mw = rotating();
        let req = HttpRequest::new(HttpMethod::GET, "/protected").with_cookie("csrf_token", "invalid_token");

        let response = mw.handle(req, echo_cookie()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("x-seen-cookie"), Some(&"<none>".to_string()));
        let cookie = response.cookie("csrf_token").expect("fresh cookie");
        assert_ne!(cookie.value(), "invalid_token");
        assert!(token::is_valid(cookie.value(), SECRET.as_bytes()));
        assert_eq!(response.text(), cookie.value());
    }

    #[tokio::test]
    async fn test_cookie_from_previous_secret_is_reissued() {
        let mw = rotating();
        let old = token::generate_token(b"previous-secret");
        let req = HttpRequest::new(HttpMethod::GET, "/").with_cookie("csrf_token", old.clone());

        let response = mw.handle(req, echo_cookie()).await.unwrap();
        let cookie = response.cookie("csrf_token").expect("fresh cookie");
        assert_ne!(cookie.value(), old);
        assert!(token::is_valid(cookie.value(), SECRET.as_bytes()));
    }

    #[tokio::test]
    async fn test_repeated_invalid_cookie_rotates_every_time() {
        let mw = rotating();
        let mut issued = Vec::new();

        for _ in 0..3 {
            let req = HttpRequest::new(HttpMethod::GET, "/").with_cookie("csrf_token", "invalid_token");
            let response = mw.handle(req, echo_cookie()).await.unwrap();
            assert_eq!(response.status, 200);
            let value = response.cookie("csrf_token").expect("fresh cookie").value().to_string();
            assert!(token::is_valid(&value, SECRET.as_bytes()));
            issued.push(value);
        }

        assert_ne!(issued[0], issued[1]);
        assert_ne!(issued[1], issued[2]);
    }

    #[tokio::test]
    async fn test_unsafe_method_with_invalid_cookie_is_rejected_by_inner() {
        let mw = rotating();
        let req = HttpRequest::new(HttpMethod::POST, "/todos")
            .with_cookie("csrf_token", "invalid_token")
            .with_header("x-csrftoken", "invalid_token");

        let err = mw.handle(req, echo_cookie()).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_websocket_upgrade_passes_through() {
        let mw = rotating();
        let req = HttpRequest::new(HttpMethod::GET, "/ws")
            .with_cookie("csrf_token", "invalid_token")
            .with_header("Upgrade", "websocket")
            .with_header("Connection", "Upgrade");

        let response = mw.handle(req, echo_cookie()).await.unwrap();
        assert_eq!(
            response.headers.get("x-seen-cookie"),
            Some(&"invalid_token".to_string())
        );
        assert!(response.cookies.is_empty());
    }
}
