use hello_htmx_core::HttpRequest;

/// Token issued or accepted for the current request
///
/// Set by [`CsrfMiddleware`](crate::CsrfMiddleware) in the request extensions
/// so pages rendered on a first visit can embed the token that the response
/// cookie is about to carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCsrfToken(pub String);

impl ActiveCsrfToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token to embed in rendered pages
///
/// The request-scoped token if set, else the cookie, else an empty string.
pub fn csrf_token(request: &HttpRequest, cookie_name: &str) -> String {
    if let Some(active) = request.extensions.get::<ActiveCsrfToken>() {
        return active.0.clone();
    }

    request
        .cookie(cookie_name)
        .map(str::to_string)
        .unwrap_or_default()
}
