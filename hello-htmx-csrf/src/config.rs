use crate::error::{CsrfError, Result};
use crate::secret::CsrfSecret;
use cookie::Cookie;
use hello_htmx_core::HttpMethod;

/// CSRF protection configuration
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// HMAC key for token signing
    pub secret: CsrfSecret,

    /// Cookie name for CSRF token
    pub cookie_name: String,

    /// Header name for CSRF token (matched case-insensitively)
    pub header_name: String,

    /// Form field name for CSRF token
    pub field_name: String,

    pub cookie_domain: Option<String>,

    pub cookie_path: String,

    /// Cookie secure flag (HTTPS only)
    pub cookie_secure: bool,

    pub cookie_http_only: bool,

    pub cookie_same_site: SameSite,

    /// Methods that never require a submitted token
    pub safe_methods: Vec<HttpMethod>,

    /// Path prefixes excluded from CSRF protection
    pub exclude_paths: Vec<String>,
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    fn to_cookie(self) -> cookie::SameSite {
        match self {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

impl CsrfConfig {
    /// Create a configuration signing with `secret`
    pub fn new(secret: impl Into<CsrfSecret>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CsrfError::InvalidConfig(
                "CSRF secret must not be empty".to_string(),
            ));
        }

        Ok(Self::with_secret(secret))
    }

    fn with_secret(secret: CsrfSecret) -> Self {
        Self {
            secret,
            cookie_name: "csrf_token".to_string(),
            header_name: "x-csrftoken".to_string(),
            field_name: "_csrf_token".to_string(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            safe_methods: vec![HttpMethod::GET, HttpMethod::HEAD, HttpMethod::OPTIONS],
            exclude_paths: Vec::new(),
        }
    }

    /// Generate a random secret
    pub fn generate_secret() -> CsrfSecret {
        CsrfSecret::generate()
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Replace the safe method set
    pub fn with_safe_methods(mut self, methods: Vec<HttpMethod>) -> Self {
        self.safe_methods = methods;
        self
    }

    /// Replace the excluded path prefixes
    pub fn with_exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = paths;
        self
    }

    pub fn is_safe_method(&self, method: HttpMethod) -> bool {
        self.safe_methods.contains(&method)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths
            .iter()
            .any(|excluded| path.starts_with(excluded.as_str()))
    }

    /// Build the cookie carrying `token`, with the configured attributes
    pub fn build_cookie(&self, token: impl Into<String>) -> Cookie<'static> {
        let mut builder = Cookie::build((self.cookie_name.clone(), token.into()))
            .path(self.cookie_path.clone())
            .secure(self.cookie_secure)
            .http_only(self.cookie_http_only)
            .same_site(self.cookie_same_site.to_cookie());

        if let Some(domain) = &self.cookie_domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

impl Default for CsrfConfig {
    /// Defaults with a freshly generated secret
    fn default() -> Self {
        Self::with_secret(Self::generate_secret())
    }
}
