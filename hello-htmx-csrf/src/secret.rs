//! Signing-secret provisioning.
//!
//! The secret is resolved once at startup: an environment override wins, then a
//! secret persisted under the state directory, then a freshly generated one that
//! is written back so restarts keep accepting previously issued cookies.

use crate::error::Result;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Primary environment variable holding the secret
pub const PRIMARY_SECRET_ENV: &str = "HELLO_HTMX_CSRF_SECRET";

/// Fallback environment variable holding the secret
pub const FALLBACK_SECRET_ENV: &str = "CSRF_SECRET";

/// State file location relative to the application root
pub const STATE_FILE: &str = ".state/csrf_secret";

const GENERATED_SECRET_BYTES: usize = 32;

/// HMAC key shared by every request for the life of the process
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CsrfSecret(String);

impl CsrfSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a random URL-safe secret
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret = Self(URL_SAFE_NO_PAD.encode(bytes));
        bytes.zeroize();
        secret
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CsrfSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfSecret(<redacted>)")
    }
}

impl From<String> for CsrfSecret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CsrfSecret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Where a resolved secret came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Named environment variable
    Environment(String),
    /// Existing state file
    StateFile(PathBuf),
    /// Newly generated and written to the state file
    Generated(PathBuf),
}

/// Resolves the CSRF signing secret at startup
#[derive(Debug, Clone)]
pub struct SecretProvisioner {
    env_vars: Vec<String>,
    state_file: PathBuf,
}

impl SecretProvisioner {
    /// Provisioner rooted at `root`, using the default env names and state file
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            env_vars: vec![
                PRIMARY_SECRET_ENV.to_string(),
                FALLBACK_SECRET_ENV.to_string(),
            ],
            state_file: root.as_ref().join(STATE_FILE),
        }
    }

    /// Replace the environment variables consulted, in priority order
    pub fn with_env_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<CsrfSecret> {
        let (secret, _) = self.resolve_with(|name| std::env::var(name).ok())?;
        Ok(secret)
    }

    /// Resolve using `lookup` in place of the process environment
    ///
    /// Any filesystem failure is returned as `StartupProvisioning`.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<(CsrfSecret, SecretSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in &self.env_vars {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                info!(source = %name, "CSRF secret loaded from environment");
                return Ok((
                    CsrfSecret::from(value),
                    SecretSource::Environment(name.clone()),
                ));
            }
        }

        if let Some(secret) = self.read_state_file()? {
            info!(path = %self.state_file.display(), "CSRF secret loaded from state file");
            return Ok((secret, SecretSource::StateFile(self.state_file.clone())));
        }

        let secret = CsrfSecret::generate();
        self.write_state_file(&secret)?;
        info!(path = %self.state_file.display(), "Generated new CSRF secret");

        Ok((secret, SecretSource::Generated(self.state_file.clone())))
    }

    fn read_state_file(&self) -> Result<Option<CsrfSecret>> {
        match fs::read_to_string(&self.state_file) {
            Ok(mut contents) => {
                let trimmed = contents.trim();
                let secret = if trimmed.is_empty() {
                    debug!(path = %self.state_file.display(), "CSRF state file is blank");
                    None
                } else {
                    Some(CsrfSecret::new(trimmed))
                };
                contents.zeroize();
                Ok(secret)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_state_file(&self, secret: &CsrfSecret) -> Result<()> {
        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.state_file)?;
        file.write_all(secret.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

/// Resolve the secret for an application rooted at `root`
pub fn resolve_secret(root: impl AsRef<Path>) -> Result<CsrfSecret> {
    SecretProvisioner::new(root).resolve()
}
