//! Token codec.
//!
//! A token is `token_secret || hex(HMAC-SHA256(secret, token_secret))`, where
//! `token_secret` is 32 random bytes rendered as 64 hex characters.

use crate::error::{CsrfError, Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes behind each token secret
pub const TOKEN_RANDOM_BYTES: usize = 32;

/// Length of the hex-encoded token secret prefix
pub const TOKEN_SECRET_LENGTH: usize = TOKEN_RANDOM_BYTES * 2;

/// Length of a token produced by [`generate_token`]
pub const TOKEN_LENGTH: usize = TOKEN_SECRET_LENGTH + 64;

/// Hex-encoded HMAC-SHA256 of `token_secret` keyed by `secret`
pub fn generate_hash(token_secret: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(token_secret.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Create a fresh signed token
pub fn generate_token(secret: &[u8]) -> String {
    let mut random = [0u8; TOKEN_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut random);

    let token_secret = hex::encode(random);
    let hash = generate_hash(&token_secret, secret);
    format!("{}{}", token_secret, hash)
}

/// Verify a token's signature and return its token-secret part
///
/// Tokens shorter than `TOKEN_SECRET_LENGTH + 1` bytes are rejected before
/// any hashing.
pub fn decode<'a>(token: &'a str, secret: &[u8]) -> Result<&'a str> {
    if token.len() < TOKEN_SECRET_LENGTH + 1 {
        return Err(CsrfError::MalformedToken);
    }

    let (token_secret, existing_hash) = match (
        token.get(..TOKEN_SECRET_LENGTH),
        token.get(TOKEN_SECRET_LENGTH..),
    ) {
        (Some(head), Some(tail)) => (head, tail),
        _ => return Err(CsrfError::MalformedToken),
    };

    let expected_hash = generate_hash(token_secret, secret);
    if existing_hash.as_bytes().ct_eq(expected_hash.as_bytes()).into() {
        Ok(token_secret)
    } else {
        Err(CsrfError::SecretMismatch)
    }
}

/// Whether `token` was signed with `secret`
pub fn is_valid(token: &str, secret: &[u8]) -> bool {
    decode(token, secret).is_ok()
}

/// Check a submitted token against the cookie token
///
/// Both must verify under `secret` and carry the same token secret.
pub fn tokens_match(cookie_token: &str, supplied_token: &str, secret: &[u8]) -> Result<()> {
    let cookie_secret = decode(cookie_token, secret)?;
    let supplied_secret = decode(supplied_token, secret)?;

    if cookie_secret
        .as_bytes()
        .ct_eq(supplied_secret.as_bytes())
        .into()
    {
        Ok(())
    } else {
        Err(CsrfError::TokenMismatch)
    }
}
