//! VAPID authorization headers (RFC 8292).
//!
//! Two interchangeable signers sit behind [`VapidSigner`]: [`DirectSigner`]
//! mints a fresh token for every call, [`CachedSigner`] reuses a header for
//! the same key pair, audience and subject until its token nears expiry.

use std::borrow::Cow;
use std::time::{Duration, SystemTime};

use url::Url;

use crate::cache::{CacheKey, TokenCache};
use crate::jwt::build_token;
use crate::keys::{decode_signing_key, validate_vapid_public_key};
use crate::types::{
    Result, WebPushError, CACHED_TOKEN_TTL, CACHE_REUSE_MARGIN, DIRECT_TOKEN_TTL,
};

/// Anything that can produce a VAPID `Authorization` header value.
pub trait VapidSigner: Send + Sync {
    /// Build the header value for a push to `endpoint`.
    ///
    /// # Arguments
    /// * `endpoint` - Subscription endpoint URL
    /// * `private_key` - VAPID private key (base64url raw scalar)
    /// * `public_key` - VAPID public key (base64url uncompressed point)
    /// * `subject` - Contact address; `mailto:` is prepended when absent
    fn vapid_header(
        &self,
        endpoint: &Url,
        private_key: &str,
        public_key: &str,
        subject: &str,
    ) -> Result<String>;
}

/// Token audience for an endpoint: its origin, `scheme://host[:port]`.
///
/// The host is taken as parsed, so it is lowercased and IDNA-encoded and a
/// default port is dropped.
pub fn audience(endpoint: &Url) -> Result<String> {
    if endpoint.host_str().is_none() {
        return Err(WebPushError::InvalidEndpoint(format!(
            "endpoint has no host: {}",
            endpoint
        )));
    }
    Ok(endpoint.origin().ascii_serialization())
}

/// Subject claim for a contact address.
///
/// Anything not already starting with `mailto:` gains the prefix; an
/// existing scheme is never stripped.
pub fn normalize_subject(subject: &str) -> Cow<'_, str> {
    if subject.starts_with("mailto:") {
        Cow::Borrowed(subject)
    } else {
        Cow::Owned(format!("mailto:{}", subject))
    }
}

/// Format the `Authorization` header value.
pub fn authorization_header(token: &str, public_key: &str) -> String {
    format!("vapid t={}, k={}", token, public_key)
}

/// `now + ttl`, failing instead of overflowing.
fn expiry_after(now: SystemTime, ttl: Duration) -> Result<SystemTime> {
    now.checked_add(ttl).ok_or_else(|| {
        WebPushError::SigningError(format!("token lifetime {:?} overflows the clock", ttl))
    })
}

fn sign(
    private_key: &str,
    public_key: &str,
    subject: &str,
    audience: &str,
    expires_at: SystemTime,
) -> Result<String> {
    let signing_key = decode_signing_key(private_key)?;
    validate_vapid_public_key(public_key)?;

    let token = build_token(&signing_key, audience, expires_at, &normalize_subject(subject))?;
    Ok(authorization_header(&token, public_key))
}

/// Signer that mints a new token on every call.
#[derive(Debug, Clone, Copy)]
pub struct DirectSigner {
    token_ttl: Duration,
}

impl DirectSigner {
    /// Creates a signer issuing 12-hour tokens.
    pub fn new() -> Self {
        Self::with_ttl(DIRECT_TOKEN_TTL)
    }

    /// Creates a signer with a custom token lifetime.
    pub fn with_ttl(token_ttl: Duration) -> Self {
        Self { token_ttl }
    }
}

impl Default for DirectSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl VapidSigner for DirectSigner {
    fn vapid_header(
        &self,
        endpoint: &Url,
        private_key: &str,
        public_key: &str,
        subject: &str,
    ) -> Result<String> {
        let audience = audience(endpoint)?;
        let expires_at = expiry_after(SystemTime::now(), self.token_ttl)?;
        sign(private_key, public_key, subject, &audience, expires_at)
    }
}

/// Configuration for the cached signer.
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Lifetime of newly minted tokens.
    pub token_ttl: Duration,
    /// A cached header is reused only while its token outlives now + margin.
    pub reuse_margin: Duration,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            token_ttl: CACHED_TOKEN_TTL,
            reuse_margin: CACHE_REUSE_MARGIN,
        }
    }
}

/// Signer that memoizes headers per (key pair, audience, subject).
///
/// Concurrent misses for the same tuple may each mint a token; the last
/// one stored wins and every returned header is valid.
#[derive(Debug)]
pub struct CachedSigner {
    cache: TokenCache,
    config: SignerConfig,
}

impl CachedSigner {
    /// Creates a cached signer with the given configuration.
    pub fn new(config: SignerConfig) -> Self {
        Self {
            cache: TokenCache::new(),
            config,
        }
    }

    /// Creates a cached signer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SignerConfig::default())
    }

    /// Number of cached headers.
    pub fn cached_headers(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CachedSigner {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VapidSigner for CachedSigner {
    fn vapid_header(
        &self,
        endpoint: &Url,
        private_key: &str,
        public_key: &str,
        subject: &str,
    ) -> Result<String> {
        let audience = audience(endpoint)?;
        let key = CacheKey::new(private_key, public_key, &audience, subject);
        let now = SystemTime::now();

        let valid_until = expiry_after(now, self.config.reuse_margin)?;
        if let Some(header) = self.cache.retrieve(&key, valid_until) {
            tracing::trace!(%audience, "reusing cached VAPID header");
            return Ok(header);
        }

        let expires_at = expiry_after(now, self.config.token_ttl)?;
        let header = sign(private_key, public_key, subject, &audience, expires_at)?;
        self.cache.store(key, header.clone(), expires_at);

        tracing::debug!(%audience, cached = self.cache.len(), "minted VAPID header");
        Ok(header)
    }
}
