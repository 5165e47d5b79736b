//! Compact ES256 tokens for VAPID.
//!
//! Tokens always carry the same three claims in the same order, so the
//! claims object is formatted directly instead of going through a generic
//! JWT library. Signatures use the JOSE encoding: the fixed-width
//! concatenation `r ∥ s`, not ASN.1 DER.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use p256::ecdsa::signature::RandomizedSigner;
use p256::ecdsa::{Signature, SigningKey};
use rand::rngs::OsRng;

use crate::keys::encode_base64url;
use crate::types::{Result, WebPushError, JWT_HEADER_JSON};

static ENCODED_HEADER: LazyLock<String> = LazyLock::new(|| encode_base64url(JWT_HEADER_JSON));

/// The base64url JOSE header segment shared by every token.
pub fn encoded_header() -> &'static str {
    &ENCODED_HEADER
}

/// Seconds since the Unix epoch for a token expiry.
pub fn unix_seconds(time: SystemTime) -> Result<u64> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| WebPushError::SigningError(format!("expiry before Unix epoch: {}", e)))
}

/// Format the claims object with fixed field order `aud`, `exp`, `sub`.
fn claims_json(audience: &str, expires_at: u64, subject: &str) -> Result<String> {
    let escape = |value: &str| {
        serde_json::to_string(value)
            .map_err(|e| WebPushError::SigningError(format!("claim encoding failed: {}", e)))
    };

    Ok(format!(
        r#"{{"aud":{},"exp":{},"sub":{}}}"#,
        escape(audience)?,
        expires_at,
        escape(subject)?
    ))
}

/// Build and sign a VAPID token.
///
/// # Arguments
/// * `signing_key` - VAPID P-256 private key
/// * `audience` - Origin of the push service (`scheme://host`)
/// * `expires_at` - Token expiry
/// * `subject` - Contact URI, used as given
///
/// # Returns
/// `header.payload.signature`, each segment unpadded base64url
pub fn build_token(
    signing_key: &SigningKey,
    audience: &str,
    expires_at: SystemTime,
    subject: &str,
) -> Result<String> {
    let claims = claims_json(audience, unix_seconds(expires_at)?, subject)?;

    let mut token = String::with_capacity(256);
    token.push_str(encoded_header());
    token.push('.');
    token.push_str(&encode_base64url(claims));

    // ECDSA over SHA-256 of the signing input
    let signature: Signature = signing_key
        .try_sign_with_rng(&mut OsRng, token.as_bytes())
        .map_err(|e| WebPushError::SigningError(format!("ECDSA signing failed: {}", e)))?;

    token.push('.');
    token.push_str(&encode_base64url(signature.to_bytes()));
    Ok(token)
}
