//! Type definitions and protocol constants for Web Push.

use std::time::Duration;

use thiserror::Error;

/// Size of the per-message salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the subscription auth secret in bytes.
pub const AUTH_SECRET_SIZE: usize = 16;

/// Size of an uncompressed P-256 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Size of the ECDH shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// Size of the input keying material in bytes.
pub const IKM_SIZE: usize = 32;

/// Size of the AES-128-GCM content encryption key in bytes.
pub const CEK_SIZE: usize = 16;

/// Size of the nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Record size declared in every record header.
pub const RECORD_SIZE: u32 = 4096;

/// Size of the record header: salt + record size + key id length + key id.
pub const HEADER_SIZE: usize = SALT_SIZE + 4 + 1 + PUBLIC_KEY_SIZE;

/// Smallest record size a header may declare.
pub const MIN_RECORD_SIZE: u32 = (HEADER_SIZE + 18) as u32;

/// Delimiter closing the last (and only) record.
pub const RECORD_DELIMITER: u8 = 0x02;

/// Default padding boundary for `encrypt_payload`.
pub const DEFAULT_PADDING_BLOCK: usize = 128;

/// Largest plaintext accepted by the encoder.
pub const MAX_PAYLOAD_SIZE: usize = RECORD_SIZE as usize;

/// Info prefix for the IKM expansion.
pub const WEBPUSH_INFO: &[u8] = b"WebPush: info\x00";

/// Info for the content encryption key expansion.
pub const CEK_INFO: &[u8] = b"Content-Encoding: aes128gcm\x00";

/// Info for the nonce expansion.
pub const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\x00";

/// Fixed JOSE header of every VAPID token.
pub const JWT_HEADER_JSON: &str = r#"{"alg":"ES256","typ":"JWT"}"#;

/// Token lifetime used by the direct signer.
pub const DIRECT_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Token lifetime used by the cached signer.
pub const CACHED_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60 + 30 * 60);

/// Remaining lifetime below which a cached token is re-minted.
pub const CACHE_REUSE_MARGIN: Duration = Duration::from_secs(10 * 60);

/// Default push message time-to-live (four weeks, in seconds).
pub const DEFAULT_TTL: u32 = 4 * 7 * 24 * 60 * 60;

/// Errors that can occur during Web Push operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebPushError {
    /// Malformed base64 or a key that does not decode to the expected shape.
    #[error("Decode failed: {0}")]
    DecodeError(String),

    /// Receiver public key has the wrong length.
    #[error("Invalid key length: expected 65 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Auth secret has the wrong length.
    #[error("Invalid auth secret: expected 16 bytes, got {0}")]
    InvalidAuthSecret(usize),

    /// Plaintext does not fit in a single record.
    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Public key is not a valid curve point.
    #[error("Key agreement failed: {0}")]
    KeyAgreementError(String),

    /// AEAD setup or seal failed.
    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    /// AEAD open failed or the plaintext is not properly delimited.
    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    /// Record header is malformed.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Token signature could not be produced.
    #[error("Signing failed: {0}")]
    SigningError(String),

    /// Push endpoint is not an absolute URL with a host.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, WebPushError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 86);
        assert_eq!(MIN_RECORD_SIZE, 104);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            WebPushError::InvalidKeyLength(64).to_string(),
            "Invalid key length: expected 65 bytes, got 64"
        );
        assert_eq!(
            WebPushError::PayloadTooLarge(5000).to_string(),
            "Payload too large: 5000 bytes"
        );
    }
}
