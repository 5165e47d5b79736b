//! Key handling for Web Push: base64url input, P-256 key pairs and ECDH.

use base64::{
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use p256::ecdsa::SigningKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::models::VapidKeys;
use crate::types::{Result, WebPushError, PUBLIC_KEY_SIZE, SHARED_SECRET_SIZE};

/// Decode base64url input in either padded or unpadded form.
///
/// Input is treated as padded only when its length is a multiple of four
/// and it ends with `=`.
pub fn decode_base64url(input: &str) -> Result<Vec<u8>> {
    let decoded = if input.len() % 4 == 0 && input.ends_with('=') {
        URL_SAFE.decode(input)
    } else {
        URL_SAFE_NO_PAD.decode(input)
    };
    decoded.map_err(|e| WebPushError::DecodeError(format!("invalid base64url: {}", e)))
}

/// Encode bytes as unpadded base64url.
pub fn encode_base64url(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Generate a random ephemeral P-256 key pair for one encryption call.
///
/// # Returns
/// Tuple of (private_key, public_key)
pub fn generate_ephemeral_keypair() -> (SecretKey, PublicKey) {
    let private_key = SecretKey::random(&mut OsRng);
    let public_key = private_key.public_key();
    (private_key, public_key)
}

/// Load a P-256 private key from its raw big-endian scalar.
pub fn secret_key_from_bytes(bytes: &[u8]) -> Result<SecretKey> {
    SecretKey::from_slice(bytes)
        .map_err(|e| WebPushError::KeyAgreementError(format!("invalid private key: {}", e)))
}

/// Parse an uncompressed P-256 public key (65 bytes, leading 0x04).
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    if bytes.len() != PUBLIC_KEY_SIZE || bytes[0] != 0x04 {
        return Err(WebPushError::KeyAgreementError(format!(
            "public key must be a {}-byte uncompressed point, got {} bytes",
            PUBLIC_KEY_SIZE,
            bytes.len()
        )));
    }

    PublicKey::from_sec1_bytes(bytes)
        .map_err(|e| WebPushError::KeyAgreementError(format!("point not on curve: {}", e)))
}

/// Uncompressed SEC1 encoding of a public key.
pub fn public_key_bytes(public_key: &PublicKey) -> [u8; PUBLIC_KEY_SIZE] {
    let point = public_key.to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_SIZE];
    out.copy_from_slice(point.as_bytes());
    out
}

/// Perform P-256 ECDH, returning the x-coordinate of the shared point.
pub fn p256_ecdh(
    private_key: &SecretKey,
    public_key: &PublicKey,
) -> Zeroizing<[u8; SHARED_SECRET_SIZE]> {
    let shared = p256::ecdh::diffie_hellman(private_key.to_nonzero_scalar(), public_key.as_affine());
    let mut out = Zeroizing::new([0u8; SHARED_SECRET_SIZE]);
    out.copy_from_slice(shared.raw_secret_bytes());
    out
}

/// Generate a fresh VAPID key pair, base64url encoded.
pub fn generate_vapid_keys() -> VapidKeys {
    let signing_key = SigningKey::random(&mut OsRng);
    let public_point = signing_key.verifying_key().to_encoded_point(false);

    VapidKeys {
        public_key: encode_base64url(public_point.as_bytes()),
        private_key: encode_base64url(signing_key.to_bytes()),
    }
}

/// Decode a base64url VAPID private key (raw 32-byte scalar).
pub fn decode_signing_key(private_key: &str) -> Result<SigningKey> {
    let bytes = Zeroizing::new(decode_base64url(private_key)?);
    SigningKey::from_slice(&bytes)
        .map_err(|e| WebPushError::DecodeError(format!("invalid VAPID private key: {}", e)))
}

/// Check that a base64url VAPID public key decodes to an uncompressed point.
pub fn validate_vapid_public_key(public_key: &str) -> Result<()> {
    let bytes = decode_base64url(public_key)?;
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(WebPushError::DecodeError(format!(
            "VAPID public key must be {} bytes, got {}",
            PUBLIC_KEY_SIZE,
            bytes.len()
        )));
    }
    Ok(())
}
