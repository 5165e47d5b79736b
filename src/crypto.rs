//! Payload encryption and decryption for Web Push messages.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes128Gcm, Nonce,
};
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::hkdf::{expand, extract};
use crate::keys::{
    decode_base64url, generate_ephemeral_keypair, p256_ecdh, parse_public_key, public_key_bytes,
};
use crate::record::{pad_plaintext, strip_padding, RecordHeader};
use crate::types::{
    Result, WebPushError, AUTH_SECRET_SIZE, CEK_INFO, CEK_SIZE, DEFAULT_PADDING_BLOCK, HEADER_SIZE,
    IKM_SIZE, MAX_PAYLOAD_SIZE, NONCE_INFO, NONCE_SIZE, PUBLIC_KEY_SIZE, SALT_SIZE, TAG_SIZE,
    WEBPUSH_INFO,
};

/// Content encryption key and nonce for one record.
pub struct ContentKeys {
    /// AES-128-GCM key.
    pub cek: Zeroizing<[u8; CEK_SIZE]>,
    /// AES-GCM nonce.
    pub nonce: [u8; NONCE_SIZE],
}

/// Anything that can turn a subscription's keys and a payload into a record.
pub trait WebPushEncoder: Send + Sync {
    /// Encrypt `plaintext` for the subscription identified by its base64url
    /// `p256dh` public key and `auth` secret.
    fn encrypt_payload(&self, p256dh: &str, auth: &str, plaintext: &[u8]) -> Result<Vec<u8>>;
}

/// Generate a fresh random salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Run the key schedule from an already computed shared secret.
fn key_schedule(
    shared_secret: &[u8],
    salt: &[u8; SALT_SIZE],
    auth_secret: &[u8],
    receiver_public: &[u8; PUBLIC_KEY_SIZE],
    sender_public: &[u8; PUBLIC_KEY_SIZE],
) -> ContentKeys {
    // Build info: prefix + receiver pubkey + sender pubkey
    let mut info = Vec::with_capacity(WEBPUSH_INFO.len() + 2 * PUBLIC_KEY_SIZE);
    info.extend_from_slice(WEBPUSH_INFO);
    info.extend_from_slice(receiver_public);
    info.extend_from_slice(sender_public);

    let prk = Zeroizing::new(extract(auth_secret, shared_secret));
    let ikm = Zeroizing::new(expand::<IKM_SIZE>(prk.as_slice(), &info));

    let prk = Zeroizing::new(extract(salt, ikm.as_slice()));
    let cek = Zeroizing::new(expand::<CEK_SIZE>(prk.as_slice(), CEK_INFO));
    let nonce = expand::<NONCE_SIZE>(prk.as_slice(), NONCE_INFO);

    ContentKeys { cek, nonce }
}

/// Derive the content encryption key and nonce on the sender side.
///
/// # Arguments
/// * `salt` - Per-message salt
/// * `auth_secret` - Subscription auth secret
/// * `receiver_public_key` - Subscription's uncompressed P-256 key
/// * `sender_private_key` - Sender's ephemeral private key
pub fn derive_key_and_nonce(
    salt: &[u8; SALT_SIZE],
    auth_secret: &[u8],
    receiver_public_key: &[u8],
    sender_private_key: &SecretKey,
) -> Result<ContentKeys> {
    let receiver_public = parse_public_key(receiver_public_key)?;
    let shared_secret = p256_ecdh(sender_private_key, &receiver_public);

    Ok(key_schedule(
        shared_secret.as_slice(),
        salt,
        auth_secret,
        &public_key_bytes(&receiver_public),
        &public_key_bytes(&sender_private_key.public_key()),
    ))
}

/// AES-128-GCM single-record encoder.
#[derive(Debug, Clone, Copy)]
pub struct Aes128GcmEncoder {
    padding: usize,
}

impl Aes128GcmEncoder {
    /// Creates an encoder padding to the default 128-byte boundary.
    pub fn new() -> Self {
        Self::with_padding(DEFAULT_PADDING_BLOCK)
    }

    /// Creates an encoder with a custom padding boundary (0 disables padding).
    pub fn with_padding(padding: usize) -> Self {
        Self { padding }
    }

    /// Padding boundary used by `encrypt_payload`.
    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Encrypt `plaintext` into a single record.
    ///
    /// # Arguments
    /// * `salt` - Per-message salt, never reused
    /// * `sender_private_key` - Ephemeral sender key, never reused
    /// * `receiver_public_key` - Subscription's uncompressed P-256 key (65 bytes)
    /// * `auth_secret` - Subscription auth secret
    /// * `pad_to` - Padding boundary, 0 for none
    /// * `plaintext` - Message to encrypt
    ///
    /// # Returns
    /// Header followed by the sealed body
    pub fn encrypt(
        &self,
        salt: &[u8; SALT_SIZE],
        sender_private_key: &SecretKey,
        receiver_public_key: &[u8],
        auth_secret: &[u8; AUTH_SECRET_SIZE],
        pad_to: usize,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        if plaintext.len() > MAX_PAYLOAD_SIZE {
            return Err(WebPushError::PayloadTooLarge(plaintext.len()));
        }

        let keys = derive_key_and_nonce(salt, auth_secret, receiver_public_key, sender_private_key)?;

        let cipher = Aes128Gcm::new_from_slice(keys.cek.as_slice())
            .map_err(|e| WebPushError::EncryptionError(format!("Cipher init failed: {}", e)))?;

        let mut body = pad_plaintext(plaintext, pad_to);
        cipher
            .encrypt_in_place(Nonce::from_slice(&keys.nonce), &[], &mut body)
            .map_err(|e| WebPushError::EncryptionError(format!("Seal failed: {}", e)))?;

        let header = RecordHeader::new(*salt, public_key_bytes(&sender_private_key.public_key()));

        let mut record = Vec::with_capacity(HEADER_SIZE + body.len());
        header.encode_into(&mut record);
        record.extend_from_slice(&body);

        tracing::debug!(
            plaintext_len = plaintext.len(),
            record_len = record.len(),
            pad_to,
            "encrypted push record"
        );

        Ok(record)
    }
}

impl Default for Aes128GcmEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebPushEncoder for Aes128GcmEncoder {
    fn encrypt_payload(&self, p256dh: &str, auth: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.len() > MAX_PAYLOAD_SIZE {
            return Err(WebPushError::PayloadTooLarge(plaintext.len()));
        }

        let receiver_public_key = decode_base64url(p256dh)?;
        if receiver_public_key.len() != PUBLIC_KEY_SIZE {
            return Err(WebPushError::InvalidKeyLength(receiver_public_key.len()));
        }

        let auth_secret: [u8; AUTH_SECRET_SIZE] = decode_base64url(auth)?
            .try_into()
            .map_err(|bytes: Vec<u8>| WebPushError::InvalidAuthSecret(bytes.len()))?;

        let salt = generate_salt();
        let (sender_private_key, _) = generate_ephemeral_keypair();

        self.encrypt(
            &salt,
            &sender_private_key,
            &receiver_public_key,
            &auth_secret,
            self.padding,
            plaintext,
        )
    }
}

/// Decrypt a record addressed to `receiver_private_key`.
///
/// # Arguments
/// * `record` - Header followed by the sealed body
/// * `receiver_private_key` - Subscription's private key
/// * `auth_secret` - Subscription auth secret
///
/// # Returns
/// The plaintext without delimiter and padding
pub fn decrypt_record(
    record: &[u8],
    receiver_private_key: &SecretKey,
    auth_secret: &[u8; AUTH_SECRET_SIZE],
) -> Result<Vec<u8>> {
    let (header, sealed) = RecordHeader::decode(record)?;

    let sender_public = parse_public_key(&header.key_id)
        .map_err(|e| WebPushError::InvalidRecord(format!("Bad key id: {}", e)))?;
    let receiver_public: PublicKey = receiver_private_key.public_key();

    let shared_secret = p256_ecdh(receiver_private_key, &sender_public);
    let keys = key_schedule(
        shared_secret.as_slice(),
        &header.salt,
        auth_secret,
        &public_key_bytes(&receiver_public),
        &header.key_id,
    );

    let cipher = Aes128Gcm::new_from_slice(keys.cek.as_slice())
        .map_err(|e| WebPushError::DecryptionError(format!("Cipher init failed: {}", e)))?;

    let mut body = Zeroizing::new(sealed.to_vec());
    cipher
        .decrypt_in_place(Nonce::from_slice(&keys.nonce), &[], &mut *body)
        .map_err(|e| WebPushError::DecryptionError(format!("Open failed: {}", e)))?;

    debug_assert!(sealed.len() - body.len() == TAG_SIZE);
    Ok(strip_padding(&body)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{encode_base64url, secret_key_from_bytes};

    // RFC 8291 appendix A
    const SALT: &str = "DGv6ra1nlYgDCS1FRnbzlw";
    const SENDER_PRIVATE: &str = "yfWPiYE-n46HLnH0KqZOF1fJJU3MYrct3AELtAQ-oRw";
    const RECEIVER_PUBLIC: &str =
        "BCVxsr7N_eNgVRqvHtD0zTZsEc6-VV-JvLexhqUzORcxaOzi6-AYWXvTBHm4bjyPjs7Vd8pZGH6SRpkNtoIAiw4";
    const RECEIVER_PRIVATE: &str = "q1dXpw3UpT5VOmu_cf_v6ih07Aems3njxI-JWgLcM94";
    const AUTH: &str = "BTBZMqHH6r4Tts7J_aSIgg";

    fn salt() -> [u8; SALT_SIZE] {
        decode_base64url(SALT).unwrap().try_into().unwrap()
    }

    fn auth() -> [u8; AUTH_SECRET_SIZE] {
        decode_base64url(AUTH).unwrap().try_into().unwrap()
    }

    fn sender() -> SecretKey {
        secret_key_from_bytes(&decode_base64url(SENDER_PRIVATE).unwrap()).unwrap()
    }

    fn receiver() -> SecretKey {
        secret_key_from_bytes(&decode_base64url(RECEIVER_PRIVATE).unwrap()).unwrap()
    }

    #[test]
    fn test_derive_key_and_nonce() {
        let keys = derive_key_and_nonce(
            &salt(),
            &auth(),
            &decode_base64url(RECEIVER_PUBLIC).unwrap(),
            &sender(),
        )
        .unwrap();

        assert_eq!(encode_base64url(*keys.cek), "oIhVW04MRdy2XN9CiKLxTg");
        assert_eq!(encode_base64url(keys.nonce), "4h_95klXJ5E_qnoN");
    }

    #[test]
    fn test_derive_rejects_invalid_point() {
        let mut bad = decode_base64url(RECEIVER_PUBLIC).unwrap();
        bad[10] ^= 0xff;
        let result = derive_key_and_nonce(&salt(), &auth(), &bad, &sender());
        assert!(matches!(result, Err(WebPushError::KeyAgreementError(_))));
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let encoder = Aes128GcmEncoder::new();
        let receiver = receiver();
        let receiver_public = public_key_bytes(&receiver.public_key());

        let record = encoder
            .encrypt(&salt(), &sender(), &receiver_public, &auth(), 128, b"Hello from Rust!")
            .unwrap();
        assert_eq!(record.len(), HEADER_SIZE + 128 + TAG_SIZE);

        let decrypted = decrypt_record(&record, &receiver, &auth()).unwrap();
        assert_eq!(decrypted, b"Hello from Rust!");
    }

    #[test]
    fn test_encrypt_is_deterministic() {
        let encoder = Aes128GcmEncoder::new();
        let receiver_public = decode_base64url(RECEIVER_PUBLIC).unwrap();

        let a = encoder
            .encrypt(&salt(), &sender(), &receiver_public, &auth(), 0, b"same input")
            .unwrap();
        let b = encoder
            .encrypt(&salt(), &sender(), &receiver_public, &auth(), 0, b"same input")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encrypt_payload_roundtrip() {
        let encoder = Aes128GcmEncoder::new();
        let receiver = receiver();
        let p256dh = encode_base64url(public_key_bytes(&receiver.public_key()));

        let record = encoder.encrypt_payload(&p256dh, AUTH, b"ping").unwrap();
        assert_eq!(record.len(), HEADER_SIZE + 128 + TAG_SIZE);
        assert_eq!(&record[16..20], &4096u32.to_be_bytes());
        assert_eq!(record[20], 65);

        assert_eq!(decrypt_record(&record, &receiver, &auth()).unwrap(), b"ping");
    }

    #[test]
    fn test_encrypt_payload_uses_fresh_salt_and_key() {
        let encoder = Aes128GcmEncoder::new();

        let a = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, b"ping").unwrap();
        let b = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, b"ping").unwrap();
        assert_ne!(&a[..SALT_SIZE], &b[..SALT_SIZE]);
        assert_ne!(&a[21..HEADER_SIZE], &b[21..HEADER_SIZE]);
    }

    #[test]
    fn test_payload_too_large() {
        let encoder = Aes128GcmEncoder::new();

        let payload = vec![b'A'; MAX_PAYLOAD_SIZE + 1];
        let result = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, &payload);
        assert!(matches!(result, Err(WebPushError::PayloadTooLarge(4097))));

        let result = encoder.encrypt(
            &salt(),
            &sender(),
            &decode_base64url(RECEIVER_PUBLIC).unwrap(),
            &auth(),
            128,
            &payload,
        );
        assert!(matches!(result, Err(WebPushError::PayloadTooLarge(4097))));
    }

    #[test]
    fn test_large_payloads_keep_block_padding() {
        let encoder = Aes128GcmEncoder::new();
        let receiver_public = decode_base64url(RECEIVER_PUBLIC).unwrap();

        for len in [3993, 4000, 4079, 4080] {
            let record = encoder
                .encrypt(&salt(), &sender(), &receiver_public, &auth(), 128, &vec![b'a'; len])
                .unwrap();
            assert_eq!(record.len(), HEADER_SIZE + 4096 + TAG_SIZE, "len {}", len);
        }

        let payload = vec![b'A'; MAX_PAYLOAD_SIZE];
        let record = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, &payload).unwrap();
        assert_eq!(record.len(), HEADER_SIZE + 4224 + TAG_SIZE);
    }

    #[test]
    fn test_decrypt_body_longer_than_record_size() {
        let encoder = Aes128GcmEncoder::new();
        let receiver = receiver();
        let receiver_public = public_key_bytes(&receiver.public_key());
        let payload = vec![b'z'; MAX_PAYLOAD_SIZE];

        let record = encoder
            .encrypt(&salt(), &sender(), &receiver_public, &auth(), 128, &payload)
            .unwrap();
        assert!(record.len() - HEADER_SIZE > 4096);

        assert_eq!(decrypt_record(&record, &receiver, &auth()).unwrap(), payload);
    }

    #[test]
    fn test_invalid_key_lengths() {
        let encoder = Aes128GcmEncoder::new();
        let key = decode_base64url(RECEIVER_PUBLIC).unwrap();

        let short = encode_base64url(&key[..64]);
        let result = encoder.encrypt_payload(&short, AUTH, b"x");
        assert!(matches!(result, Err(WebPushError::InvalidKeyLength(64))));

        let mut long_key = key.clone();
        long_key.push(0);
        let result = encoder.encrypt_payload(&encode_base64url(&long_key), AUTH, b"x");
        assert!(matches!(result, Err(WebPushError::InvalidKeyLength(66))));
    }

    #[test]
    fn test_invalid_auth_secret() {
        let encoder = Aes128GcmEncoder::new();
        let auth = auth();

        let result = encoder.encrypt_payload(RECEIVER_PUBLIC, &encode_base64url(&auth[..15]), b"x");
        assert!(matches!(result, Err(WebPushError::InvalidAuthSecret(15))));

        let mut long_auth = auth.to_vec();
        long_auth.push(0);
        let result = encoder.encrypt_payload(RECEIVER_PUBLIC, &encode_base64url(&long_auth), b"x");
        assert!(matches!(result, Err(WebPushError::InvalidAuthSecret(17))));
    }

    #[test]
    fn test_malformed_base64() {
        let encoder = Aes128GcmEncoder::new();
        let result = encoder.encrypt_payload("***", AUTH, b"x");
        assert!(matches!(result, Err(WebPushError::DecodeError(_))));
    }

    #[test]
    fn test_decrypt_with_wrong_auth_fails() {
        let encoder = Aes128GcmEncoder::new();
        let receiver = receiver();

        let record = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, b"secret").unwrap();
        let result = decrypt_record(&record, &receiver, &[0u8; AUTH_SECRET_SIZE]);
        assert!(matches!(result, Err(WebPushError::DecryptionError(_))));
    }

    #[test]
    fn test_decrypt_tampered_record_fails() {
        let encoder = Aes128GcmEncoder::new();
        let receiver = receiver();

        let mut record = encoder.encrypt_payload(RECEIVER_PUBLIC, AUTH, b"secret").unwrap();
        let last = record.len() - 1;
        record[last] ^= 0x01;
        let result = decrypt_record(&record, &receiver, &auth());
        assert!(matches!(result, Err(WebPushError::DecryptionError(_))));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn encrypt_decrypt_roundtrip(
                plaintext in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_SIZE),
                pad_to in 0usize..=256,
            ) {
                let receiver = receiver();
                let receiver_public = public_key_bytes(&receiver.public_key());

                let record = Aes128GcmEncoder::new()
                    .encrypt(&salt(), &sender(), &receiver_public, &auth(), pad_to, &plaintext)
                    .unwrap();

                let padded = plaintext.len() + 1 + crate::record::padding_length(plaintext.len(), pad_to);
                prop_assert_eq!(record.len(), HEADER_SIZE + padded + TAG_SIZE);
                if pad_to > 0 {
                    prop_assert_eq!(padded % pad_to, 0);
                }
                prop_assert_eq!(decrypt_record(&record, &receiver, &auth()).unwrap(), plaintext);
            }
        }
    }
}
