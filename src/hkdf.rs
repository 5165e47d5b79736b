//! HKDF-SHA256 extract and expand, built directly on the hash.
//!
//! Only the shapes Web Push needs are supported: keys no longer than the
//! SHA-256 block and a single expansion block (at most 32 output bytes).

use sha2::{Digest, Sha256};

/// SHA-256 block size in bytes.
const BLOCK_SIZE: usize = 64;

/// SHA-256 output size in bytes.
pub const HASH_SIZE: usize = 32;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC-SHA256 of the concatenation of `parts` under `key`.
fn keyed_hash(key: &[u8], parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    debug_assert!(key.len() <= BLOCK_SIZE);

    let mut ipad_key = [IPAD; BLOCK_SIZE];
    let mut opad_key = [OPAD; BLOCK_SIZE];
    for (i, byte) in key.iter().take(BLOCK_SIZE).enumerate() {
        ipad_key[i] ^= byte;
        opad_key[i] ^= byte;
    }

    let mut inner = Sha256::new();
    inner.update(ipad_key);
    for part in parts {
        inner.update(part);
    }
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(opad_key);
    outer.update(inner_hash);
    outer.finalize().into()
}

/// HKDF-Extract: derive a pseudorandom key from `secret` under `salt`.
pub fn extract(salt: &[u8], secret: &[u8]) -> [u8; HASH_SIZE] {
    keyed_hash(salt, &[secret])
}

/// HKDF-Expand: derive `N` bytes of output keying material from `prk`.
///
/// `N` may not exceed the hash size; this is checked at compile time.
pub fn expand<const N: usize>(prk: &[u8], info: &[u8]) -> [u8; N] {
    const { assert!(N <= HASH_SIZE, "single-block HKDF expand") };

    let block = keyed_hash(prk, &[info, &[0x01]]);
    let mut out = [0u8; N];
    out.copy_from_slice(&block[..N]);
    out
}
