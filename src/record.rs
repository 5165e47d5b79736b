//! Record framing for the `aes128gcm` content encoding.

use crate::types::{
    Result, WebPushError, MIN_RECORD_SIZE, PUBLIC_KEY_SIZE, RECORD_DELIMITER, RECORD_SIZE,
    SALT_SIZE, TAG_SIZE,
};

/// Header of an `aes128gcm` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Per-message salt (16 bytes).
    pub salt: [u8; SALT_SIZE],
    /// Declared record size.
    pub record_size: u32,
    /// Sender's uncompressed public key (65 bytes).
    pub key_id: [u8; PUBLIC_KEY_SIZE],
}

impl RecordHeader {
    /// Creates a header with the fixed record size.
    pub fn new(salt: [u8; SALT_SIZE], key_id: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self {
            salt,
            record_size: RECORD_SIZE,
            key_id,
        }
    }

    /// Append the encoded header to `buf`.
    ///
    /// Format (86 bytes):
    /// - [0-15]   salt (16 bytes)
    /// - [16-19]  record size (u32, big-endian)
    /// - [20]     key id length (65)
    /// - [21-85]  key id: sender public key (65 bytes)
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.record_size.to_be_bytes());
        buf.push(PUBLIC_KEY_SIZE as u8);
        buf.extend_from_slice(&self.key_id);
    }

    /// Decode a header, returning it with the sealed body that follows.
    pub fn decode(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < SALT_SIZE + 5 {
            return Err(WebPushError::InvalidRecord(format!(
                "Data too short: {} bytes",
                data.len()
            )));
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&data[..SALT_SIZE]);
        let mut offset = SALT_SIZE;

        let mut rs = [0u8; 4];
        rs.copy_from_slice(&data[offset..offset + 4]);
        let record_size = u32::from_be_bytes(rs);
        offset += 4;

        if record_size < MIN_RECORD_SIZE {
            return Err(WebPushError::InvalidRecord(format!(
                "Record size {} below minimum {}",
                record_size, MIN_RECORD_SIZE
            )));
        }

        let key_id_len = data[offset] as usize;
        offset += 1;
        if key_id_len != PUBLIC_KEY_SIZE {
            return Err(WebPushError::InvalidRecord(format!(
                "Key id must be {} bytes, got {}",
                PUBLIC_KEY_SIZE, key_id_len
            )));
        }
        if data.len() < offset + key_id_len {
            return Err(WebPushError::InvalidRecord("Truncated key id".into()));
        }

        let mut key_id = [0u8; PUBLIC_KEY_SIZE];
        key_id.copy_from_slice(&data[offset..offset + key_id_len]);
        offset += key_id_len;

        let body = &data[offset..];
        if body.len() < TAG_SIZE + 1 {
            return Err(WebPushError::InvalidRecord(format!(
                "Sealed body too short: {} bytes",
                body.len()
            )));
        }

        Ok((
            Self {
                salt,
                record_size,
                key_id,
            },
            body,
        ))
    }
}

/// Number of zero bytes appended after the delimiter.
///
/// Pads `plaintext_len + 1` up by `pad_to - ((plaintext_len + 1) % pad_to)`;
/// a boundary of zero disables padding. Near the payload limit the sealed
/// body may run past the declared record size; receivers take the single
/// record as sent.
pub fn padding_length(plaintext_len: usize, pad_to: usize) -> usize {
    if pad_to == 0 {
        return 0;
    }

    pad_to - (plaintext_len + 1) % pad_to
}

/// Build the record plaintext: data, delimiter, zero padding.
///
/// Capacity for the authentication tag is reserved so sealing in place
/// does not reallocate.
pub fn pad_plaintext(plaintext: &[u8], pad_to: usize) -> Vec<u8> {
    let padding = padding_length(plaintext.len(), pad_to);
    let padded_len = plaintext.len() + 1 + padding;

    let mut buf = Vec::with_capacity(padded_len + TAG_SIZE);
    buf.extend_from_slice(plaintext);
    buf.push(RECORD_DELIMITER);
    buf.resize(padded_len, 0);
    buf
}

/// Strip zero padding and the last-record delimiter from opened plaintext.
pub fn strip_padding(padded: &[u8]) -> Result<&[u8]> {
    let end = padded
        .iter()
        .rposition(|&b| b != 0)
        .ok_or_else(|| WebPushError::DecryptionError("Record contains only padding".into()))?;

    if padded[end] != RECORD_DELIMITER {
        return Err(WebPushError::DecryptionError(format!(
            "Unexpected record delimiter 0x{:02x}",
            padded[end]
        )));
    }

    Ok(&padded[..end])
}
