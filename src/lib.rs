//! Web Push - encrypted push messages for browsers
//!
//! Rust implementation of `aes128gcm` payload encryption (RFC 8291) using
//! P-256 ECDH + HKDF-SHA256 + AES-128-GCM, and VAPID authorization
//! (RFC 8292) with ES256 tokens.

pub mod hkdf;

mod types;
mod keys;
mod record;
mod crypto;
mod jwt;
mod cache;
mod vapid;
mod models;
mod client;

pub use types::*;
pub use keys::*;
pub use record::*;
pub use crypto::*;
pub use jwt::*;
pub use cache::*;
pub use vapid::*;
pub use models::*;
pub use client::*;
