//! Data models for Web Push.
//!
//! Subscriptions and VAPID credentials use the JSON shapes browsers and
//! key generators emit, so they can be deserialized directly.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::keys::generate_vapid_keys;
use crate::types::DEFAULT_TTL;

/// Keys a browser hands out with a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Receiver public key, base64url uncompressed P-256 point.
    pub p256dh: String,
    /// Receiver auth secret, base64url 16 bytes.
    pub auth: String,
}

/// A push subscription (`PushSubscription.toJSON()`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Encryption keys for the subscription.
    pub keys: SubscriptionKeys,
}

impl Subscription {
    /// Creates a new subscription.
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}

/// Application server key pair, base64url encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeys {
    /// Uncompressed P-256 public key.
    pub public_key: String,
    /// Raw 32-byte private scalar.
    pub private_key: String,
}

impl VapidKeys {
    /// Generates a new random key pair.
    pub fn generate() -> Self {
        generate_vapid_keys()
    }
}

/// VAPID identity: contact subject plus key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VapidDetails {
    /// Contact address (`mailto:` or `https:` URI, or a bare email).
    pub subject: String,
    /// Key pair, serialized inline.
    #[serde(flatten)]
    pub keys: VapidKeys,
}

impl VapidDetails {
    /// Creates VAPID details from a subject and key pair.
    pub fn new(subject: impl Into<String>, keys: VapidKeys) -> Self {
        Self {
            subject: subject.into(),
            keys,
        }
    }
}

/// Delivery priority hint for the push service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    VeryLow,
    Low,
    Normal,
    High,
}

impl Urgency {
    /// Header value for this urgency.
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::VeryLow => "very-low",
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
        }
    }
}

/// Per-message delivery options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOptions {
    /// Seconds the push service may hold the message.
    pub ttl: u32,
    /// Delivery priority.
    pub urgency: Option<Urgency>,
    /// Replacement key; a newer message with the same topic supersedes an
    /// undelivered older one.
    pub topic: Option<String>,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            urgency: None,
            topic: None,
        }
    }
}

impl PushOptions {
    /// Sets the time-to-live.
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the urgency.
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    /// Sets the topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// A fully assembled push message, ready to POST to `endpoint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Subscription endpoint.
    pub endpoint: Url,
    /// Request headers in insertion order.
    pub headers: Vec<(&'static str, String)>,
    /// Encrypted record.
    pub body: Vec<u8>,
}

impl PushRequest {
    /// Look up a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
