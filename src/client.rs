//! Push request assembly.
//!
//! The client encrypts a payload for a subscription and signs a VAPID
//! header, producing a [`PushRequest`] that any HTTP stack can send.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::crypto::{Aes128GcmEncoder, WebPushEncoder};
use crate::models::{PushOptions, PushRequest, Subscription, VapidDetails};
use crate::types::{Result, WebPushError};
use crate::vapid::{DirectSigner, VapidSigner};

/// Builds encrypted, signed push requests.
#[derive(Clone)]
pub struct WebPushClient {
    signer: Arc<dyn VapidSigner>,
    encoder: Arc<dyn WebPushEncoder>,
}

impl WebPushClient {
    /// Creates a client from a signer and an encoder.
    pub fn new(signer: Arc<dyn VapidSigner>, encoder: Arc<dyn WebPushEncoder>) -> Self {
        Self { signer, encoder }
    }

    /// Assemble a push request.
    ///
    /// # Arguments
    /// * `payload` - Message to deliver
    /// * `subscription` - Target subscription
    /// * `vapid` - Application server identity
    /// * `options` - Delivery options; defaults apply when `None`
    ///
    /// # Returns
    /// The endpoint, headers and encrypted body to POST
    pub fn build_request(
        &self,
        payload: &[u8],
        subscription: &Subscription,
        vapid: &VapidDetails,
        options: Option<&PushOptions>,
    ) -> Result<PushRequest> {
        let endpoint = Url::parse(&subscription.endpoint).map_err(|e| {
            WebPushError::InvalidEndpoint(format!("{}: {}", subscription.endpoint, e))
        })?;

        let authorization = self.signer.vapid_header(
            &endpoint,
            &vapid.keys.private_key,
            &vapid.keys.public_key,
            &vapid.subject,
        )?;

        let body = self.encoder.encrypt_payload(
            &subscription.keys.p256dh,
            &subscription.keys.auth,
            payload,
        )?;

        let default_options = PushOptions::default();
        let options = options.unwrap_or(&default_options);

        let mut headers = vec![
            ("Authorization", authorization),
            ("Content-Type", "application/octet-stream".to_string()),
            ("Content-Length", body.len().to_string()),
            ("Content-Encoding", "aes128gcm".to_string()),
            ("TTL", options.ttl.to_string()),
        ];
        if let Some(urgency) = options.urgency {
            headers.push(("Urgency", urgency.as_str().to_string()));
        }
        if let Some(topic) = &options.topic {
            headers.push(("Topic", topic.clone()));
        }

        tracing::debug!(
            host = endpoint.host_str().unwrap_or_default(),
            body_len = body.len(),
            ttl = options.ttl,
            "built push request"
        );

        Ok(PushRequest {
            endpoint,
            headers,
            body,
        })
    }
}

impl Default for WebPushClient {
    fn default() -> Self {
        Self::new(
            Arc::new(DirectSigner::default()),
            Arc::new(Aes128GcmEncoder::default()),
        )
    }
}

impl fmt::Debug for WebPushClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebPushClient").finish_non_exhaustive()
    }
}
