use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

use crate::digest::NotificationPayload;
use crate::types::{NewswatchError, Result, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The push service reports the endpoint permanently invalid (HTTP 410
    /// semantics); the subscription should be pruned.
    #[error("subscription endpoint is gone")]
    Gone,

    #[error("push delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam between the dispatcher and the push service, so tests can
/// inject a recording transport.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> std::result::Result<(), PushError>;
}

/// VAPID web-push delivery with an encrypted JSON payload.
pub struct WebPushTransport {
    client: IsahcWebPushClient,
    vapid_private_pem: Vec<u8>,
    subject: String,
}

impl WebPushTransport {
    /// `vapid_private_pem` is the ES256 private key in PEM form; `contact`
    /// is the operator email carried in the VAPID `sub` claim.
    pub fn new(vapid_private_pem: Vec<u8>, contact: &str) -> Result<Self> {
        let client = IsahcWebPushClient::new()
            .map_err(|e| NewswatchError::Delivery(e.to_string()))?;
        Ok(Self {
            client,
            vapid_private_pem,
            subject: format!("mailto:{contact}"),
        })
    }
}

fn to_push_error(err: WebPushError) -> PushError {
    match err {
        WebPushError::EndpointNotValid | WebPushError::EndpointNotFound => PushError::Gone,
        other => PushError::Delivery(other.to_string()),
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> std::result::Result<(), PushError> {
        let info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.p256dh,
            &subscription.auth,
        );

        let mut signature =
            VapidSignatureBuilder::from_pem(&self.vapid_private_pem[..], &info)
                .map_err(to_push_error)?;
        signature.add_claim("sub", self.subject.as_str());
        let signature = signature.build().map_err(to_push_error)?;

        let body =
            serde_json::to_vec(payload).map_err(|e| PushError::Delivery(e.to_string()))?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, &body);
        builder.set_vapid_signature(signature);
        let message = builder.build().map_err(to_push_error)?;

        self.client.send(message).await.map_err(to_push_error)
    }
}

/// Stand-in transport for deployments without VAPID keys: every delivery
/// fails softly and gets logged by the dispatcher.
pub struct DisabledPushTransport;

#[async_trait]
impl PushTransport for DisabledPushTransport {
    async fn send(
        &self,
        _subscription: &Subscription,
        _payload: &NotificationPayload,
    ) -> std::result::Result<(), PushError> {
        Err(PushError::Delivery(
            "push delivery is not configured (missing VAPID key)".to_string(),
        ))
    }
}
