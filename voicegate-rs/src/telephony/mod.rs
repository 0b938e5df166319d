//! Outbound call dispatch abstraction

use crate::error::Result;

pub mod mock;
pub mod twilio;

pub use mock::MockDialer;
pub use twilio::TwilioDialer;

/// Parameters for one outbound fulfillment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    /// Caller's address (the number that dialed in).
    pub to: String,
    /// Our provisioned number the call originates from.
    pub from: String,
    /// Webhook the provider fetches once the call connects; carries the
    /// serial code as correlation data.
    pub callback_url: String,
}

/// Provider seam for placing outbound calls.
#[async_trait::async_trait]
pub trait OutboundDialer: Send + Sync {
    /// Place a call and return the provider's call identifier.
    ///
    /// Fails with `ProviderMisconfigured` when credentials are absent and
    /// `DispatchFailed` when the provider rejects or the transport breaks.
    async fn place_call(&self, call: &OutboundCall) -> Result<String>;

    /// Provider name for logs.
    fn provider_name(&self) -> &str;
}
