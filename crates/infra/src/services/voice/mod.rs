mod vapi;

pub use vapi::VapiVoiceCallClient;

use callme_domain::PhoneNumber;

/// Everything the voice assistant needs to place one reminder call.
#[derive(Debug, Clone)]
pub struct VoiceCallRequest {
    pub phone_number: PhoneNumber,
    pub title: String,
    pub message: String,
}

/// Outcome of a single call placement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The external system accepted the call
    Delivered { call_id: String },
    /// The external system declined the request, or did not confirm
    /// within the client timeout
    Rejected { reason: String },
    /// The client itself is not usable, e.g. credentials are missing.
    /// A configuration problem, not a per-call failure.
    Unavailable { reason: String },
}

#[async_trait::async_trait]
pub trait IVoiceCallClient: Send + Sync {
    /// Whether all credentials required to place calls are present
    fn is_configured(&self) -> bool;

    /// Performs exactly one network round trip, no internal retries.
    /// Retry policy, if any, belongs to the caller. An `Err` signals a
    /// defect in the client itself rather than a well-formed outcome.
    async fn place_call(&self, req: &VoiceCallRequest) -> anyhow::Result<CallOutcome>;

    /// Whether the external API is reachable with the configured
    /// credentials
    async fn health_check(&self) -> bool;
}
