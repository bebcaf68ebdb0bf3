use super::{CallOutcome, IVoiceCallClient, VoiceCallRequest};
use crate::config::VapiConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Voice call client backed by the Vapi API. Places outbound phone
/// calls through a preconfigured assistant which speaks the reminder
/// to the recipient.
pub struct VapiVoiceCallClient {
    client: Client,
    config: VapiConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VapiCreateCallRequest {
    assistant_id: String,
    assistant_overrides: VapiAssistantOverrides,
    phone_number_id: String,
    customer: VapiCustomer,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VapiAssistantOverrides {
    first_message: String,
}

#[derive(Debug, Serialize)]
struct VapiCustomer {
    number: String,
}

#[derive(Debug, Deserialize)]
struct VapiCallResponse {
    id: String,
}

impl VapiVoiceCallClient {
    pub fn new(config: VapiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// The first thing the assistant says when the recipient picks up
    fn first_message(req: &VoiceCallRequest) -> String {
        format!(
            "Hello! This is your reminder about: {}. {}",
            req.title, req.message
        )
    }
}

/// Vapi error bodies carry a `message` (string or array) or an `error`
/// field, fall back to the raw body when neither parses.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => {
            let field = json.get("message").or_else(|| json.get("error"));
            match field {
                Some(serde_json::Value::String(message)) => message.clone(),
                Some(value) => value.to_string(),
                None => body.to_string(),
            }
        }
        Err(_) => body.to_string(),
    }
}

#[async_trait::async_trait]
impl IVoiceCallClient for VapiVoiceCallClient {
    fn is_configured(&self) -> bool {
        self.config.is_complete()
    }

    async fn place_call(&self, req: &VoiceCallRequest) -> anyhow::Result<CallOutcome> {
        let (api_key, assistant_id, phone_number_id) = match self.config.credentials() {
            Some(credentials) => credentials,
            None => {
                return Ok(CallOutcome::Unavailable {
                    reason: "Vapi credentials are not configured".into(),
                })
            }
        };

        let body = VapiCreateCallRequest {
            assistant_id: assistant_id.to_string(),
            assistant_overrides: VapiAssistantOverrides {
                first_message: Self::first_message(req),
            },
            phone_number_id: phone_number_id.to_string(),
            customer: VapiCustomer {
                number: req.phone_number.as_str().to_string(),
            },
        };

        let url = format!("{}/calls", self.config.api_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(CALL_TIMEOUT)
            .json(&body)
            .send()
            .await;

        // An unanswered request is a rejection: the reminder must never
        // be left ambiguous.
        let res = match res {
            Ok(res) => res,
            Err(e) if e.is_timeout() => {
                return Ok(CallOutcome::Rejected {
                    reason: "Vapi API request timed out".into(),
                })
            }
            Err(e) => {
                return Ok(CallOutcome::Rejected {
                    reason: format!("Vapi API request failed: {}", e),
                })
            }
        };

        match res.status() {
            StatusCode::OK | StatusCode::CREATED => match res.json::<VapiCallResponse>().await {
                Ok(call) => {
                    info!(
                        "Vapi call triggered successfully. Call id: {}, Phone: {}",
                        call.id, req.phone_number
                    );
                    Ok(CallOutcome::Delivered { call_id: call.id })
                }
                Err(e) => Ok(CallOutcome::Rejected {
                    reason: format!("Error parsing Vapi response: {}", e),
                }),
            },
            status => {
                let body = res.text().await.unwrap_or_default();
                Ok(CallOutcome::Rejected {
                    reason: format!(
                        "Vapi API error ({}): {}",
                        status.as_u16(),
                        error_message(&body)
                    ),
                })
            }
        }
    }

    async fn health_check(&self) -> bool {
        let api_key = match &self.config.api_key {
            Some(api_key) => api_key,
            None => return false,
        };

        let url = format!("{}/calls", self.config.api_url);
        let res = self
            .client
            .get(&url)
            .query(&[("limit", "1")])
            .bearer_auth(api_key)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await;

        match res {
            Ok(res) => res.status() == StatusCode::OK,
            Err(e) => {
                warn!("Vapi health check failed: {}", e);
                false
            }
        }
    }
}
