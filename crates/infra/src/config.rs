use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// How often the reminder job scheduler polls for due reminders
    pub scheduler_interval_secs: u64,
    /// When the voice call client has no credentials, skip whole poll
    /// cycles (reminders stay scheduled) instead of failing every due
    /// reminder.
    pub skip_batch_when_unconfigured: bool,
    pub vapi: VapiConfig,
}

/// Credentials and endpoint for the Vapi voice AI API. The client is
/// only usable when all three of api key, assistant id and phone
/// number id are present.
#[derive(Debug, Clone)]
pub struct VapiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub assistant_id: Option<String>,
    pub phone_number_id: Option<String>,
}

const DEFAULT_VAPI_API_URL: &str = "https://api.vapi.ai";

impl VapiConfig {
    pub fn from_env() -> Self {
        let api_url =
            env_var_nonempty("VAPI_API_URL").unwrap_or_else(|| DEFAULT_VAPI_API_URL.into());
        let config = Self {
            api_url,
            api_key: env_var_nonempty("VAPI_API_KEY"),
            assistant_id: env_var_nonempty("VAPI_ASSISTANT_ID"),
            phone_number_id: env_var_nonempty("VAPI_PHONE_NUMBER_ID"),
        };
        if !config.is_complete() {
            warn!(
                "Vapi is not fully configured - API Key: {}, Assistant ID: {}, Phone Number ID: {}. Outbound calls will not be placed.",
                set_or_missing(&config.api_key),
                set_or_missing(&config.assistant_id),
                set_or_missing(&config.phone_number_id)
            );
        }
        config
    }

    pub fn unconfigured() -> Self {
        Self {
            api_url: DEFAULT_VAPI_API_URL.into(),
            api_key: None,
            assistant_id: None,
            phone_number_id: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.credentials().is_some()
    }

    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.api_key, &self.assistant_id, &self.phone_number_id) {
            (Some(api_key), Some(assistant_id), Some(phone_number_id)) => {
                Some((api_key, assistant_id, phone_number_id))
            }
            _ => None,
        }
    }
}

fn env_var_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn set_or_missing(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "Set"
    } else {
        "Missing"
    }
}

impl Config {
    pub fn new() -> Self {
        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };

        let default_interval = "30";
        let scheduler_interval_secs =
            std::env::var("SCHEDULER_INTERVAL_SECS").unwrap_or_else(|_| default_interval.into());
        let scheduler_interval_secs = match scheduler_interval_secs.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                warn!(
                    "The given SCHEDULER_INTERVAL_SECS: {} is not valid, falling back to the default: {}.",
                    scheduler_interval_secs, default_interval
                );
                default_interval.parse::<u64>().unwrap()
            }
        };

        let skip_batch_when_unconfigured = match std::env::var("SKIP_BATCH_WHEN_UNCONFIGURED") {
            Ok(flag) => matches!(flag.as_str(), "1" | "true" | "True" | "TRUE"),
            Err(_) => false,
        };
        if skip_batch_when_unconfigured {
            info!("Poll cycles will be skipped while the voice call client is unconfigured");
        }

        Self {
            port,
            scheduler_interval_secs,
            skip_batch_when_unconfigured,
            vapi: VapiConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
