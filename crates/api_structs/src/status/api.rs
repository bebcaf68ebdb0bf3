use serde::{Deserialize, Serialize};

pub mod get_service_health {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
        pub scheduler_running: bool,
        pub call_client_configured: bool,
        pub call_client_reachable: bool,
    }
}

pub mod trigger_reminder_job {
    use super::*;

    #[derive(Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub message: String,
        pub attempted: usize,
        pub completed: usize,
        pub failed: usize,
    }
}
