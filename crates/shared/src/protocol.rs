use serde::{Deserialize, Serialize};

use crate::domain::DeviceId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginSetupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub device_id: DeviceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginSetupResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}
