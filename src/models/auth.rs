use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub authenticated: bool,
    pub exp: usize, // expiration time
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub pin: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    /// Token lifetime in milliseconds, for client-side expiry handling.
    pub expires_in: u64,
}
