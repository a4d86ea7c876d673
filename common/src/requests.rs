use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
/// Login payload: the backend host to work against plus the operator's
/// credentials for the password grant.
pub struct LoginRequest {
    pub host: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub host: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, Deserialize)]
/// Comma-separated id list for the bulk delete surface. Tokens that do not
/// parse as numbers are dropped without an error.
pub struct DeleteRequest {
    pub ids: String,
}

#[derive(Debug, Deserialize)]
pub struct SinglePunchRequest {
    pub external_number: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`; seconds are forced to `:00`.
    pub time: String,
}
