//! OAuth2 password-grant exchange against the backend's authorization
//! server.

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use thiserror::Error;

use crate::session::Session;

const TOKEN_PATH: &str = "/authorization-server/oauth/token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("could not reach the authorization server: {0}")]
    ConnectionFailure(String),

    #[error("token response did not contain access_token")]
    MalformedResponse,
}

pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

/// Exchange username/password for a bearer token. No retry; every failure
/// is surfaced to the operator as-is.
pub async fn login(
    http: &reqwest::Client,
    client_credential: &str,
    host: &str,
    username: &str,
    password: &str,
) -> Result<Session, AuthError> {
    let host = normalize_host(host);

    let resp = http
        .post(format!("{host}{TOKEN_PATH}"))
        .header(AUTHORIZATION, client_credential)
        .form(&[
            ("username", username),
            ("password", password),
            ("grant_type", "password"),
        ])
        .send()
        .await
        .map_err(|e| AuthError::ConnectionFailure(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(AuthError::InvalidCredentials);
    }

    let body: Value = resp
        .json()
        .await
        .map_err(|_| AuthError::MalformedResponse)?;
    let token = body
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or(AuthError::MalformedResponse)?;

    Ok(Session {
        token: token.to_string(),
        username: username.to_string(),
        base_host: host,
        issued_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_normalization() {
        assert_eq!(
            normalize_host(" https://saas.example/ "),
            "https://saas.example"
        );
        assert_eq!(normalize_host("https://saas.example//"), "https://saas.example");
    }
}
