//! Shared portal state, injected into every handler as `web::Data`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::client::ApiClient;
use crate::config::PortalConfig;
use crate::session::{Session, SessionGate};

pub struct PortalState {
    pub config: PortalConfig,
    pub sessions: SessionGate,
    pub http: reqwest::Client,
    /// md5 of the last processed upload, per module key. Cleared on logout.
    pub upload_hashes: RwLock<HashMap<String, String>>,
}

impl PortalState {
    pub fn new(config: PortalConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            sessions: SessionGate::new(config.session_ttl_secs),
            http,
            upload_hashes: RwLock::new(HashMap::new()),
            config,
        })
    }

    /// Session gate for privileged handlers: the live session plus a client
    /// bound to its token, or `None` (handler answers 401).
    pub async fn authorized(&self) -> Option<(ApiClient, Session)> {
        let session = self.sessions.current().await?;
        let client = ApiClient::new(self.http.clone(), session.token.clone());
        Some((client, session))
    }

    /// Full logout: session and the duplicate-upload memory.
    pub async fn end_session(&self) {
        self.sessions.clear().await;
        self.upload_hashes.write().await.clear();
    }
}
