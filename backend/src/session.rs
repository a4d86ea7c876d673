//! Operator session: bearer token, issue time, and the TTL gate every
//! privileged route passes through.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// An established login. Destroyed on logout or once the token outlives the
/// configured TTL.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
    /// Backend host, normalized (no trailing slash).
    pub base_host: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.issued_at).num_seconds()
    }

    /// The token, unless the session has outlived `ttl_secs`.
    pub fn token_if_fresh(&self, now: DateTime<Utc>, ttl_secs: i64) -> Option<&str> {
        if self.age_secs(now) <= ttl_secs {
            Some(&self.token)
        } else {
            None
        }
    }

    pub fn expires_in_secs(&self, now: DateTime<Utc>, ttl_secs: i64) -> i64 {
        (ttl_secs - self.age_secs(now)).max(0)
    }
}

/// Holds the single operator session and enforces expiry on every read.
pub struct SessionGate {
    ttl_secs: i64,
    current: RwLock<Option<Session>>,
}

impl SessionGate {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            current: RwLock::new(None),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub async fn establish(&self, session: Session) {
        *self.current.write().await = Some(session);
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    /// The current session, re-checked against the TTL. An expired session
    /// is cleared here so the caller sees the Unauthenticated state.
    pub async fn current(&self) -> Option<Session> {
        let mut guard = self.current.write().await;
        let fresh = match guard.as_ref() {
            Some(s) => s.token_if_fresh(Utc::now(), self.ttl_secs).is_some(),
            None => return None,
        };
        if !fresh {
            log::info!("session expired, forcing re-login");
            *guard = None;
            return None;
        }
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(issued_at: DateTime<Utc>) -> Session {
        Session {
            token: "tok".to_string(),
            username: "ops".to_string(),
            base_host: "https://backend.example".to_string(),
            issued_at,
        }
    }

    #[test]
    fn fresh_token_is_returned() {
        let now = Utc::now();
        let s = session(now - Duration::seconds(100));
        assert_eq!(s.token_if_fresh(now, 3600), Some("tok"));
    }

    #[test]
    fn token_absent_past_ttl_even_if_populated() {
        let now = Utc::now();
        let s = session(now - Duration::seconds(3601));
        assert!(!s.token.is_empty());
        assert_eq!(s.token_if_fresh(now, 3600), None);
    }

    #[test]
    fn expires_in_never_negative() {
        let now = Utc::now();
        let s = session(now - Duration::seconds(5000));
        assert_eq!(s.expires_in_secs(now, 3600), 0);
    }

    #[actix_web::test]
    async fn gate_clears_expired_session() {
        let gate = SessionGate::new(10);
        gate.establish(session(Utc::now() - Duration::seconds(60)))
            .await;
        assert!(gate.current().await.is_none());
        // A second read must not resurrect it.
        assert!(gate.current().await.is_none());
    }

    #[actix_web::test]
    async fn gate_keeps_fresh_session() {
        let gate = SessionGate::new(3600);
        gate.establish(session(Utc::now())).await;
        assert_eq!(gate.current().await.map(|s| s.username), Some("ops".into()));
    }
}
