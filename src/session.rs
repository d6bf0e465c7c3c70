//! Admin session registry.
//!
//! Sessions are keyed by an opaque token and expire after a period of
//! inactivity. The school has one admin, so the registry admits a single
//! live session at a time; a second login is refused and the holder of the
//! live session is told about it over that session's notice channel. The
//! single-holder rule is a scaling limit.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionNotice {
    /// Someone tried to log in as admin while this session was live.
    LoginAttempt { at: DateTime<Utc> },
}

#[derive(Debug)]
struct AdminSession {
    last_seen: DateTime<Utc>,
    notices: Sender<SessionNotice>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an admin session is already active")]
    AlreadyActive,
}

#[derive(Debug)]
pub struct SessionRegistry {
    idle_ttl: Duration,
    sessions: HashMap<String, AdminSession>,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        SessionRegistry {
            idle_ttl,
            sessions: HashMap::new(),
        }
    }

    fn is_live(&self, session: &AdminSession, now: DateTime<Utc>) -> bool {
        now - session.last_seen < self.idle_ttl
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        let ttl = self.idle_ttl;
        self.sessions.retain(|_, s| now - s.last_seen < ttl);
        before - self.sessions.len()
    }

    /// Open the admin session. Returns the token and the receiving end of
    /// the session's notice channel.
    pub fn open(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(String, Receiver<SessionNotice>), SessionError> {
        let purged = self.purge_expired(now);
        if purged > 0 {
            tracing::info!(purged, "expired admin sessions dropped");
        }
        if let Some(live) = self.sessions.values().find(|s| self.is_live(s, now)) {
            // The holder may have dropped its receiver; the refusal stands either way.
            let _ = live.notices.send(SessionNotice::LoginAttempt { at: now });
            return Err(SessionError::AlreadyActive);
        }

        let token = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel();
        self.sessions.insert(
            token.clone(),
            AdminSession {
                last_seen: now,
                notices: tx,
            },
        );
        Ok((token, rx))
    }

    /// Validate a token and extend its idle window.
    pub fn touch(&mut self, token: &str, now: DateTime<Utc>) -> bool {
        let ttl = self.idle_ttl;
        match self.sessions.get_mut(token) {
            Some(s) if now - s.last_seen < ttl => {
                s.last_seen = now;
                true
            }
            Some(_) => {
                self.sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn close(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.sessions
            .values()
            .filter(|s| self.is_live(s, now))
            .count()
    }
}
