use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use rusqlite::Connection;
use serde::Deserialize;

use crate::config::Config;
use crate::session::{SessionNotice, SessionRegistry};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub config: Config,
    pub sessions: SessionRegistry,
    /// Receiving ends of each admin session's notice channel, drained by
    /// `admin.notices`.
    pub session_inboxes: HashMap<String, Receiver<SessionNotice>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let ttl = config.session_ttl();
        AppState {
            workspace: None,
            db: None,
            config,
            sessions: SessionRegistry::new(ttl),
            session_inboxes: HashMap::new(),
        }
    }
}
