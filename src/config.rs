use anyhow::Context;
use chrono::Datelike;
use std::path::PathBuf;

use crate::consolidate::DEFAULT_SUBJECTS;

pub const DEFAULT_ADMIN_ID: &str = "cl_admin";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

/// Runtime configuration, read from the environment (and `.env` when
/// present).
///
/// | Env Var                          | Default                |
/// |----------------------------------|------------------------|
/// | `MARKSHEETD_WORKSPACE`           | unset (wait for `workspace.select`) |
/// | `MARKSHEETD_SESSION_TTL_MINUTES` | `60`                   |
/// | `MARKSHEETD_ADMIN_ID`            | `cl_admin`             |
/// | `MARKSHEETD_ADMIN_PASSWORD`      | `Admin@<current year>` |
/// | `MARKSHEETD_SUBJECTS`            | `BNGA,ENGL,MATH,PSC,LSC,HIST,GEGR` |
#[derive(Debug, Clone)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub session_ttl_minutes: i64,
    pub admin_id: String,
    admin_password: Option<String>,
    pub subjects: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workspace: None,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            admin_id: DEFAULT_ADMIN_ID.to_string(),
            admin_password: None,
            subjects: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Config::default();
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        cfg.workspace = var("MARKSHEETD_WORKSPACE").map(PathBuf::from);
        if let Some(raw) = var("MARKSHEETD_SESSION_TTL_MINUTES") {
            let minutes: i64 = raw.parse().with_context(|| {
                format!("MARKSHEETD_SESSION_TTL_MINUTES must be an integer, got {raw:?}")
            })?;
            anyhow::ensure!(minutes > 0, "MARKSHEETD_SESSION_TTL_MINUTES must be > 0");
            anyhow::ensure!(
                chrono::Duration::try_minutes(minutes).is_some(),
                "MARKSHEETD_SESSION_TTL_MINUTES is out of range: {minutes}"
            );
            cfg.session_ttl_minutes = minutes;
        }
        if let Some(id) = var("MARKSHEETD_ADMIN_ID") {
            cfg.admin_id = id;
        }
        cfg.admin_password = var("MARKSHEETD_ADMIN_PASSWORD");
        if let Some(raw) = var("MARKSHEETD_SUBJECTS") {
            let subjects: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            anyhow::ensure!(!subjects.is_empty(), "MARKSHEETD_SUBJECTS lists no subjects");
            cfg.subjects = subjects;
        }
        Ok(cfg)
    }

    /// Idle expiry for admin sessions.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.session_ttl_minutes)
            .unwrap_or_else(|| chrono::Duration::minutes(DEFAULT_SESSION_TTL_MINUTES))
    }

    /// The admin password: configured value, else `Admin@<year>` for the
    /// current calendar year.
    pub fn admin_password(&self) -> String {
        match &self.admin_password {
            Some(p) => p.clone(),
            None => format!("Admin@{}", current_year()),
        }
    }
}

pub fn current_year() -> i64 {
    i64::from(chrono::Local::now().year())
}
