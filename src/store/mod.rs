//! Persistence for the three logical collections (rosters, marksheets,
//! unlock requests) plus teacher accounts. Every function takes the open
//! connection; writes are single statements or one transaction each.

pub mod marksheets;
pub mod roster;
pub mod teachers;
pub mod unlock;

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
