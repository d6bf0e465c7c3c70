//! Marksheet status machine.
//!
//! ```text
//!   new ──┐
//!         ├─ Submit ──> submitted ── MarkUnlockPending ──> pending_unlock
//!  draft ─┘                 │                                  │
//!    ^                      └──────── ApproveUnlock ───────────┤
//!    └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `AdministrativeOverride` (a full save with status `draft`) and
//! `ApproveUnlock` land on `draft` from any state. Admin cell edits are not
//! transitions at all; see [`status_after_cell_edit`].

use crate::error::{AppError, AppResult};
use crate::marks::{Entries, SheetStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    MarkUnlockPending,
    ApproveUnlock,
    AdministrativeOverride,
}

impl Transition {
    pub fn name(self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::MarkUnlockPending => "mark_unlock_pending",
            Transition::ApproveUnlock => "approve_unlock",
            Transition::AdministrativeOverride => "administrative_override",
        }
    }

    /// The transition a full-sheet save with an explicit target status asks for.
    pub fn for_save_target(target: SheetStatus) -> AppResult<Self> {
        match target {
            SheetStatus::Draft => Ok(Transition::AdministrativeOverride),
            SheetStatus::Submitted => Ok(Transition::Submit),
            SheetStatus::PendingUnlock => Ok(Transition::MarkUnlockPending),
            SheetStatus::New => Err(AppError::validation(
                "status must be one of: draft, submitted, pending_unlock",
            )),
        }
    }
}

pub fn apply(current: SheetStatus, transition: Transition) -> AppResult<SheetStatus> {
    use SheetStatus::*;
    match (transition, current) {
        (Transition::Submit, New | Draft | Submitted) => Ok(Submitted),
        (Transition::Submit, PendingUnlock) => Err(AppError::Conflict(
            "sheet has an unlock request outstanding and cannot be submitted".into(),
        )),
        (Transition::MarkUnlockPending, Submitted | PendingUnlock) => Ok(PendingUnlock),
        (Transition::MarkUnlockPending, New | Draft) => Err(AppError::Conflict(format!(
            "only a submitted sheet can await unlock (status is {current})"
        ))),
        (Transition::ApproveUnlock, _) | (Transition::AdministrativeOverride, _) => Ok(Draft),
    }
}

/// True when the transition moves a locked sheet back to an editable state.
pub fn reopens(current: SheetStatus, next: SheetStatus) -> bool {
    !is_editable(current) && is_editable(next)
}

pub fn is_editable(status: SheetStatus) -> bool {
    matches!(status, SheetStatus::New | SheetStatus::Draft)
}

/// Status written by an admin cell edit: a brand-new sheet becomes a draft,
/// an existing one keeps whatever status it had.
pub fn status_after_cell_edit(existing: Option<SheetStatus>) -> SheetStatus {
    match existing {
        None | Some(SheetStatus::New) => SheetStatus::Draft,
        Some(s) => s,
    }
}

/// A request to unlock is only meaningful for a locked sheet.
pub fn accepts_unlock_request(status: SheetStatus) -> bool {
    matches!(status, SheetStatus::Submitted | SheetStatus::PendingUnlock)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetControls {
    pub editable: bool,
    pub can_save_draft: bool,
    pub can_submit: bool,
    pub can_request_unlock: bool,
    pub unlock_request_disabled: bool,
}

pub fn controls(status: SheetStatus) -> SheetControls {
    let editable = is_editable(status);
    SheetControls {
        editable,
        can_save_draft: editable,
        can_submit: editable,
        can_request_unlock: accepts_unlock_request(status),
        unlock_request_disabled: status == SheetStatus::PendingUnlock,
    }
}

/// Roster rolls whose written or practical value is still missing.
pub fn missing_rolls(roster_rolls: impl IntoIterator<Item = u32>, entries: &Entries) -> Vec<u32> {
    let mut out: Vec<u32> = roster_rolls
        .into_iter()
        .filter(|roll| !entries.get(roll).is_some_and(|e| e.is_complete()))
        .collect();
    out.sort_unstable();
    out
}
