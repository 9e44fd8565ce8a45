//! Note lifecycle state machine.
//!
//! | from \ action | approve | reject | delete |
//! |---|---|---|---|
//! | pending | approved | rejected | deleted |
//! | approved | conflict | conflict | deleted |
//! | rejected | conflict | conflict | deleted |
//! | deleted | not found | not found | not found |

use uuid::Uuid;

use super::note::{Note, NoteStatus};
use crate::core::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Pending,
    Approved,
    Rejected,
    /// Record gone. Terminal.
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Delete,
}

impl From<NoteStatus> for NoteState {
    fn from(status: NoteStatus) -> Self {
        match status {
            NoteStatus::Pending => NoteState::Pending,
            NoteStatus::Approved => NoteState::Approved,
            NoteStatus::Rejected => NoteState::Rejected,
        }
    }
}

impl NoteState {
    /// State of a possibly-missing record
    pub fn of(note: Option<&Note>) -> Self {
        note.map_or(NoteState::Deleted, |n| n.status.into())
    }

    pub fn apply(self, transition: Transition, note_id: Uuid) -> Result<NoteState> {
        match (self, transition) {
            (NoteState::Deleted, _) => {
                Err(AppError::NotFound(format!("Note '{}' not found", note_id)))
            }
            (_, Transition::Delete) => Ok(NoteState::Deleted),
            (NoteState::Pending, Transition::Approve) => Ok(NoteState::Approved),
            (NoteState::Pending, Transition::Reject) => Ok(NoteState::Rejected),
            (NoteState::Approved, _) => Err(AppError::Conflict(format!(
                "Note '{}' is already approved",
                note_id
            ))),
            (NoteState::Rejected, _) => Err(AppError::Conflict(format!(
                "Note '{}' is already rejected",
                note_id
            ))),
        }
    }
}
