use thiserror::Error;
use crate::types::{Mode, StreamKind};
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("{active} is already active; stop it before starting another session")]
    ModeConflict { active: Mode },
    #[error("failed to attach {stream} listener: {reason}")]
    SubscriptionFailure { stream: StreamKind, reason: String },
    #[error("update interval must be a positive number of milliseconds, got {0}")]
    InvalidInterval(u32),
}
