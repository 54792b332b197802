use teloxide::types::{MessageId, UserId};
use thiserror::Error;

/// Outcome classification for the relay pipeline. Suppressed kinds
/// (blocked, not eligible, unsupported content) deliberately produce no
/// user-visible output.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("sender is blocked")]
    Blocked,

    #[error("sender has not started the bot")]
    NotEligible,

    #[error("unsupported content type")]
    UnsupportedContent,

    #[error("no pending submission for user {} message {}", .user_id, .message_id.0)]
    SubmissionNotFound {
        user_id: UserId,
        message_id: MessageId,
    },

    #[error("telegram api error: {0}")]
    Api(#[from] teloxide::RequestError),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
