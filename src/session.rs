use std::collections::{HashMap, HashSet};

use teloxide::types::{MessageId, UserId};
use tokio::sync::Mutex;

use crate::content::SubmissionContent;

/// Process-lifetime session state shared by the message and callback
/// handlers.
///
/// Both maps are intentionally in-memory only: a restart drops unresolved
/// submissions and requires users to /start again. Eviction is explicit;
/// entries for decisions the moderator never takes stay for the process
/// lifetime.
#[derive(Default)]
pub struct Sessions {
    eligible: Mutex<HashSet<UserId>>,
    pending: Mutex<HashMap<(UserId, MessageId), SubmissionContent>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a user as allowed to submit. Never cleared.
    pub async fn mark_eligible(&self, user_id: UserId) {
        self.eligible.lock().await.insert(user_id);
    }

    pub async fn is_eligible(&self, user_id: UserId) -> bool {
        self.eligible.lock().await.contains(&user_id)
    }

    /// Store a submission awaiting moderation. Last write per key wins.
    pub async fn put_pending(
        &self,
        user_id: UserId,
        message_id: MessageId,
        content: SubmissionContent,
    ) {
        self.pending
            .lock()
            .await
            .insert((user_id, message_id), content);
    }

    pub async fn pending(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Option<SubmissionContent> {
        self.pending.lock().await.get(&(user_id, message_id)).cloned()
    }

    /// Remove a resolved submission. Returns false if it was already gone.
    pub async fn evict_pending(&self, user_id: UserId, message_id: MessageId) -> bool {
        self.pending
            .lock()
            .await
            .remove(&(user_id, message_id))
            .is_some()
    }
}
