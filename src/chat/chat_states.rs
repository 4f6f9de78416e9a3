// Typing indicator and simulated counterpart replies

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::models::ConversationId;
use crate::store::ChatState;
use super::{ChatSession, TaskKey};

impl ChatSession {
    pub async fn start_typing(&self, conversation_id: ConversationId) -> Arc<ChatState> {
        self.mutate(|store| store.start_typing(conversation_id)).await
    }

    pub async fn stop_typing(&self, conversation_id: ConversationId) -> Arc<ChatState> {
        self.mutate(|store| store.stop_typing(conversation_id)).await
    }

    /// Show the counterpart typing for `typing_for`, then deliver `text`.
    ///
    /// Clearing the indicator and appending the reply happen in one mutation.
    /// Scheduling another reply for the same conversation replaces this one.
    pub async fn simulate_reply(&self, conversation_id: ConversationId, text: String, typing_for: Duration) {
        let session = self.clone();

        self.schedule(TaskKey::Reply(conversation_id), async move {
            session.start_typing(conversation_id).await;
            tokio::time::sleep(typing_for).await;

            let delivered = session
                .mutate(|store| {
                    store.stop_typing(conversation_id);
                    store.receive_message(conversation_id, Some(text), None)
                })
                .await;

            match delivered {
                Ok(Some(message_id)) => info!("Reply {} arrived in conversation {}", message_id, conversation_id),
                Ok(None) => debug!("Reply target conversation {} no longer exists", conversation_id),
                Err(e) => warn!("Simulated reply for conversation {} rejected: {}", conversation_id, e),
            }
        })
        .await;
    }

    /// Abort a pending simulated reply and clear its typing indicator
    pub async fn cancel_reply(&self, conversation_id: ConversationId) -> bool {
        let cancelled = self.cancel(TaskKey::Reply(conversation_id)).await;
        if cancelled {
            self.stop_typing(conversation_id).await;
        }
        cancelled
    }
}
