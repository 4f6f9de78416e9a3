// Outgoing messages and their delivery lifecycle.
// Sending appends the message as `Sending` and schedules an acknowledgment
// keyed by message id; receipts advance the status further.

use log::{debug, info};
use std::sync::Arc;

use crate::models::{Attachment, ConversationId, DeliveryStatus, MessageId};
use crate::store::{ChatState, StoreError};
use super::{ChatSession, TaskKey};

impl ChatSession {
    /// Append a local message and schedule its acknowledgment. Returns
    /// immediately; `Ok(None)` means the conversation does not exist.
    pub async fn send_message(
        &self,
        conversation_id: ConversationId,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<Option<MessageId>, StoreError> {
        let sent = self
            .mutate(|store| store.send_message(conversation_id, text, attachment))
            .await?;

        if let Some(message_id) = sent {
            info!("Queued message {} in conversation {}", message_id, conversation_id);
            self.schedule_acknowledgment(conversation_id, message_id).await;
        }
        Ok(sent)
    }

    async fn schedule_acknowledgment(&self, conversation_id: ConversationId, message_id: MessageId) {
        let session = self.clone();
        let delay = self.ack_delay();

        self.schedule(TaskKey::Acknowledgment(conversation_id, message_id), async move {
            tokio::time::sleep(delay).await;
            debug!("Acknowledging message {} in conversation {}", message_id, conversation_id);
            // Looked up by id: other messages may have been appended meanwhile.
            session
                .update_message_status(conversation_id, message_id, DeliveryStatus::Sent)
                .await;
        })
        .await;
    }

    /// Drop a pending acknowledgment; the message stays `Sending`
    pub async fn cancel_acknowledgment(&self, conversation_id: ConversationId, message_id: MessageId) -> bool {
        let cancelled = self.cancel(TaskKey::Acknowledgment(conversation_id, message_id)).await;
        if cancelled {
            info!("Cancelled acknowledgment of message {} in conversation {}", message_id, conversation_id);
        }
        cancelled
    }

    pub async fn pending_acknowledgments(&self) -> Vec<(ConversationId, MessageId)> {
        self.pending_tasks()
            .await
            .into_iter()
            .filter_map(|key| match key {
                TaskKey::Acknowledgment(conversation_id, message_id) => Some((conversation_id, message_id)),
                TaskKey::Reply(_) => None,
            })
            .collect()
    }

    /// Delivery receipt from the counterpart's device
    pub async fn mark_delivered(&self, conversation_id: ConversationId, message_id: MessageId) -> Arc<ChatState> {
        self.update_message_status(conversation_id, message_id, DeliveryStatus::Delivered).await
    }

    /// Read receipt from the counterpart
    pub async fn mark_seen(&self, conversation_id: ConversationId, message_id: MessageId) -> Arc<ChatState> {
        self.update_message_status(conversation_id, message_id, DeliveryStatus::Read).await
    }
}
