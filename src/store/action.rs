// Update protocol of the conversation store.
// Every mutation is one Action; ChatState::reduce applies it without touching
// the previous snapshot.

use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Conversation, ConversationId, DeliveryStatus, Message, MessageId, Notification, ParticipantId, Sender,
};
use super::ChatState;

#[derive(Debug, Clone)]
pub enum Action {
    SetActiveConversation(Option<ConversationId>),
    AddConversation(Conversation),
    AppendMessage {
        conversation_id: ConversationId,
        message: Message,
    },
    UpdateMessageStatus {
        conversation_id: ConversationId,
        message_id: MessageId,
        status: DeliveryStatus,
    },
    MarkRead(ConversationId),
    SetTyping {
        conversation_id: ConversationId,
        typing: bool,
    },
    SetOnline {
        participant_id: ParticipantId,
        online: bool,
    },
    PushNotification(Notification),
    DismissNotification(Uuid),
    ClearNotifications,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetActiveConversation(_) => "set_active_conversation",
            Action::AddConversation(_) => "add_conversation",
            Action::AppendMessage { .. } => "append_message",
            Action::UpdateMessageStatus { .. } => "update_message_status",
            Action::MarkRead(_) => "mark_read",
            Action::SetTyping { .. } => "set_typing",
            Action::SetOnline { .. } => "set_online",
            Action::PushNotification(_) => "push_notification",
            Action::DismissNotification(_) => "dismiss_notification",
            Action::ClearNotifications => "clear_notifications",
        }
    }
}

impl ChatState {
    /// Apply an action and return the next snapshot, or `None` when the action
    /// does not change anything (unknown ids, repeated operations, backward
    /// status transitions).
    ///
    /// Only the conversation an action touches is copied; every other entry is
    /// shared with `self` through its `Arc`.
    pub fn reduce(&self, action: Action) -> Option<ChatState> {
        match action {
            Action::SetActiveConversation(target) => {
                if target == self.active_conversation {
                    return None;
                }
                if let Some(id) = target {
                    self.position(id)?;
                }
                let mut next = self.clone();
                next.active_conversation = target;
                Some(next)
            }

            Action::AddConversation(conversation) => {
                if self.position(conversation.id).is_some() {
                    debug!("Conversation {} already exists, not adding it twice", conversation.id);
                    return None;
                }
                let mut next = self.clone();
                next.conversations.insert(0, Arc::new(conversation));
                Some(next)
            }

            Action::AppendMessage { conversation_id, message } => {
                let index = self.position(conversation_id)?;
                let current = &self.conversations[index];
                // Message ids are a per-conversation logical clock, so anything
                // not newer than the last message is a replay.
                if let Some(last) = current.last_message() {
                    if message.id <= last.id {
                        debug!(
                            "Ignoring message {} for conversation {}: last id is {}",
                            message.id, conversation_id, last.id
                        );
                        return None;
                    }
                }

                let counts_as_unread = message.sender == Sender::Counterpart
                    && self.active_conversation != Some(conversation_id);

                let mut next = self.clone();
                let conversation = Arc::make_mut(&mut next.conversations[index]);
                conversation.push_message(message);
                if counts_as_unread {
                    conversation.unread_count = conversation.unread_count.saturating_add(1);
                }
                Some(next)
            }

            Action::UpdateMessageStatus { conversation_id, message_id, status } => {
                let index = self.position(conversation_id)?;
                let message_index = self.conversations[index]
                    .messages
                    .iter()
                    .position(|m| m.id == message_id)?;
                let current = self.conversations[index].messages[message_index].status;
                if !current.can_advance_to(status) {
                    debug!(
                        "Refusing status change {:?} -> {:?} for message {} in conversation {}",
                        current, status, message_id, conversation_id
                    );
                    return None;
                }

                let mut next = self.clone();
                let conversation = Arc::make_mut(&mut next.conversations[index]);
                conversation.messages[message_index].status = status;
                Some(next)
            }

            Action::MarkRead(conversation_id) => {
                let index = self.position(conversation_id)?;
                if self.conversations[index].unread_count == 0 {
                    return None;
                }
                let mut next = self.clone();
                Arc::make_mut(&mut next.conversations[index]).unread_count = 0;
                Some(next)
            }

            Action::SetTyping { conversation_id, typing } => {
                self.position(conversation_id)?;
                if self.typing.contains(&conversation_id) == typing {
                    return None;
                }
                let mut next = self.clone();
                if typing {
                    next.typing.insert(conversation_id);
                } else {
                    next.typing.remove(&conversation_id);
                }
                Some(next)
            }

            Action::SetOnline { participant_id, online } => {
                if self.online_participants.contains(&participant_id) == online {
                    return None;
                }
                let mut next = self.clone();
                if online {
                    next.online_participants.insert(participant_id);
                } else {
                    next.online_participants.remove(&participant_id);
                }
                Some(next)
            }

            Action::PushNotification(notification) => {
                self.position(notification.conversation_id)?;
                if self.notification_limit == 0 {
                    return None;
                }
                let mut next = self.clone();
                next.notifications.push_back(notification);
                while next.notifications.len() > next.notification_limit {
                    next.notifications.pop_front();
                }
                Some(next)
            }

            Action::DismissNotification(id) => {
                let index = self.notifications.iter().position(|n| n.id == id)?;
                let mut next = self.clone();
                next.notifications.remove(index);
                Some(next)
            }

            Action::ClearNotifications => {
                if self.notifications.is_empty() {
                    return None;
                }
                let mut next = self.clone();
                next.notifications.clear();
                Some(next)
            }
        }
    }
}
