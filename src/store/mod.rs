// Conversation store
// Single source of truth for conversations and the cross-cutting chat state
// (active conversation, typing, presence, notifications).

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod action;

pub use action::Action;

use crate::config::ChatConfig;
use crate::models::{
    Attachment, Conversation, ConversationId, DeliveryStatus, Message, MessageId, Notification, Participant,
    ParticipantId, Sender,
};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

/// Errors raised by store operations.
///
/// Unknown conversation or message ids are not errors: the store treats them
/// as no-ops because UI intents may race with state changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Neither text nor attachment was supplied
    #[error("a message needs text or an attachment")]
    EmptyMessage,
}

/// Immutable snapshot of the whole chat state.
///
/// The active conversation is held as an id and resolved against the
/// conversation list, so the open thread can never disagree with its entry.
#[derive(Debug, Clone)]
pub struct ChatState {
    conversations: Vec<Arc<Conversation>>,
    active_conversation: Option<ConversationId>,
    typing: BTreeSet<ConversationId>,
    online_participants: BTreeSet<ParticipantId>,
    notifications: VecDeque<Notification>,
    notification_limit: usize,
}

impl Default for ChatState {
    fn default() -> Self {
        ChatState::new(DEFAULT_NOTIFICATION_LIMIT)
    }
}

impl ChatState {
    pub fn new(notification_limit: usize) -> Self {
        ChatState {
            conversations: Vec::new(),
            active_conversation: None,
            typing: BTreeSet::new(),
            online_participants: BTreeSet::new(),
            notifications: VecDeque::new(),
            notification_limit,
        }
    }

    /// Conversations, most recently created first
    pub fn conversations(&self) -> &[Arc<Conversation>] {
        &self.conversations
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id).map(|c| c.as_ref())
    }

    pub fn active_conversation_id(&self) -> Option<ConversationId> {
        self.active_conversation
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active_conversation.and_then(|id| self.conversation(id))
    }

    pub fn is_typing(&self, id: ConversationId) -> bool {
        self.typing.contains(&id)
    }

    /// Global "someone is typing" flag
    pub fn any_typing(&self) -> bool {
        !self.typing.is_empty()
    }

    pub fn online_participants(&self) -> &BTreeSet<ParticipantId> {
        &self.online_participants
    }

    pub fn is_online(&self, participant: &ParticipantId) -> bool {
        self.online_participants.contains(participant)
    }

    /// Pending notifications, oldest first
    pub fn notifications(&self) -> &VecDeque<Notification> {
        &self.notifications
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    fn position(&self, id: ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }
}

/// Owner of the current snapshot.
///
/// All mutations go through named operations which build an [`Action`] and
/// hand it to [`ConversationStore::dispatch`]. The store has no interior
/// mutability; callers that share it across tasks must serialise access.
#[derive(Debug)]
pub struct ConversationStore {
    state: Arc<ChatState>,
    next_conversation_id: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        ConversationStore::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_conversations(Vec::new(), DEFAULT_NOTIFICATION_LIMIT)
    }

    pub fn from_config(config: &ChatConfig, seed: Vec<Conversation>) -> Self {
        Self::with_conversations(seed, config.notification_limit)
    }

    /// Build a store from seed conversations, keeping their order. Seeded
    /// participants flagged online start in the online set.
    pub fn with_conversations(seed: Vec<Conversation>, notification_limit: usize) -> Self {
        let mut state = ChatState::new(notification_limit);
        let mut seen = HashSet::new();

        for conversation in seed {
            if !seen.insert(conversation.id) {
                warn!("Dropping seeded conversation with duplicate id {}", conversation.id);
                continue;
            }
            if conversation.participant.online {
                state.online_participants.insert(conversation.participant.id.clone());
            }
            state.conversations.push(Arc::new(conversation));
        }

        let next_conversation_id = state.conversations.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        debug!("Conversation store initialised with {} conversations", state.conversations.len());

        ConversationStore {
            state: Arc::new(state),
            next_conversation_id,
        }
    }

    pub fn snapshot(&self) -> Arc<ChatState> {
        Arc::clone(&self.state)
    }

    pub fn list_conversations(&self) -> &[Arc<Conversation>] {
        self.state.conversations()
    }

    /// Apply one action. A no-op action returns the previous snapshot itself.
    pub fn dispatch(&mut self, action: Action) -> Arc<ChatState> {
        let name = action.name();
        match self.state.reduce(action) {
            Some(next) => self.state = Arc::new(next),
            None => debug!("Action {} left the chat state unchanged", name),
        }
        self.snapshot()
    }

    pub fn set_active_conversation(&mut self, id: Option<ConversationId>) -> Arc<ChatState> {
        self.dispatch(Action::SetActiveConversation(id))
    }

    /// Create an empty conversation with `participant` at the top of the list
    pub fn add_conversation(&mut self, participant: Participant) -> ConversationId {
        let mut id = ConversationId(self.next_conversation_id);
        while self.state.conversation(id).is_some() {
            id = ConversationId(id.0 + 1);
        }
        self.next_conversation_id = id.0 + 1;

        info!("Starting conversation {} with {}", id, participant.name);
        self.dispatch(Action::AddConversation(Conversation::new(id, participant)));
        id
    }

    /// Append a message from the local user with status `Sending`.
    ///
    /// Returns `Ok(None)` when the conversation does not exist. Scheduling the
    /// acknowledgment is up to the caller.
    pub fn send_message(
        &mut self,
        conversation_id: ConversationId,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<Option<MessageId>, StoreError> {
        self.append(conversation_id, Sender::Local, text, attachment, DeliveryStatus::Sending)
    }

    /// Append a message from the counterpart. Unless the conversation is open
    /// this also raises its unread count and queues a notification.
    pub fn receive_message(
        &mut self,
        conversation_id: ConversationId,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<Option<MessageId>, StoreError> {
        let message_id = self.append(conversation_id, Sender::Counterpart, text, attachment, DeliveryStatus::Delivered)?;

        if message_id.is_some() && self.state.active_conversation_id() != Some(conversation_id) {
            let notification = self.state.conversation(conversation_id).and_then(|conversation| {
                conversation.last_message().map(|message| Notification {
                    id: Uuid::new_v4(),
                    conversation_id,
                    title: conversation.participant.name.clone(),
                    body: message.preview(),
                    created_at: message.sent_at,
                })
            });
            if let Some(notification) = notification {
                self.dispatch(Action::PushNotification(notification));
            }
        }

        Ok(message_id)
    }

    fn append(
        &mut self,
        conversation_id: ConversationId,
        sender: Sender,
        text: Option<String>,
        attachment: Option<Attachment>,
        status: DeliveryStatus,
    ) -> Result<Option<MessageId>, StoreError> {
        let text = text.filter(|t| !t.trim().is_empty());
        if text.is_none() && attachment.is_none() {
            return Err(StoreError::EmptyMessage);
        }

        let message_id = match self.state.conversation(conversation_id).map(|c| c.next_message_id()) {
            Some(Some(message_id)) => message_id,
            Some(None) => {
                warn!("Conversation {} has run out of message ids", conversation_id);
                return Ok(None);
            }
            None => {
                debug!("Dropping message for unknown conversation {}", conversation_id);
                return Ok(None);
            }
        };

        let message = Message {
            id: message_id,
            text,
            attachment,
            sender,
            sent_at: Utc::now(),
            status,
        };
        self.dispatch(Action::AppendMessage { conversation_id, message });
        Ok(Some(message_id))
    }

    pub fn mark_read(&mut self, conversation_id: ConversationId) -> Arc<ChatState> {
        self.dispatch(Action::MarkRead(conversation_id))
    }

    pub fn update_message_status(
        &mut self,
        conversation_id: ConversationId,
        message_id: MessageId,
        status: DeliveryStatus,
    ) -> Arc<ChatState> {
        let before = self.snapshot();
        let after = self.dispatch(Action::UpdateMessageStatus { conversation_id, message_id, status });
        if !Arc::ptr_eq(&before, &after) {
            info!("Message {} in conversation {} is now {}", message_id, conversation_id, status.as_str());
        }
        after
    }

    pub fn start_typing(&mut self, conversation_id: ConversationId) -> Arc<ChatState> {
        self.set_typing(conversation_id, true)
    }

    pub fn stop_typing(&mut self, conversation_id: ConversationId) -> Arc<ChatState> {
        self.set_typing(conversation_id, false)
    }

    pub fn set_typing(&mut self, conversation_id: ConversationId, typing: bool) -> Arc<ChatState> {
        self.dispatch(Action::SetTyping { conversation_id, typing })
    }

    pub fn set_participant_online(&mut self, participant_id: ParticipantId, online: bool) -> Arc<ChatState> {
        self.dispatch(Action::SetOnline { participant_id, online })
    }

    pub fn dismiss_notification(&mut self, id: Uuid) -> Arc<ChatState> {
        self.dispatch(Action::DismissNotification(id))
    }

    pub fn clear_notifications(&mut self) -> Arc<ChatState> {
        self.dispatch(Action::ClearNotifications)
    }
}
