use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a conversation, stable for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub u64);

/// Identifier of a message, unique only within its conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Doctor,
    Patient,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Doctor => "doctor",
            ParticipantRole::Patient => "patient",
        }
    }

    /// The role on the other side of a patient/doctor conversation
    pub fn counterpart(&self) -> ParticipantRole {
        match self {
            ParticipantRole::Doctor => ParticipantRole::Patient,
            ParticipantRole::Patient => ParticipantRole::Doctor,
        }
    }
}

impl std::str::FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(ParticipantRole::Doctor),
            "patient" => Ok(ParticipantRole::Patient),
            other => Err(format!("unknown participant role '{}'", other)),
        }
    }
}

/// Profile summary of the other party in a conversation.
///
/// This is a snapshot taken when the conversation is created, not a live
/// reference into the directory. Live presence lives in the store's online set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: ParticipantRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub online: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: ParticipantRole) -> Self {
        Participant {
            id: ParticipantId(id.into()),
            name: name.into(),
            role,
            specialty: None,
            avatar: None,
            online: false,
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Which side of the conversation wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    Local,
    Counterpart,
}

impl Sender {
    /// Map the role that wrote a message onto the two-party tag, given the
    /// role the local user plays in this session.
    pub fn from_role(author: ParticipantRole, local_role: ParticipantRole) -> Self {
        if author == local_role {
            Sender::Local
        } else {
            Sender::Counterpart
        }
    }
}

/// Delivery lifecycle of a message. Ordering follows the lifecycle, so a
/// transition is valid only when it moves to a strictly greater value.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sending = 1,   // Handed to the store, not yet acknowledged
    Sent = 2,      // Acknowledged by the (simulated) server
    Delivered = 3, // Reached the counterpart's device
    Read = 4,      // Opened by the counterpart
}

impl DeliveryStatus {
    pub fn can_advance_to(self, next: DeliveryStatus) -> bool {
        next > self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
    Audio,
}

impl std::str::FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(AttachmentKind::Image),
            "document" | "doc" => Ok(AttachmentKind::Document),
            "audio" => Ok(AttachmentKind::Audio),
            other => Err(format!("unknown attachment kind '{}'", other)),
        }
    }
}

/// Descriptor handed over by the file picker. The store never reads the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub name: String,
    pub size_bytes: u64,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub text: Option<String>,
    pub attachment: Option<Attachment>,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl Message {
    /// Short text suitable for list previews and notifications
    pub fn preview(&self) -> String {
        match (&self.text, &self.attachment) {
            (Some(text), _) => text.clone(),
            (None, Some(attachment)) => format!("[{:?}] {}", attachment.kind, attachment.name),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub participant: Participant,
    pub last_message_text: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: u32,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: ConversationId, participant: Participant) -> Self {
        Conversation {
            id,
            participant,
            last_message_text: None,
            last_message_at: None,
            unread_count: 0,
            messages: Vec::new(),
        }
    }

    /// Next id of the per-conversation logical clock, `None` once the id
    /// space is used up
    pub fn next_message_id(&self) -> Option<MessageId> {
        match self.messages.last() {
            Some(last) => last.id.0.checked_add(1).map(MessageId),
            None => Some(MessageId(1)),
        }
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Append and refresh the denormalized last-message fields
    pub(crate) fn push_message(&mut self, message: Message) {
        self.last_message_text = message.text.clone();
        self.last_message_at = Some(message.sent_at);
        self.messages.push(message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
