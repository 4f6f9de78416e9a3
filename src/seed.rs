// Seed conversations: the built-in clinic demo set and JSON seed files.
// Seed messages name the role that wrote them; the session's local role
// decides which of them are ours.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::{
    Attachment, AttachmentKind, Conversation, ConversationId, DeliveryStatus, Message, MessageId, Participant,
    ParticipantRole, Sender,
};
use crate::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFile {
    pub conversations: Vec<SeedConversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConversation {
    pub id: u64,
    pub participant: Participant,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<SeedMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedMessage {
    pub from: ParticipantRole,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl SeedConversation {
    /// Convert to a store conversation. Message ids are assigned 1..n in file
    /// order and the last-message cache is derived from the final message.
    pub fn into_conversation(self, local_role: ParticipantRole) -> Result<Conversation, StoreError> {
        let mut conversation = Conversation::new(ConversationId(self.id), self.participant);

        for (index, seed) in self.messages.into_iter().enumerate() {
            let text = seed.text.filter(|t| !t.trim().is_empty());
            if text.is_none() && seed.attachment.is_none() {
                return Err(StoreError::EmptyMessage);
            }
            conversation.push_message(Message {
                id: MessageId(index as u64 + 1),
                text,
                attachment: seed.attachment,
                sender: Sender::from_role(seed.from, local_role),
                sent_at: seed.sent_at,
                status: seed.status,
            });
        }

        conversation.unread_count = self.unread_count;
        Ok(conversation)
    }
}

pub fn load_seed_file(path: &Path, local_role: ParticipantRole) -> Result<Vec<Conversation>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read seed file {}: {}", path.display(), e))?;
    let seed: SeedFile = serde_json::from_str(&contents)
        .map_err(|e| anyhow!("Invalid seed file {}: {}", path.display(), e))?;

    let conversations = seed
        .conversations
        .into_iter()
        .map(|c| {
            let id = c.id;
            c.into_conversation(local_role)
                .map_err(|e| anyhow!("Seed conversation {}: {}", id, e))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} seed conversations from {}", conversations.len(), path.display());
    Ok(conversations)
}

/// Mock clinic conversations used when no seed file is configured.
///
/// Counterparts are doctors when the local user is a patient and patients
/// otherwise. The first conversation has three messages and two unread.
pub fn demo_conversations(local_role: ParticipantRole) -> Result<Vec<Conversation>, StoreError> {
    let now = Utc::now();
    let me = local_role;
    let them = local_role.counterpart();

    let msg = |from, text: &str, minutes_ago: i64, status| SeedMessage {
        from,
        text: Some(text.to_string()),
        attachment: None,
        sent_at: now - Duration::minutes(minutes_ago),
        status,
    };

    let people = match them {
        ParticipantRole::Doctor => [
            Participant::new("dr-gonzalez", "Dr. María González", them).with_specialty("Cardiology"),
            Participant::new("dr-carter", "Dr. James Carter", them).with_specialty("Dermatology"),
            Participant::new("dr-rahman", "Dr. Aisha Rahman", them).with_specialty("Pediatrics"),
        ],
        ParticipantRole::Patient => [
            Participant::new("pt-silva", "Lucas Silva", them),
            Participant::new("pt-nakamura", "Emi Nakamura", them),
            Participant::new("pt-okafor", "Chidi Okafor", them),
        ],
    };
    let [first, second, third] = people;

    let seeds = vec![
        SeedConversation {
            id: 1,
            participant: Participant { online: true, ..first },
            unread_count: 2,
            messages: vec![
                msg(me, "Hello, I have been feeling dizzy since Monday.", 95, DeliveryStatus::Read),
                msg(them, "Thanks for reaching out. Any chest pain?", 40, DeliveryStatus::Delivered),
                msg(them, "Please book a check-up for this week.", 38, DeliveryStatus::Delivered),
            ],
        },
        SeedConversation {
            id: 2,
            participant: second,
            unread_count: 0,
            messages: vec![
                msg(them, "Apply the cream twice a day.", 60 * 26, DeliveryStatus::Read),
                SeedMessage {
                    from: me,
                    text: None,
                    attachment: Some(Attachment {
                        kind: AttachmentKind::Image,
                        name: "rash-progress.jpg".to_string(),
                        size_bytes: 734_002,
                        uri: "file:///photos/rash-progress.jpg".to_string(),
                    }),
                    sent_at: now - Duration::minutes(60 * 25),
                    status: DeliveryStatus::Read,
                },
            ],
        },
        SeedConversation {
            id: 3,
            participant: third,
            unread_count: 0,
            messages: Vec::new(),
        },
    ];

    seeds
        .into_iter()
        .map(|seed| seed.into_conversation(local_role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_demo_set_matches_local_role() -> Result<()> {
        let conversations = demo_conversations(ParticipantRole::Patient)?;
        assert_eq!(conversations.len(), 3);

        let first = &conversations[0];
        assert_eq!(first.messages.len(), 3);
        assert_eq!(first.unread_count, 2);
        assert_eq!(first.participant.role, ParticipantRole::Doctor);
        assert_eq!(first.messages[0].sender, Sender::Local);
        assert_eq!(first.messages[1].sender, Sender::Counterpart);
        assert_eq!(first.last_message_text.as_deref(), Some("Please book a check-up for this week."));

        let as_doctor = demo_conversations(ParticipantRole::Doctor)?;
        assert_eq!(as_doctor.len(), 3);
        assert_eq!(as_doctor[0].participant.role, ParticipantRole::Patient);
        assert_eq!(as_doctor[0].messages[0].sender, Sender::Local);
        Ok(())
    }

    #[test]
    fn test_invalid_seed_conversation_is_an_error() {
        let seeds = vec![
            SeedConversation {
                id: 1,
                participant: Participant::new("pt-a", "Ana", ParticipantRole::Patient),
                unread_count: 0,
                messages: Vec::new(),
            },
            SeedConversation {
                id: 2,
                participant: Participant::new("pt-b", "Bruno", ParticipantRole::Patient),
                unread_count: 0,
                messages: vec![SeedMessage {
                    from: ParticipantRole::Patient,
                    text: Some("   ".to_string()),
                    attachment: None,
                    sent_at: Utc::now(),
                    status: DeliveryStatus::Sent,
                }],
            },
        ];

        let result: std::result::Result<Vec<Conversation>, StoreError> = seeds
            .into_iter()
            .map(|seed| seed.into_conversation(ParticipantRole::Doctor))
            .collect();
        assert_eq!(result.err(), Some(StoreError::EmptyMessage));
    }

    #[test]
    fn test_attachment_only_seed_message() -> Result<()> {
        let conversations = demo_conversations(ParticipantRole::Patient)?;
        let second = &conversations[1];
        assert_eq!(second.last_message_text, None);
        assert!(second.last_message().and_then(|m| m.attachment.as_ref()).is_some());
        Ok(())
    }

    #[test]
    fn test_load_seed_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.json");
        fs::write(
            &path,
            r#"{
                "conversations": [{
                    "id": 4,
                    "participant": { "id": "dr-lee", "name": "Dr. Min Lee", "role": "doctor", "specialty": "Neurology" },
                    "unread_count": 1,
                    "messages": [
                        { "from": "doctor", "text": "How is the headache?", "sent_at": "2026-10-15T09:00:00Z", "status": "delivered" },
                        { "from": "patient", "text": "Better, thanks", "sent_at": "2026-10-15T09:05:00Z", "status": "read" }
                    ]
                }]
            }"#,
        )?;

        let conversations = load_seed_file(&path, ParticipantRole::Doctor)?;
        assert_eq!(conversations.len(), 1);
        let conversation = &conversations[0];
        assert_eq!(conversation.id, ConversationId(4));
        assert_eq!(conversation.messages[0].id, MessageId(1));
        assert_eq!(conversation.messages[0].sender, Sender::Local);
        assert_eq!(conversation.messages[1].sender, Sender::Counterpart);
        assert_eq!(conversation.messages[1].status, DeliveryStatus::Read);
        assert_eq!(conversation.last_message_at, Some(conversation.messages[1].sent_at));
        Ok(())
    }

    #[test]
    fn test_seed_with_empty_message_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("seed.json");
        fs::write(
            &path,
            r#"{ "conversations": [{
                "id": 1,
                "participant": { "id": "x", "name": "X", "role": "patient" },
                "messages": [{ "from": "patient", "sent_at": "2026-10-15T09:00:00Z", "status": "sent" }]
            }] }"#,
        )?;
        assert!(load_seed_file(&path, ParticipantRole::Doctor).is_err());
        Ok(())
    }
}
