// Patient/doctor messaging core: conversation store, session runtime and
// the helpers the app screens consume.
pub mod models;
pub mod store;  // Snapshot state and its update protocol
pub mod chat;   // Async session: acknowledgments, typing, presence
pub mod config;
pub mod datefmt;
pub mod seed;

// Re-export main types for convenience
pub use models::*;
pub use store::{Action, ChatState, ConversationStore, StoreError};
pub use chat::ChatSession;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_participant_builder() {
        let doctor = Participant::new("dr-1", "Dr. Sofia Marin", ParticipantRole::Doctor)
            .with_specialty("Endocrinology")
            .with_avatar("avatars/dr-1.png");

        assert_eq!(doctor.id, ParticipantId::from("dr-1"));
        assert_eq!(doctor.specialty.as_deref(), Some("Endocrinology"));
        assert_eq!(doctor.avatar.as_deref(), Some("avatars/dr-1.png"));
        assert!(!doctor.online);

        match doctor.role {
            ParticipantRole::Doctor => (),
            _ => panic!("Expected Doctor role"),
        }
    }

    #[test]
    fn test_delivery_status_serialization() {
        let json = serde_json::to_string(&DeliveryStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
        let status: DeliveryStatus = serde_json::from_str("\"sending\"").unwrap();
        assert_eq!(status, DeliveryStatus::Sending);
        assert!(serde_json::from_str::<DeliveryStatus>("\"failed\"").is_err());
    }

    #[test]
    fn test_scenario_from_seeded_clinic() -> Result<(), StoreError> {
        // C1 has three messages and two unread
        let mut store = ConversationStore::with_conversations(
            seed::demo_conversations(ParticipantRole::Patient)?,
            10,
        );
        let c1 = ConversationId(1);
        assert_eq!(store.snapshot().conversation(c1).unwrap().unread_count, 2);

        let snapshot = store.mark_read(c1);
        let conversation = snapshot.conversation(c1).unwrap();
        assert_eq!(conversation.unread_count, 0);
        assert_eq!(conversation.messages.len(), 3);

        let message_id = store.send_message(c1, Some("test".to_string()), None)?.unwrap();
        let snapshot = store.snapshot();
        let conversation = snapshot.conversation(c1).unwrap();
        assert_eq!(conversation.messages.len(), 4);
        let last = conversation.last_message().unwrap();
        assert_eq!(last.id, message_id);
        assert_eq!(last.text.as_deref(), Some("test"));
        assert_eq!(last.sender, Sender::Local);
        assert_eq!(last.status, DeliveryStatus::Sending);
        assert!(last.sent_at <= Utc::now());
        Ok(())
    }
}
