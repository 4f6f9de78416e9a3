// Common test utilities for integration tests
// This module contains shared code for all integration tests

use std::sync::{Arc, Once};
use std::time::Duration;

use log::LevelFilter;
use tokio::sync::mpsc;

use clinic_chat::{
    config::ChatConfig,
    models::{Conversation, Participant, ParticipantRole},
    seed, ChatSession, ChatState, ConversationStore,
};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

pub const ACK_DELAY: Duration = Duration::from_millis(200);

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

pub fn test_config() -> ChatConfig {
    ChatConfig {
        ack_delay_ms: ACK_DELAY.as_millis() as u64,
        notification_limit: 10,
        ..ChatConfig::default()
    }
}

pub fn doctor(id: &str, name: &str, specialty: &str) -> Participant {
    Participant::new(id, name, ParticipantRole::Doctor).with_specialty(specialty)
}

/// The demo clinic set as seen by a patient
pub fn demo() -> Vec<Conversation> {
    seed::demo_conversations(ParticipantRole::Patient).unwrap()
}

/// Store over the demo clinic set: conversation 1 has 3 messages, 2 unread
pub fn seeded_store() -> ConversationStore {
    ConversationStore::from_config(&test_config(), demo())
}

pub fn seeded_session() -> (ChatSession, mpsc::Receiver<Arc<ChatState>>) {
    ChatSession::new(&test_config(), demo())
}

pub fn empty_session() -> (ChatSession, mpsc::Receiver<Arc<ChatState>>) {
    ChatSession::new(&test_config(), Vec::new())
}

/// Drain every snapshot currently buffered on the channel
pub fn drain(rx: &mut mpsc::Receiver<Arc<ChatState>>) -> Vec<Arc<ChatState>> {
    let mut snapshots = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        snapshots.push(snapshot);
    }
    snapshots
}
