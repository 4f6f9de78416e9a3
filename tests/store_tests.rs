// Conversation store tests
// These tests exercise the synchronous store: message ordering, unread
// counters, the active conversation view and status transitions.

mod common;
use common::{doctor, seeded_store, setup_logging};

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use clinic_chat::{
    models::{ConversationId, DeliveryStatus, MessageId, ParticipantId, Sender},
    store::{Action, ConversationStore},
};

const C1: ConversationId = ConversationId(1);
const C2: ConversationId = ConversationId(2);

#[test]
fn test_sends_append_in_call_order() -> Result<()> {
    setup_logging();
    let mut store = seeded_store();
    let initial = store.snapshot().conversation(C1).map(|c| c.messages.len()).unwrap_or(0);

    let texts: Vec<String> = (0..7).map(|i| format!("message {}", i)).collect();
    for text in &texts {
        store.send_message(C1, Some(text.clone()), None)?;
    }

    let snapshot = store.snapshot();
    let conversation = snapshot.conversation(C1).unwrap();
    assert_eq!(conversation.messages.len(), initial + texts.len());

    let appended: Vec<_> = conversation.messages[initial..]
        .iter()
        .map(|m| m.text.clone().unwrap_or_default())
        .collect();
    assert_eq!(appended, texts);

    // Ids keep increasing
    let ids: Vec<_> = conversation.messages.iter().map(|m| m.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}

#[test]
fn test_last_message_cache_tracks_appends() -> Result<()> {
    let mut store = seeded_store();
    store.send_message(C2, Some("Photo attached above".to_string()), None)?;
    store.receive_message(C2, Some("Looks much better".to_string()), None)?;

    let snapshot = store.snapshot();
    let conversation = snapshot.conversation(C2).unwrap();
    let last = conversation.last_message().unwrap();
    assert_eq!(conversation.last_message_text, last.text);
    assert_eq!(conversation.last_message_at, Some(last.sent_at));
    assert_eq!(last.sender, Sender::Counterpart);
    Ok(())
}

#[test]
fn test_mark_read_only_touches_its_conversation() -> Result<()> {
    let mut store = seeded_store();
    store.receive_message(C2, Some("New prescription is ready".to_string()), None)?;

    let before = store.snapshot();
    let others: Vec<_> = before
        .conversations()
        .iter()
        .filter(|c| c.id != C1)
        .map(|c| (c.id, c.unread_count))
        .collect();

    let after = store.mark_read(C1);
    assert_eq!(after.conversation(C1).unwrap().unread_count, 0);
    for (id, unread) in others {
        assert_eq!(after.conversation(id).unwrap().unread_count, unread);
    }
    assert_eq!(after.conversation(C2).unwrap().unread_count, 1);
    Ok(())
}

#[test]
fn test_mark_read_is_idempotent() {
    let mut store = seeded_store();
    let first = store.mark_read(C1);
    let second = store.mark_read(C1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.conversation(C1).unwrap().unread_count, 0);
}

#[test]
fn test_mark_read_keeps_message_statuses() {
    let mut store = seeded_store();
    let before: Vec<_> = store.snapshot().conversation(C1).unwrap().messages.iter().map(|m| m.status).collect();
    let after = store.mark_read(C1);
    let statuses: Vec<_> = after.conversation(C1).unwrap().messages.iter().map(|m| m.status).collect();
    assert_eq!(before, statuses);
}

#[test]
fn test_active_view_follows_the_list_entry() -> Result<()> {
    setup_logging();
    let mut store = seeded_store();
    store.set_active_conversation(Some(C1));

    let message_id = store.send_message(C1, Some("Is Thursday fine?".to_string()), None)?.unwrap();
    store.receive_message(C1, Some("Thursday at 10".to_string()), None)?;
    store.update_message_status(C1, message_id, DeliveryStatus::Delivered);

    let snapshot = store.snapshot();
    let active = snapshot.active_conversation().unwrap();
    let listed = snapshot.conversation(C1).unwrap();
    assert_eq!(active.messages, listed.messages);
    assert_eq!(active.messages.len(), 5);
    assert_eq!(active.message(message_id).unwrap().status, DeliveryStatus::Delivered);
    info!("Active view has {} messages", active.messages.len());
    Ok(())
}

#[test]
fn test_switching_active_conversation() {
    let mut store = seeded_store();
    store.set_active_conversation(Some(C1));
    store.set_active_conversation(Some(C2));
    assert_eq!(store.snapshot().active_conversation().unwrap().id, C2);

    // Unknown ids leave the selection alone
    let before = store.snapshot();
    let after = store.set_active_conversation(Some(ConversationId(404)));
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.active_conversation_id(), Some(C2));

    assert!(store.set_active_conversation(None).active_conversation().is_none());
}

#[test]
fn test_add_conversation_on_empty_store() {
    let mut store = ConversationStore::new();
    let id = store.add_conversation(doctor("dr-x", "Dr. Xavier Ito", "Oncology"));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.conversations().len(), 1);
    let conversation = snapshot.conversation(id).unwrap();
    assert_eq!(conversation.unread_count, 0);
    assert!(conversation.messages.is_empty());
    assert_eq!(conversation.last_message_text, None);
}

#[test]
fn test_rapid_add_conversation_never_reuses_ids() {
    let mut store = seeded_store();
    let ids: Vec<_> = (0..50)
        .map(|i| store.add_conversation(doctor(&format!("dr-{}", i), "Dr. Many", "General")))
        .collect();

    let all: HashSet<_> = store.list_conversations().iter().map(|c| c.id).collect();
    assert_eq!(all.len(), store.list_conversations().len());
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 50);
    assert_eq!(store.list_conversations()[0].id, *ids.last().unwrap());
}

#[test]
fn test_status_lookup_is_by_id_not_position() -> Result<()> {
    let mut store = seeded_store();
    let first = store.send_message(C1, Some("first".to_string()), None)?.unwrap();
    let second = store.send_message(C1, Some("second".to_string()), None)?.unwrap();
    store.receive_message(C1, Some("reply".to_string()), None)?;

    store.update_message_status(C1, first, DeliveryStatus::Sent);

    let snapshot = store.snapshot();
    let conversation = snapshot.conversation(C1).unwrap();
    assert_eq!(conversation.message(first).unwrap().status, DeliveryStatus::Sent);
    assert_eq!(conversation.message(second).unwrap().status, DeliveryStatus::Sending);
    assert_eq!(conversation.last_message().unwrap().status, DeliveryStatus::Delivered);
    Ok(())
}

#[test]
fn test_status_may_skip_forward() -> Result<()> {
    let mut store = seeded_store();
    let id = store.send_message(C1, Some("skip".to_string()), None)?.unwrap();
    let snapshot = store.update_message_status(C1, id, DeliveryStatus::Read);
    assert_eq!(snapshot.conversation(C1).unwrap().message(id).unwrap().status, DeliveryStatus::Read);
    Ok(())
}

#[test]
fn test_unknown_message_id_is_a_no_op() {
    let mut store = seeded_store();
    let before = store.snapshot();
    let after = store.update_message_status(C1, MessageId(99), DeliveryStatus::Read);
    assert!(Arc::ptr_eq(&before, &after));
    let after = store.update_message_status(ConversationId(99), MessageId(1), DeliveryStatus::Read);
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_replayed_message_is_ignored() {
    let mut store = seeded_store();
    let snapshot = store.snapshot();
    let replay = snapshot.conversation(C1).unwrap().messages[0].clone();

    let after = store.dispatch(Action::AppendMessage { conversation_id: C1, message: replay });
    assert!(Arc::ptr_eq(&snapshot, &after));
}

#[test]
fn test_presence_and_notifications() -> Result<()> {
    let mut store = seeded_store();
    let carter = ParticipantId::from("dr-carter");

    // Dr. González is seeded online
    assert!(store.snapshot().is_online(&ParticipantId::from("dr-gonzalez")));
    assert!(!store.snapshot().is_online(&carter));

    store.set_participant_online(carter.clone(), true);
    assert!(store.snapshot().is_online(&carter));
    store.set_participant_online(carter.clone(), false);
    assert!(!store.snapshot().is_online(&carter));

    store.receive_message(C1, Some("one".to_string()), None)?;
    store.receive_message(C2, Some("two".to_string()), None)?;
    let first = store.snapshot().notifications()[0].id;
    let snapshot = store.dismiss_notification(first);
    assert_eq!(snapshot.notifications().len(), 1);
    assert_eq!(snapshot.notifications()[0].body, "two");

    assert!(store.clear_notifications().notifications().is_empty());
    Ok(())
}
