// Plain-text rendering of chat snapshots for the terminal front end.

use chrono::{DateTime, Local};
use std::fmt::Write;
use textwrap::wrap;

use clinic_chat::datefmt::format_message_time;
use clinic_chat::models::{Conversation, DeliveryStatus, Message, Sender};
use clinic_chat::store::ChatState;

const BUBBLE_WIDTH: usize = 48;
const SCREEN_WIDTH: usize = 72;

pub const HELP: &str = "\
Commands:
  list                                   show conversations
  open <id> / close                      open or close a conversation
  send <text>                            send to the open conversation
  attach <image|document|audio> <name> <size> <uri> [caption]
  receive <text>                         deliver a message from the counterpart now
  reply <text>                           counterpart types, then replies
  read [id]                              mark a conversation read
  delivered <msg> / seen <msg>           receipt for one of your messages
  new <name> <doctor|patient> [specialty]
  typing on|off                          counterpart typing indicator
  online <participant> on|off
  notifications / dismiss <n> / clear
  help / quit";

fn status_mark(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Sending => "…",
        DeliveryStatus::Sent => "✓",
        DeliveryStatus::Delivered => "✓✓",
        DeliveryStatus::Read => "✓✓ read",
    }
}

fn local_time(message: &Message, now: &DateTime<Local>) -> String {
    format_message_time(&message.sent_at.with_timezone(&Local), now)
}

/// Whatever the user should see for this snapshot: the open thread if there
/// is one, the conversation list otherwise.
pub fn render(state: &ChatState) -> String {
    match state.active_conversation() {
        Some(conversation) => render_thread(state, conversation),
        None => render_conversation_list(state),
    }
}

pub fn render_conversation_list(state: &ChatState) -> String {
    let now = Local::now();
    let mut out = String::new();
    let _ = writeln!(out, "─── Conversations ({} unread) ───", state.total_unread());

    if state.conversations().is_empty() {
        let _ = writeln!(out, "  (no conversations yet, start one with `new`)");
    }

    for conversation in state.conversations() {
        let participant = &conversation.participant;
        let presence = if state.is_online(&participant.id) { "●" } else { "○" };
        let specialty = participant
            .specialty
            .as_deref()
            .map(|s| format!(" · {}", s))
            .unwrap_or_default();
        let unread = if conversation.unread_count > 0 {
            format!(" [{}]", conversation.unread_count)
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{:>3} {} {}{}{}",
            conversation.id.0, presence, participant.name, specialty, unread
        );

        let preview = match conversation.last_message() {
            Some(message) => format!("{}  {}", local_time(message, &now), message.preview()),
            None => "no messages".to_string(),
        };
        let preview = if state.is_typing(conversation.id) { "typing…".to_string() } else { preview };
        let line = wrap(&preview, SCREEN_WIDTH - 6).into_iter().next().unwrap_or_default();
        let _ = writeln!(out, "      {}", line);
    }
    out
}

pub fn render_thread(state: &ChatState, conversation: &Conversation) -> String {
    let now = Local::now();
    let mut out = String::new();
    let participant = &conversation.participant;
    let presence = if state.is_online(&participant.id) { "online" } else { "offline" };
    let _ = writeln!(out, "─── {} ({}) ───", participant.name, presence);

    for message in &conversation.messages {
        let mut body = message.text.clone().unwrap_or_default();
        if let Some(attachment) = &message.attachment {
            if !body.is_empty() {
                body.push('\n');
            }
            let _ = write!(body, "📎 {} ({} KB)", attachment.name, (attachment.size_bytes + 1023) / 1024);
        }

        let lines = wrap(&body, BUBBLE_WIDTH);
        match message.sender {
            Sender::Local => {
                for line in lines {
                    let _ = writeln!(out, "{:>width$}", line, width = SCREEN_WIDTH);
                }
                let footer = format!("{} {}", local_time(message, &now), status_mark(message.status));
                let _ = writeln!(out, "{:>width$}", footer, width = SCREEN_WIDTH);
            }
            Sender::Counterpart => {
                for line in lines {
                    let _ = writeln!(out, "{}", line);
                }
                let _ = writeln!(out, "{}", local_time(message, &now));
            }
        }
    }

    if state.is_typing(conversation.id) {
        let _ = writeln!(out, "{} is typing…", participant.name);
    }
    out
}

pub fn render_notifications(state: &ChatState) -> String {
    let mut out = String::new();
    if state.notifications().is_empty() {
        let _ = writeln!(out, "No notifications");
    }
    for (index, notification) in state.notifications().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} (conversation {}): {}",
            index + 1,
            notification.title,
            notification.conversation_id,
            notification.body
        );
    }
    out
}
