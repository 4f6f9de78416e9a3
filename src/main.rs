#![deny(dead_code)] // DO NOT REMOVE THIS EVER
use anyhow::{anyhow, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

mod ui;
mod utils;

use clinic_chat::config;
use clinic_chat::models::{
    Attachment, AttachmentKind, ConversationId, MessageId, Participant, ParticipantId, ParticipantRole,
};
use clinic_chat::{seed, ChatSession, ChatState};

/// How long the counterpart "types" before a simulated reply lands
const REPLY_TYPING: Duration = Duration::from_millis(1500);

/// Command line arguments for clinic-chat
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "clinic-chat: patient/doctor messaging in the terminal.",
    long_about = "clinic-chat keeps an in-memory set of clinic conversations and lets you \
    send messages, watch their delivery status and simulate replies.\n\n\
    Settings are read from the config file and CLINIC_CHAT_* environment variables; \
    the options below take precedence."
)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON seed file with the initial conversations
    #[arg(long, value_name = "PATH")]
    seed: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Which side the local user is on (doctor or patient)
    #[arg(long, value_name = "ROLE")]
    role: Option<ParticipantRole>,

    #[arg(long, value_name = "MS")]
    ack_delay_ms: Option<u64>,
}

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Open(ConversationId),
    Close,
    Send(String),
    Attach { attachment: Attachment, caption: Option<String> },
    Receive(String),
    Reply(String),
    Read(Option<ConversationId>),
    Delivered(MessageId),
    Seen(MessageId),
    New(Participant),
    Typing(bool),
    Online(ParticipantId, bool),
    Notifications,
    Dismiss(usize),
    Clear,
    Help,
    Quit,
}

fn parse_conversation_id(arg: &str) -> Result<ConversationId> {
    arg.trim()
        .parse::<u64>()
        .map(ConversationId)
        .map_err(|_| anyhow!("Expected a conversation id, got '{}'", arg))
}

fn parse_message_id(arg: &str) -> Result<MessageId> {
    arg.trim()
        .parse::<u64>()
        .map(MessageId)
        .map_err(|_| anyhow!("Expected a message id, got '{}'", arg))
}

fn parse_switch(arg: &str) -> Result<bool> {
    match arg.trim() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(anyhow!("Expected on or off, got '{}'", other)),
    }
}

fn parse_attach(rest: &str) -> Result<Command> {
    let usage = || anyhow!("usage: attach <image|document|audio> <name> <size> <uri> [caption]");
    let mut parts = rest.splitn(5, char::is_whitespace);
    let kind = parts.next().filter(|s| !s.is_empty()).ok_or_else(usage)?;
    let name = parts.next().ok_or_else(usage)?;
    let size = parts.next().ok_or_else(usage)?;
    let uri = parts.next().ok_or_else(usage)?;
    let caption = parts.next().map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let attachment = Attachment {
        kind: kind.parse::<AttachmentKind>().map_err(|e| anyhow!(e))?,
        name: name.to_string(),
        size_bytes: size.parse().map_err(|_| anyhow!("Attachment size must be a number of bytes"))?,
        uri: uri.to_string(),
    };
    Ok(Command::Attach { attachment, caption })
}

fn parse_new(rest: &str) -> Result<Command> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let role_at = words
        .iter()
        .position(|w| w.parse::<ParticipantRole>().is_ok())
        .filter(|&i| i > 0)
        .ok_or_else(|| anyhow!("usage: new <name> <doctor|patient> [specialty]"))?;
    let role = words[role_at].parse::<ParticipantRole>().map_err(|e| anyhow!(e))?;

    let name = words[..role_at].join(" ");
    let short_id = uuid::Uuid::new_v4().simple().to_string();
    let mut participant = Participant::new(format!("{}-{}", role.as_str(), &short_id[..8]), name, role);
    let specialty = words[role_at + 1..].join(" ");
    if !specialty.is_empty() {
        participant = participant.with_specialty(specialty);
    }
    Ok(Command::New(participant))
}

fn parse_command(line: &str) -> Result<Command> {
    let (word, rest) = match line.trim().split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line.trim(), ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => Command::List,
        "open" => Command::Open(parse_conversation_id(rest)?),
        "close" => Command::Close,
        "send" => Command::Send(rest.to_string()),
        "attach" => parse_attach(rest)?,
        "receive" => Command::Receive(rest.to_string()),
        "reply" => Command::Reply(rest.to_string()),
        "read" if rest.is_empty() => Command::Read(None),
        "read" => Command::Read(Some(parse_conversation_id(rest)?)),
        "delivered" => Command::Delivered(parse_message_id(rest)?),
        "seen" => Command::Seen(parse_message_id(rest)?),
        "new" => parse_new(rest)?,
        "typing" => Command::Typing(parse_switch(rest)?),
        "online" => {
            let (participant, switch) = rest
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: online <participant> on|off"))?;
            Command::Online(ParticipantId(participant.trim().to_string()), parse_switch(switch)?)
        }
        "notifications" => Command::Notifications,
        "dismiss" => Command::Dismiss(rest.parse().map_err(|_| anyhow!("usage: dismiss <n>"))?),
        "clear" => Command::Clear,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(anyhow!("Unknown command '{}', try `help`", other)),
    };
    Ok(command)
}

async fn active_conversation(session: &ChatSession) -> Result<ConversationId> {
    session
        .snapshot()
        .await
        .active_conversation_id()
        .ok_or_else(|| anyhow!("Open a conversation first (`open <id>`)"))
}

fn report_sent(sent: Option<MessageId>) -> Result<()> {
    match sent {
        Some(id) => {
            debug!("Message {} handed to the session", id);
            Ok(())
        }
        None => Err(anyhow!("That conversation no longer exists")),
    }
}

/// Execute one command. Returns false when the user wants to leave.
async fn run_command(session: &ChatSession, command: Command) -> Result<bool> {
    match command {
        Command::List => println!("{}", ui::render_conversation_list(&*session.snapshot().await)),
        Command::Open(id) => {
            if session.snapshot().await.conversation(id).is_none() {
                return Err(anyhow!("No conversation {}", id));
            }
            session.set_active_conversation(Some(id)).await;
            session.mark_read(id).await;
        }
        Command::Close => {
            session.set_active_conversation(None).await;
        }
        Command::Send(text) => {
            let id = active_conversation(session).await?;
            report_sent(session.send_message(id, Some(text), None).await?)?;
        }
        Command::Attach { attachment, caption } => {
            let id = active_conversation(session).await?;
            report_sent(session.send_message(id, caption, Some(attachment)).await?)?;
        }
        Command::Receive(text) => {
            let id = active_conversation(session).await?;
            report_sent(session.receive_message(id, Some(text), None).await?)?;
        }
        Command::Reply(text) => {
            let id = active_conversation(session).await?;
            session.simulate_reply(id, text, REPLY_TYPING).await;
        }
        Command::Read(target) => {
            let id = match target {
                Some(id) => id,
                None => active_conversation(session).await?,
            };
            session.mark_read(id).await;
        }
        Command::Delivered(message_id) => {
            let id = active_conversation(session).await?;
            session.mark_delivered(id, message_id).await;
        }
        Command::Seen(message_id) => {
            let id = active_conversation(session).await?;
            session.mark_seen(id, message_id).await;
        }
        Command::New(participant) => {
            let name = participant.name.clone();
            let id = session.add_conversation(participant).await;
            println!("Started conversation {} with {}", id, name);
        }
        Command::Typing(on) => {
            let id = active_conversation(session).await?;
            if on {
                session.start_typing(id).await;
            } else {
                session.stop_typing(id).await;
            }
        }
        Command::Online(participant, online) => {
            session.set_participant_online(participant, online).await;
        }
        Command::Notifications => println!("{}", ui::render_notifications(&*session.snapshot().await)),
        Command::Dismiss(n) => {
            let notifications = session.notifications().await;
            let notification = n
                .checked_sub(1)
                .and_then(|i| notifications.get(i))
                .ok_or_else(|| anyhow!("No notification {}", n))?;
            session.dismiss_notification(notification.id).await;
        }
        Command::Clear => {
            session.clear_notifications().await;
        }
        Command::Help => println!("{}", ui::HELP),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

async fn render_snapshots(mut snapshot_rx: mpsc::Receiver<Arc<ChatState>>) {
    while let Some(snapshot) = snapshot_rx.recv().await {
        println!("{}", ui::render(&snapshot));
    }
    debug!("Snapshot channel closed, renderer stopping");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.config {
        config::set_config_path_override(path.clone());
    }
    let mut config = config::load_config()?;
    if let Some(role) = args.role {
        config.local_role = role;
    }
    if let Some(ms) = args.ack_delay_ms {
        config.ack_delay_ms = ms;
    }
    if let Some(seed) = args.seed {
        config.seed_file = Some(seed);
    }

    let level = utils::parse_level(args.log_level.as_deref().unwrap_or(&config.log_level))?;
    utils::setup_logging(args.log_file.as_deref(), level)?;
    info!("clinic-chat starting as {}", config.local_role.as_str());

    let conversations = match &config.seed_file {
        Some(path) => seed::load_seed_file(path, config.local_role)?,
        None => seed::demo_conversations(config.local_role)?,
    };

    let (session, snapshot_rx) = ChatSession::new(&config, conversations);
    let renderer = tokio::spawn(render_snapshots(snapshot_rx));

    println!("{}", ui::render(&*session.snapshot().await));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match run_command(&session, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Command '{}' failed: {}", line.trim(), e);
                println!("{}", e);
            }
        }
    }

    info!("Shutting down session");
    session.shutdown().await;
    renderer.abort();
    Ok(())
}
