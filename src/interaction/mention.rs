//! This module handles messages that @mention the bot.

use tracing::{Instrument, debug, error, info, instrument};

use crate::{base::types::Void, service::chat::ChatClient};

/// The reply sent whenever the bot is mentioned.
pub const MENTION_REPLY: &str = "Hello! You mentioned me!";

/// A chat message, normalized away from any particular chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub channel_id: String,
    /// Timestamp (ID) of the message itself.
    pub ts: String,
    /// Timestamp of the thread root, if the message was posted in a thread.
    pub thread_ts: Option<String>,
    pub sender_id: Option<String>,
    pub text: String,
    /// User IDs mentioned in `text`, in order of appearance, without duplicates.
    pub mentions: Vec<String>,
}

impl InboundMessage {
    pub fn new(channel_id: String, ts: String, thread_ts: Option<String>, sender_id: Option<String>, text: String) -> Self {
        let mentions = parse_mentions(&text);

        Self {
            channel_id,
            ts,
            thread_ts,
            sender_id,
            text,
            mentions,
        }
    }

    /// Whether `user_id` appears in the message's mentions.
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|m| m == user_id)
    }

    /// The thread a reply should go to: the enclosing thread, or a new thread under this message.
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// Extracts user IDs from mention markup such as `<@U123>` or `<@U123|alice>`.
pub fn parse_mentions(text: &str) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("<@") {
        rest = &rest[start + 2..];

        let Some(end) = rest.find('>') else {
            break;
        };

        let id = rest[..end].split('|').next().unwrap_or_default().trim();

        if !id.is_empty() && !id.contains(char::is_whitespace) && !mentions.iter().any(|m| m == id) {
            mentions.push(id.to_string());
        }

        rest = &rest[end + 1..];
    }

    mentions
}

/// Handles an inbound message.
///
/// This spawns a new task so the event listener is never blocked on the reply.
#[instrument(skip_all)]
pub fn handle_inbound_message(message: InboundMessage, chat: ChatClient) {
    tokio::spawn(async move {
        // Process the event.
        let result = handle_inbound_message_internal(&message, &chat).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

/// Replies to the message when it mentions the bot and was not sent by the bot.
#[instrument(skip_all, fields(channel_id = %message.channel_id, ts = %message.ts))]
pub async fn handle_inbound_message_internal(message: &InboundMessage, chat: &ChatClient) -> Void {
    let bot_user_id = chat.bot_user_id();

    if message.sender_id.as_deref() == Some(bot_user_id) {
        debug!("Skipping message sent by the bot itself.");
        return Ok(());
    }

    if !message.mentions_user(bot_user_id) {
        debug!("Skipping message that does not mention the bot.");
        return Ok(());
    }

    info!("Replying to mention ...");

    chat.send_message(&message.channel_id, message.reply_thread_ts(), MENTION_REPLY).await
}

// Tests.
