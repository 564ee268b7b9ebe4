//! Chat service integration for ledger-bot.
//!
//! This module provides the Slack socket mode implementation of `GenericChatClient`.
//! Only push events are subscribed to: `app_mention` events are normalized into
//! [`InboundMessage`]s for the mention handler, everything else is logged and dropped.

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::mention::{self, InboundMessage},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type HttpsClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;
type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

impl ChatClient {
    /// Logs in to Slack with the configured tokens.
    pub async fn slack(config: &Config) -> Res<Self> {
        let client = SlackChatClient::login(config).await?;
        Ok(Self::new(Arc::new(client)))
    }
}

// Structs.

/// State handed to the socket mode callbacks.
struct ListenerState {
    chat: ChatClient,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    bot_user_id: String,
    client: Arc<HttpsClient>,
}

impl SlackChatClient {
    /// Builds the HTTPS client and resolves the bot's own user ID with `auth.test`.
    #[instrument(name = "SlackChatClient::login", skip_all)]
    async fn login(config: &Config) -> Res<Self> {
        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        let https = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let client = Arc::new(slack_morphism::SlackClient::new(SlackClientHyperConnector::with_connector(https)));

        let identity = client.open_session(&bot_token).auth_test().await?;
        let bot_user_id = identity.user_id.0;

        info!("Logged in to Slack as bot user `{}`.", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        let callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(on_push_event);

        let environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(ListenerState {
            chat: ChatClient::new(Arc::new(self.clone())),
        }));

        let listener = SlackClientSocketModeListener::new(&SlackClientSocketModeConfig::new(), environment, callbacks);

        listener.listen_for(&self.app_token).await?;

        // Blocks until Ctrl-C.
        listener.serve().await;

        info!("Slack listener stopped.");

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Void {
        let content = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), content)
            .with_thread_ts(SlackTs(thread_ts.to_string()))
            .with_link_names(true);

        let posted = self
            .client
            .open_session(&self.bot_token)
            .chat_post_message(&request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to post to `{}`: {}", channel_id, e))?;

        debug!("Posted message `{}`.", posted.ts.0);

        Ok(())
    }
}

// Event routing.

/// Whether `text` carries mention markup for `bot_user_id`.
///
/// A bare occurrence of the ID in prose is not a mention.
fn mentions_bot(text: &str, bot_user_id: &str) -> bool {
    mention::parse_mentions(text).iter().any(|id| id == bot_user_id)
}

/// Converts an `app_mention` event into the platform-neutral message shape.
fn inbound_from_app_mention(event: &SlackAppMentionEvent) -> InboundMessage {
    InboundMessage::new(
        event.channel.0.clone(),
        event.origin.ts.0.clone(),
        event.origin.thread_ts.as_ref().map(|ts| ts.0.clone()),
        Some(event.user.0.clone()),
        event.content.text.clone().unwrap_or_default(),
    )
}

/// Socket mode push event callback.
#[instrument(skip_all)]
async fn on_push_event(callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> CallbackResult {
    let states = states.read().await;
    let state = states.get_user_state::<ListenerState>().ok_or(anyhow::anyhow!("Listener state is missing."))?;

    match callback.event {
        SlackEventCallbackBody::AppMention(event) => {
            let message = inbound_from_app_mention(&event);

            info!("Received app mention in `{}`.", message.channel_id);

            mention::handle_inbound_message(message, state.chat.clone());
        }
        SlackEventCallbackBody::Message(event) => {
            let text = event.content.as_ref().and_then(|c| c.text.as_deref()).unwrap_or_default();

            // Slack delivers the same mention again as an `app_mention` event.
            if mentions_bot(text, state.chat.bot_user_id()) {
                debug!("Dropping message event that duplicates an app mention.");
            } else {
                debug!("Dropping message event without a bot mention.");
            }
        }
        _ => warn!("Dropping unhandled push event."),
    }

    Ok(())
}

// Tests.
