//! Runtime services and shared state for the ledger-bot.

use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{chat::ChatClient, db::DbClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the ledger store, chat client, and configuration.
/// It owns the store's lifecycle: the store is opened in [`Runtime::new`]
/// and closed when the runtime is shut down.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The ledger store.
    pub db: DbClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Open the ledger store.
        let db = DbClient::surreal(&config).await?;

        // Initialize the chat client.
        let chat = ChatClient::slack(&config).await?;

        Ok(Self { config, db, chat })
    }

    /// Runs the chat event loop until shutdown is requested.
    pub async fn start(&self) -> Void {
        self.chat.start().await
    }

    /// Shuts the runtime down, closing the store once the last handle is dropped.
    pub fn shutdown(self) {
        info!("Shutting down, closing the ledger store ...");
        drop(self);
    }
}
