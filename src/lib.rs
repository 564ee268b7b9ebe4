//! Library root for `ledger-bot`.
//!
//! Ledger-bot is a Slack bot that keeps per-user integer balances:
//! - A persistent, single-table ledger with get/add/subtract/set/transfer operations
//! - A chat front-end that replies whenever the bot is @-mentioned
//!
//! The ledger is exposed as a library through [`service::db::DbClient`]; chat
//! commands are not wired to it. The architecture is built around extensible
//! traits that allow for different implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the ledger-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the ledger store and chat client
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting ledger-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    let result = runtime.start().await;

    runtime.shutdown();

    result
}
