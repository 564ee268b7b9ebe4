//! Event handling and user interactions for ledger-bot.
//!
//! This module provides functionality for handling inbound chat messages:
//! - Normalizing messages and their @-mentions
//! - Replying when the bot itself is mentioned

pub mod mention;
