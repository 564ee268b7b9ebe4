//! Core components, types, and utilities for the ledger-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Common types, ledger outcomes, and result handling.

pub mod config;
pub mod types;
