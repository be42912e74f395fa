//! Discord bot integration.
//!
//! Connects to the gateway and routes chat messages to the command
//! dispatcher.

pub mod client;
pub mod handler;

pub use client::DiscordBotBuilder;
pub use handler::CommandHandler;
