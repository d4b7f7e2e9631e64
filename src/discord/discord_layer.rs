// Discord layer - commands, delivery sink, presence.

#[path = "commands/command_catalog.rs"]
pub mod commands;

pub mod delivery;

// Re-export command types for convenience
pub use commands::tracking::{Data, Error};
