#![deny(unsafe_code)]

/// Admin page gate driven by identity-provider group claims.
pub mod access;
/// Conversation domain: session identity, history persistence, reply formatting.
pub mod chat;
/// Line input for terminal hosts.
pub mod input;
/// Settings persistence.
pub mod settings;
pub mod widget;

pub use widget::ChatWidget;
