//! Conversation module for kbsearch
//!
//! Holds the append-only message log and the controller that turns user
//! input into agent queries.

pub mod controller;
pub mod message;

pub use controller::{
    ConversationController, ConversationState, KeyInput, SubmitOutcome, NETWORK_ERROR_BANNER,
};
pub use message::{Message, Role};
