//! Agent module for kbsearch
//!
//! Stateless access to the external answering agent: the [`AgentClient`]
//! seam, its HTTP implementation, and the response normalization that turns
//! every payload shape into a [`NormalizedAnswer`].

pub mod client;
pub mod response;

pub use client::{AgentClient, HttpAgentClient};
pub use response::{normalize_response, Confidence, NormalizedAnswer, Source};

#[cfg(test)]
pub use client::MockAgentClient;
