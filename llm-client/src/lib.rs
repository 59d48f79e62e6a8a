//! Thin async client for OpenAI-compatible chat completion and embedding APIs.

mod api_url;
mod chat;
mod client;
mod embeddings;

pub(crate) use api_url::*;

pub use chat::*;
pub use client::*;
