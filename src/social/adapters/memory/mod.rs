//! In-memory adapters for the social API port.

mod api;

pub use api::{InMemorySocialApi, SentReply};
