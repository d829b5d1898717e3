//! Social network context: the external API that campaigns and watchers
//! talk to.
//!
//! The context follows the same hexagonal split as the campaign engine:
//!
//! - Domain identifiers and records in [`domain`]
//! - The API port and its error taxonomy in [`ports`]
//! - VK and in-memory implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
