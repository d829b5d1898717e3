//! Campaign orchestration engine.
//!
//! A campaign discovers every distinct commenter of a set of posts, keeps the
//! first comment each person left (first post wins across posts), and sends
//! one reply per person through a rate-limited loop while keeping a live
//! task snapshot and durable history current. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
