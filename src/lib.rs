//! Commentcast: mass replies to the commenters of social network posts.
//!
//! A campaign reads every comment under a set of wall posts, keeps one
//! anchor comment per distinct author, and replies to each author exactly
//! once at a configured pace while recording progress and history.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP API, memory)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`social`]: Social network API contract and its VK and in-memory adapters
//! - [`campaign`]: Campaign pipeline, task lifecycle and persistence
//! - [`watcher`]: Continuous auto-reply for a single post
//! - [`config`]: Layered bot configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod campaign;
pub mod config;
pub mod social;
pub mod telemetry;
pub mod watcher;
