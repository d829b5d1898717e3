//! Step definitions for campaign delivery scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
