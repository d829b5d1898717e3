//! Adapter implementations for the social API port.

pub mod memory;
pub mod vk;
