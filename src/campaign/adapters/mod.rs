//! Adapter implementations for campaign ports.

pub mod memory;
pub mod postgres;
