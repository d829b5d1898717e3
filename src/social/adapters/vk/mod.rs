//! VK API adapter built on `reqwest`.
//!
//! Calls are form-encoded `POST`s to `https://api.vk.com/method/<name>`; the
//! user token is used for reads and the community token for replies.

mod client;
mod wire;

pub use client::{VkApiClient, VkApiFactory};
