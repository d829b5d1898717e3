//! `PostgreSQL` adapters for campaign persistence.

mod models;
mod store;
mod schema;

pub use store::{CampaignPgPool, PostgresCampaignStore};
