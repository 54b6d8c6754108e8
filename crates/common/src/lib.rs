pub mod auth;
pub mod config;
pub mod feed;
pub mod limits;
pub mod store;
pub mod types;

pub use store::{MemoryStore, SourceDisabler, StoreError, SubscriptionStore};
