pub mod client;
pub mod disable;
pub mod leases;
pub mod push;
pub mod seen;
pub mod service;

pub use client::{Hub, HubMode, WebSubClient, WebSubError};
pub use disable::FeedDisabler;
pub use leases::{LeaseBook, MemoryLeases, RedisLeases};
pub use push::{
    verify_challenge, ContentClassifier, HubChallenge, NotificationSink, PushError, PushReceiver,
};
pub use seen::{LastVideoBook, MemoryLastVideos, RedisLastVideos};
pub use service::{ServiceError, SubscriptionService};
