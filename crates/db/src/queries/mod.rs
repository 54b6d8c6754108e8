pub mod announcements;
pub mod channel_subscriptions;
