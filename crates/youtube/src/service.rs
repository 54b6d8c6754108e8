use chrono::{Duration, Utc};
use common::limits::{max_feeds_for_context, PremiumContext};
use common::store::{StoreError, SubscriptionStore};
use common::types::{ChannelSubscription, NewChannelSubscription, YoutubeAnnouncements};
use tracing::{info, warn};

use crate::client::{Hub, WebSubError};
use crate::leases::LeaseBook;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("guild has reached its limit of {max} youtube feeds")]
    QuotaExceeded { max: i64 },
    #[error("subscription not found")]
    NotFound,
    #[error(transparent)]
    Hub(#[from] WebSubError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Guild-facing feed management: keeps the store and the hub in step.
pub struct SubscriptionService<S, H, L> {
    store: S,
    hub: H,
    leases: L,
    lease_renew: Duration,
}

impl<S, H, L> SubscriptionService<S, H, L>
where
    S: SubscriptionStore,
    H: Hub,
    L: LeaseBook,
{
    pub fn new(store: S, hub: H, leases: L, lease_renew: Duration) -> Self {
        Self {
            store,
            hub,
            leases,
            lease_renew,
        }
    }

    pub async fn list(&self, guild_id: &str) -> Result<Vec<ChannelSubscription>, ServiceError> {
        Ok(self.store.list_by_guild(guild_id).await?)
    }

    pub async fn add<C>(
        &self,
        ctx: &C,
        new: NewChannelSubscription,
    ) -> Result<ChannelSubscription, ServiceError>
    where
        C: PremiumContext + ?Sized,
    {
        let max = max_feeds_for_context(ctx);
        if self.store.count_by_guild(&new.guild_id).await? >= max {
            return Err(ServiceError::QuotaExceeded { max });
        }

        let youtube_channel_id = new.youtube_channel_id.clone();
        let leased = self.leases.renew_at(&youtube_channel_id).await?.is_some();
        if !leased {
            self.hub.subscribe(&youtube_channel_id).await?;
            // Recorded before the insert so the sweep releases the channel
            // if nothing ends up following it.
            let renew_at = Utc::now() + self.lease_renew;
            if let Err(err) = self.leases.record(&youtube_channel_id, renew_at).await {
                warn!(
                    error = %err,
                    channel_id = %youtube_channel_id,
                    "failed recording websub lease, next sweep will resubscribe"
                );
            }
        }

        let subscription = match self.store.insert(new).await {
            Ok(subscription) => subscription,
            Err(err) => {
                if !leased {
                    self.abandon(&youtube_channel_id).await;
                }
                return Err(err.into());
            }
        };

        info!(
            guild_id = %subscription.guild_id,
            subscription_id = %subscription.id,
            channel_id = %youtube_channel_id,
            "added youtube feed"
        );

        Ok(subscription)
    }

    pub async fn remove(
        &self,
        guild_id: &str,
        id: &str,
    ) -> Result<ChannelSubscription, ServiceError> {
        let subscription = match self.store.get(id).await? {
            Some(sub) if sub.guild_id == guild_id => sub,
            _ => return Err(ServiceError::NotFound),
        };

        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound);
        }

        let youtube_channel_id = &subscription.youtube_channel_id;
        if self
            .store
            .list_by_youtube_channel(youtube_channel_id)
            .await?
            .is_empty()
        {
            // The hub drops the subscription on its own once the lease runs out.
            if let Err(err) = self.hub.unsubscribe(youtube_channel_id).await {
                warn!(error = %err, channel_id = %youtube_channel_id, "websub unsubscribe failed");
            }
            if let Err(err) = self.leases.forget(youtube_channel_id).await {
                warn!(
                    error = %err,
                    channel_id = %youtube_channel_id,
                    "failed forgetting websub lease"
                );
            }
        }

        info!(
            guild_id = %guild_id,
            subscription_id = %id,
            channel_id = %youtube_channel_id,
            "removed youtube feed"
        );

        Ok(subscription)
    }

    /// Undoes the hub subscription of an add that could not be stored. The
    /// lease stays when the hub refuses, so the sweep retries the release.
    async fn abandon(&self, youtube_channel_id: &str) {
        if let Err(err) = self.hub.unsubscribe(youtube_channel_id).await {
            warn!(error = %err, channel_id = %youtube_channel_id, "websub unsubscribe failed");
            return;
        }
        if let Err(err) = self.leases.forget(youtube_channel_id).await {
            warn!(
                error = %err,
                channel_id = %youtube_channel_id,
                "failed forgetting websub lease"
            );
        }
    }

    pub async fn announcement(
        &self,
        guild_id: i64,
    ) -> Result<Option<YoutubeAnnouncements>, ServiceError> {
        Ok(self.store.announcement(guild_id).await?)
    }

    pub async fn set_announcement(
        &self,
        guild_id: i64,
        message: String,
        enabled: bool,
    ) -> Result<YoutubeAnnouncements, ServiceError> {
        let announcement = YoutubeAnnouncements {
            guild_id,
            message,
            enabled: Some(enabled),
        };
        Ok(self.store.upsert_announcement(announcement).await?)
    }
}
