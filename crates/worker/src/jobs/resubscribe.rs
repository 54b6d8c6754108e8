use chrono::{DateTime, Duration, Utc};
use common::store::{StoreError, SubscriptionStore};
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};
use youtube::{Hub, LeaseBook};

/// What one sweep has to do with the hub.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepPlan {
    /// Followed channels without a lease or with a lease that is due.
    pub renew: Vec<String>,
    /// Leased channels nobody follows anymore.
    pub drop: Vec<String>,
}

pub fn plan_sweep(
    channels: &[String],
    leases: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SweepPlan {
    let followed: BTreeSet<&str> = channels.iter().map(String::as_str).collect();

    let renew = followed
        .iter()
        .filter(|channel| leases.get(**channel).map_or(true, |at| *at <= now))
        .map(|channel| channel.to_string())
        .collect();

    let mut drop: Vec<String> = leases
        .keys()
        .filter(|channel| !followed.contains(channel.as_str()))
        .cloned()
        .collect();
    drop.sort();

    SweepPlan { renew, drop }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub renewed: usize,
    pub failed: usize,
    pub dropped: usize,
}

pub struct Resubscriber<S, H, L> {
    store: S,
    hub: H,
    leases: L,
    batch_size: usize,
    lease_renew: Duration,
}

impl<S, H, L> Resubscriber<S, H, L>
where
    S: SubscriptionStore,
    H: Hub,
    L: LeaseBook,
{
    pub fn new(store: S, hub: H, leases: L, batch_size: usize, lease_renew: Duration) -> Self {
        Self {
            store,
            hub,
            leases,
            batch_size: batch_size.max(1),
            lease_renew,
        }
    }

    /// Renews due hub subscriptions and releases orphaned ones. Failures after
    /// the plan is made are logged and left for the next sweep.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let channels = self.store.youtube_channel_ids().await?;
        let current = self.leases.all().await?;
        let plan = plan_sweep(&channels, &current, Utc::now());
        let mut report = SweepReport::default();

        let hub = &self.hub;
        let results: Vec<_> = stream::iter(plan.renew)
            .map(|channel| async move {
                let result = hub.subscribe(&channel).await;
                (channel, result)
            })
            .buffer_unordered(self.batch_size)
            .collect()
            .await;

        for (channel, result) in results {
            match result {
                Ok(()) => {
                    match self
                        .leases
                        .record(&channel, Utc::now() + self.lease_renew)
                        .await
                    {
                        Ok(()) => report.renewed += 1,
                        Err(err) => {
                            warn!(
                                error = %err,
                                channel_id = %channel,
                                "failed recording websub lease"
                            );
                            report.failed += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, channel_id = %channel, "websub resubscribe failed");
                    report.failed += 1;
                }
            }
        }

        for channel in plan.drop {
            if let Err(err) = self.hub.unsubscribe(&channel).await {
                warn!(error = %err, channel_id = %channel, "websub unsubscribe failed");
            }
            match self.leases.forget(&channel).await {
                Ok(()) => report.dropped += 1,
                Err(err) => {
                    warn!(error = %err, channel_id = %channel, "failed forgetting websub lease");
                    report.failed += 1;
                }
            }
        }

        info!(
            channels = channels.len(),
            renewed = report.renewed,
            failed = report.failed,
            dropped = report.dropped,
            "resubscription sweep done"
        );

        Ok(report)
    }
}
