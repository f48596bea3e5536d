use crate::cloudcontroller::{
    AppLister, ClientError, Drain, DrainBinder, DrainCreator, DrainLister, TokenFetcher,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;

/// The drain which should exist, and be bound to all apps of the space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesiredDrain {
    pub name: String,
    pub url: String,
    pub drain_type: String,
}

/// The result of a single, successful reconciliation cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The drain was missing and has been requested. Apps get bound on a later cycle, once
    /// the drain can be listed.
    Created,
    /// The drain exists. Lists the apps newly bound, and those which failed to bind.
    Bound {
        bound: Vec<String>,
        failed: Vec<String>,
    },
}

/// Keep a drain bound to every app of a space.
///
/// The `SpaceManager` runs a reconciliation cycle every `interval`. Each cycle starts from a
/// fresh listing of the cloud controller, nothing is carried over between cycles. Cycles never
/// overlap: a slow cycle delays the next tick.
///
/// Two managers working on the same space may both create the drain, as there is no locking
/// between them.
pub struct SpaceManager {
    pub interval: Duration,
    pub space_guid: String,
    pub drain: DesiredDrain,
    pub token_fetcher: Arc<dyn TokenFetcher>,
    pub drain_lister: Arc<dyn DrainLister>,
    pub drain_creator: Arc<dyn DrainCreator>,
    pub app_lister: Arc<dyn AppLister>,
    pub drain_binder: Arc<dyn DrainBinder>,
}

impl SpaceManager {
    /// Run forever.
    pub async fn run(self) {
        self.run_until(futures::future::pending()).await
    }

    /// Run until `shutdown` completes. A running cycle is always completed first.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutting down space drain manager");
                    break;
                }
                _ = interval.tick() => {}
            }

            self.tick().await;
        }
    }

    async fn tick(&self) {
        match self.reconcile().await {
            Ok(ReconcileOutcome::Created) => {
                log::debug!("Drain requested, binding on next cycle");
            }
            Ok(ReconcileOutcome::Bound { bound, failed })
                if bound.is_empty() && failed.is_empty() =>
            {
                log::debug!("All apps are bound to drain {}", self.drain.name);
            }
            Ok(ReconcileOutcome::Bound { bound, failed }) => {
                log::info!(
                    "Done binding apps to drain {} (bound: {}, failed: {})",
                    self.drain.name,
                    bound.len(),
                    failed.len()
                );
            }
            // already logged by the failing step
            Err(_) => {}
        }
    }

    /// Run a single reconciliation cycle.
    ///
    /// Failing to acquire a token, or to list drains or apps, aborts the cycle. Failing to bind
    /// an app only skips that app, it will be retried on the next cycle.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, ClientError> {
        let token = self
            .token_fetcher
            .fetch_token()
            .await
            .map_err(log_failure("fetch token"))?;

        let drains = self
            .drain_lister
            .list_drains(&self.space_guid, &token)
            .await
            .map_err(log_failure("fetch drains"))?;

        let mut drain = match find_drain(&self.drain.name, drains) {
            Some(drain) => drain,
            None => {
                log::info!("Creating {} drain...", self.drain.name);
                self.drain_creator
                    .create_drain(
                        &self.drain.name,
                        &self.drain.url,
                        &self.space_guid,
                        &self.drain.drain_type,
                        &token,
                    )
                    .await
                    .map_err(log_failure("create drain"))?;
                log::info!("Created {} drain", self.drain.name);

                // the GUID is only known after listing it again
                return Ok(ReconcileOutcome::Created);
            }
        };

        let apps = self
            .app_lister
            .list_apps(&self.space_guid, &token)
            .await
            .map_err(log_failure("list apps"))?;

        let mut bound = Vec::new();
        let mut failed = Vec::new();

        for app in apps {
            if drain.app_guids.contains(&app) || failed.contains(&app) {
                continue;
            }

            match self
                .drain_binder
                .bind_drain(&app, &drain.guid, &token)
                .await
            {
                Ok(()) => {
                    drain.app_guids.push(app.clone());
                    bound.push(app);
                }
                Err(err) => {
                    log::warn!(
                        "Failed to bind {} to drain {} ({}): {}",
                        app,
                        drain.name,
                        err.code(),
                        err
                    );
                    failed.push(app);
                }
            }
        }

        Ok(ReconcileOutcome::Bound { bound, failed })
    }
}

fn log_failure(step: &'static str) -> impl FnOnce(ClientError) -> ClientError {
    move |err| {
        log::warn!("Failed to {} ({}): {}", step, err.code(), err);
        err
    }
}

/// Find a drain by name, the first match wins.
fn find_drain(name: &str, drains: Vec<Drain>) -> Option<Drain> {
    drains.into_iter().find(|drain| drain.name == name)
}
