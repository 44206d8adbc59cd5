use crate::config::{ErrorHandler, ShardsCountSource};
use crate::{Error, InterrogatorConfig, WrapperFactory};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Lifecycle of an [`Interrogator`]. There is no way back from `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterrogatorState {
    Running,
    Stopped,
}

/// Periodically asks a [`ShardsCountSource`] for the shard count and feeds it
/// to a [`WrapperFactory`].
///
/// Failures (source errors, out-of-range counts) go to the configured error
/// handler and never end the loop. A tick that runs longer than the interval
/// delays the next one instead of queueing extra ticks.
///
/// Always call [`stop`](Self::stop) when done. Dropping a running interrogator
/// cancels its task but cannot wait for an in-flight tick.
pub struct Interrogator {
    cancel_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl Interrogator {
    /// Validate `config` and spawn the polling task.
    ///
    /// Must be called from within a Tokio runtime. The first poll happens one
    /// full interval after start.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required field is missing, the interval
    /// is zero or longer than [`MAX_INTERVAL`](crate::MAX_INTERVAL), or no
    /// Tokio runtime is running.
    pub fn start(config: InterrogatorConfig) -> Result<Self, Error> {
        let (source, factory, interval, error_handler) = config.into_parts()?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("interrogator needs a Tokio runtime: {}", e)))?;
        let cancel_token = CancellationToken::new();

        let task_handle = Self::spawn_interrogation_task(
            &runtime,
            source,
            factory,
            interval,
            error_handler,
            cancel_token.clone(),
        );

        Ok(Self {
            cancel_token,
            task_handle: Some(task_handle),
        })
    }

    fn spawn_interrogation_task(
        runtime: &Handle,
        source: Arc<dyn ShardsCountSource>,
        factory: Arc<WrapperFactory>,
        interval: Duration,
        error_handler: ErrorHandler,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        runtime.spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::debug!(?interval, "Interrogator started");

            loop {
                tokio::select! {
                    // Cancellation wins over an overdue tick
                    biased;

                    _ = cancel_token.cancelled() => {
                        tracing::debug!("Interrogator shutting down");
                        break;
                    }

                    _ = timer.tick() => {
                        Self::interrogate(source.as_ref(), &factory, &error_handler).await;
                    }
                }
            }
        })
    }

    async fn interrogate(
        source: &dyn ShardsCountSource,
        factory: &WrapperFactory,
        error_handler: &ErrorHandler,
    ) {
        let count = match source.shards_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to get shards count: {}", e);
                error_handler(Error::Source(e));
                return;
            }
        };

        match factory.compare_and_update(count) {
            Ok(true) => {}
            Ok(false) => tracing::trace!(count, "Poll: no shards count change"),
            Err(e) => {
                tracing::warn!(count, "Rejected shards count: {}", e);
                error_handler(e);
            }
        }
    }

    pub fn state(&self) -> InterrogatorState {
        match &self.task_handle {
            Some(handle) if !handle.is_finished() && !self.cancel_token.is_cancelled() => {
                InterrogatorState::Running
            }
            _ => InterrogatorState::Stopped,
        }
    }

    /// Stop polling and wait for an in-flight tick to finish.
    ///
    /// Once this returns the factory is no longer touched. Calling it again is
    /// a no-op.
    pub async fn stop(&mut self) {
        self.cancel_token.cancel();

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Interrogator task ended abnormally: {}", e);
            }
        }
    }

    /// Like [`stop`](Self::stop), but gives up waiting after `timeout`.
    ///
    /// The task is cancelled either way; on timeout it finishes its current
    /// tick in the background and exits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StopTimedOut`] if the task did not exit in time.
    pub async fn stop_timeout(&mut self, timeout: Duration) -> Result<(), Error> {
        self.cancel_token.cancel();

        let Some(mut handle) = self.task_handle.take() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!("Interrogator task ended abnormally: {}", e);
                Ok(())
            }
            Err(_) => {
                tracing::warn!(?timeout, "Interrogator did not stop in time");
                Err(Error::StopTimedOut(timeout))
            }
        }
    }
}

impl Drop for Interrogator {
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            tracing::debug!("Interrogator dropped without stop, cancelling task");
            self.cancel_token.cancel();
        }
    }
}
