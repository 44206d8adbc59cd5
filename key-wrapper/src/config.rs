use crate::error::BoxError;
use crate::{Error, WrapperFactory};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked with every error the interrogator hits during a tick.
pub type ErrorHandler = Arc<dyn Fn(Error) + Send + Sync>;

/// Something that knows the current number of shards.
///
/// Queried once per interrogator tick. Implementations may do I/O; a slow
/// answer delays that tick but never causes ticks to pile up.
#[async_trait]
pub trait ShardsCountSource: Send + Sync {
    async fn shards_count(&self) -> Result<u32, BoxError>;
}

/// Longest poll interval an interrogator accepts.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Adapts a plain closure into a [`ShardsCountSource`].
///
/// The closure may block; it runs on Tokio's blocking pool so a slow lookup
/// never stalls the runtime driving the interrogator.
pub struct FnSource<F>(Arc<F>);

impl<F> FnSource<F> {
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<F> ShardsCountSource for FnSource<F>
where
    F: Fn() -> Result<u32, BoxError> + Send + Sync + 'static,
{
    async fn shards_count(&self) -> Result<u32, BoxError> {
        let f = self.0.clone();
        match tokio::task::spawn_blocking(move || f()).await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        }
    }
}

/// Configuration for an [`Interrogator`](crate::Interrogator).
///
/// Every field is required; [`validate`](Self::validate) reports the first
/// one missing.
///
/// # Example
///
/// ```rust,ignore
/// let config = InterrogatorConfig::default()
///     .with_source_fn(|| Ok(4))
///     .with_factory(factory.clone())
///     .with_interval(Duration::from_secs(5))
///     .with_error_handler(|e| tracing::error!("{}", e));
/// ```
#[derive(Clone, Default)]
pub struct InterrogatorConfig {
    pub shards_count: Option<Arc<dyn ShardsCountSource>>,
    pub factory: Option<Arc<WrapperFactory>>,
    pub interval: Option<Duration>,
    pub error_handler: Option<ErrorHandler>,
}

impl InterrogatorConfig {
    pub fn with_source(mut self, source: Arc<dyn ShardsCountSource>) -> Self {
        self.shards_count = Some(source);
        self
    }

    pub fn with_source_fn<F>(self, f: F) -> Self
    where
        F: Fn() -> Result<u32, BoxError> + Send + Sync + 'static,
    {
        self.with_source(Arc::new(FnSource::new(f)))
    }

    pub fn with_factory(mut self, factory: Arc<WrapperFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_error_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Check that every required field is present and the interval is positive
    /// and no longer than [`MAX_INTERVAL`].
    pub fn validate(&self) -> Result<(), Error> {
        if self.shards_count.is_none() {
            return Err(Error::Config("shards count source is required".into()));
        }

        if self.factory.is_none() {
            return Err(Error::Config("factory is required".into()));
        }

        match self.interval {
            Some(interval) if interval > MAX_INTERVAL => {
                return Err(Error::Config(format!(
                    "interval must not exceed {:?}",
                    MAX_INTERVAL
                )))
            }
            Some(interval) if !interval.is_zero() => {}
            _ => {
                return Err(Error::Config(
                    "interval must be greater than zero".into(),
                ))
            }
        }

        if self.error_handler.is_none() {
            return Err(Error::Config("error handler is required".into()));
        }

        Ok(())
    }

    /// Split a validated config into its parts.
    pub(crate) fn into_parts(
        self,
    ) -> Result<(Arc<dyn ShardsCountSource>, Arc<WrapperFactory>, Duration, ErrorHandler), Error>
    {
        self.validate()?;
        match (self.shards_count, self.factory, self.interval, self.error_handler) {
            (Some(source), Some(factory), Some(interval), Some(handler)) => {
                Ok((source, factory, interval, handler))
            }
            _ => Err(Error::Config("incomplete configuration".into())),
        }
    }
}

impl fmt::Debug for InterrogatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterrogatorConfig")
            .field("shards_count", &self.shards_count.is_some())
            .field("factory", &self.factory.as_ref().map(|factory| factory.stats()))
            .field("interval", &self.interval)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}
