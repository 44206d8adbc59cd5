use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by a [`ShardsCountSource`](crate::ShardsCountSource).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shards count {count} is out of range [{min}, {max}]")]
    OutOfRange { count: u32, min: u32, max: u32 },

    #[error("Shards count source failed: {0}")]
    Source(#[source] BoxError),

    #[error("Interrogator did not stop within {0:?}")]
    StopTimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
