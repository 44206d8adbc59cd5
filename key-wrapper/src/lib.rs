//! Round-robin shard postfixes for cache keys.
//!
//! This crate provides:
//! - [`KeyWrapper`]: appends a rotating postfix (`:1`, `:2`, ...) to keys so
//!   writes spread across a number of shards
//! - [`WrapperFactory`]: owns the shard count and pushes changes to every
//!   wrapper it created, with an only-growing policy for wrappers that must
//!   never shrink
//! - [`Interrogator`]: a background task that polls an external source for the
//!   shard count and applies it to a factory
//!
//! It does not decide where a shard lives; it only builds the postfix that the
//! caller appends before handing the key to a store.
//!
//! # Example
//!
//! ```rust,ignore
//! use key_wrapper::{Interrogator, InterrogatorConfig, WrapKey, WrapperFactory};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = Arc::new(WrapperFactory::new(3)?);
//!     let wrapper = factory.make_key_wrapper();
//!
//!     assert_eq!(wrapper.wrap_key("user:100"), "user:100:1");
//!     assert_eq!(wrapper.wrap_key("user:200"), "user:200:2");
//!
//!     // Follow the shard count of the backing cluster
//!     let mut interrogator = Interrogator::start(
//!         InterrogatorConfig::default()
//!             .with_source_fn(|| Ok(4))
//!             .with_factory(factory.clone())
//!             .with_interval(Duration::from_secs(5))
//!             .with_error_handler(|e| tracing::error!("Shards count poll failed: {}", e)),
//!     )?;
//!
//!     interrogator.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Update Policy
//!
//! - **General wrappers** follow every change, up or down.
//! - **Only-growing wrappers** follow a change only when the new count is
//!   strictly greater than the factory's previous count.
//! - Valid counts are `1..=10000`; anything else is rejected and leaves all
//!   state untouched.

mod config;
mod error;
mod factory;
mod interrogator;
mod store;
mod wrapper;

pub use config::{ErrorHandler, FnSource, InterrogatorConfig, ShardsCountSource, MAX_INTERVAL};
pub use error::{BoxError, Error, Result};
pub use factory::{FactoryStats, WrapperFactory, MAX_SHARDS_COUNT, MIN_SHARDS_COUNT};
pub use interrogator::{Interrogator, InterrogatorState};
pub use store::WrapperGroup;
pub use wrapper::{KeyWrapper, ResetShards, WrapKey, DEFAULT_POSTFIX};
