//! Walkthrough of key-wrapper rotation and live shard count updates.
//!
//! Run with:
//!   RUST_LOG=key_wrapper=debug cargo run -p key-wrapper --example demo

use key_wrapper::{Interrogator, InterrogatorConfig, WrapKey, WrapperFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    basic_rotation()?;
    growing_cluster().await?;
    only_growing_wrapper().await?;

    Ok(())
}

fn basic_rotation() -> Result<(), Box<dyn std::error::Error>> {
    println!("== 3 shards, fixed");

    let factory = WrapperFactory::new(3)?;
    let wrapper = factory.make_key_wrapper();

    for i in 1..=6 {
        let key = format!("user:{}", i * 100);
        println!("  {} -> {}", key, wrapper.wrap_key(&key));
    }
    Ok(())
}

/// Source that reports `before` for the first two polls and `after` from then on.
fn changing_source(
    before: u32,
    after: u32,
) -> impl Fn() -> Result<u32, key_wrapper::BoxError> + Send + Sync + 'static {
    let calls = AtomicUsize::new(0);
    move || {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(before)
        } else {
            Ok(after)
        }
    }
}

async fn run_scenario(
    title: &str,
    before: u32,
    after: u32,
    only_growing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("== {}: {} -> {} shards", title, before, after);

    let factory = Arc::new(WrapperFactory::new(before)?);
    let mut interrogator = Interrogator::start(
        InterrogatorConfig::default()
            .with_source_fn(changing_source(before, after))
            .with_factory(factory.clone())
            .with_interval(POLL_INTERVAL)
            .with_error_handler(|e| tracing::error!("Interrogator error: {}", e)),
    )?;

    let wrapper = if only_growing {
        factory.make_only_growing_key_wrapper()
    } else {
        factory.make_key_wrapper()
    };

    for i in 1..=8 {
        if i == 4 {
            tokio::time::sleep(POLL_INTERVAL * 3).await;
            println!("  -- factory now at {} shards", factory.shards_count());
        }
        let key = format!("key{}", i);
        println!("  {} -> {}", key, wrapper.wrap_key(&key));
    }

    interrogator.stop().await;
    println!("  stats: {:?}", factory.stats());
    Ok(())
}

async fn growing_cluster() -> Result<(), Box<dyn std::error::Error>> {
    run_scenario("general wrapper", 2, 4, false).await
}

async fn only_growing_wrapper() -> Result<(), Box<dyn std::error::Error>> {
    run_scenario("only-growing wrapper", 4, 2, true).await
}
