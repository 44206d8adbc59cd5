use crate::store::{WrapperGroup, WrapperStore};
use crate::{Error, KeyWrapper, ResetShards};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Smallest shard count a factory accepts.
pub const MIN_SHARDS_COUNT: u32 = 1;
/// Largest shard count a factory accepts.
pub const MAX_SHARDS_COUNT: u32 = 10_000;

/// Point-in-time snapshot of a factory.
///
/// Serializable so it can be exported to whatever metrics system is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactoryStats {
    /// Authoritative shard count.
    pub shards_count: u32,
    /// Wrappers updated on every change.
    pub general_wrappers: usize,
    /// Wrappers updated only when the count grows.
    pub only_growing_wrappers: usize,
}

struct FactoryState {
    shards_count: u32,
    general: WrapperStore,
    only_growing: WrapperStore,
}

impl FactoryState {
    fn group_mut(&mut self, group: WrapperGroup) -> &mut WrapperStore {
        match group {
            WrapperGroup::General => &mut self.general,
            WrapperGroup::OnlyGrowing => &mut self.only_growing,
        }
    }
}

/// Owns the authoritative shard count and every wrapper created from it.
///
/// Wrappers are registered in one of two groups (see [`WrapperGroup`]) and
/// receive count changes from [`compare_and_update`](Self::compare_and_update).
/// An only-growing wrapper may lag behind the factory after a decrease, but is
/// never ahead of it.
///
/// # Thread Safety
///
/// One `RwLock` covers the count and both groups. Broadcasts run under the
/// write lock, so wrappers see updates in the order they were issued.
pub struct WrapperFactory {
    state: RwLock<FactoryState>,
}

impl WrapperFactory {
    /// Create a factory with the given initial shard count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `shards_count` is outside
    /// [`MIN_SHARDS_COUNT`]..=[`MAX_SHARDS_COUNT`].
    pub fn new(shards_count: u32) -> Result<Self, Error> {
        check_range(shards_count)?;

        Ok(Self {
            state: RwLock::new(FactoryState {
                shards_count,
                general: WrapperStore::default(),
                only_growing: WrapperStore::default(),
            }),
        })
    }

    /// Create a wrapper that follows every shard count change.
    pub fn make_key_wrapper(&self) -> Arc<KeyWrapper> {
        self.make_in(WrapperGroup::General)
    }

    /// Create a wrapper that only follows shard count increases.
    pub fn make_only_growing_key_wrapper(&self) -> Arc<KeyWrapper> {
        self.make_in(WrapperGroup::OnlyGrowing)
    }

    fn make_in(&self, group: WrapperGroup) -> Arc<KeyWrapper> {
        let mut state = self.state.write();
        let wrapper = Arc::new(KeyWrapper::new(state.shards_count));
        state.group_mut(group).add(wrapper.clone());
        wrapper
    }

    /// Attach any reset-capable handle to a group.
    ///
    /// The handle is immediately reset to the current count so it starts in
    /// sync with the factory.
    pub fn register(&self, group: WrapperGroup, handle: Arc<dyn ResetShards>) {
        let mut state = self.state.write();
        handle.reset_shards_count(state.shards_count);
        state.group_mut(group).add(handle);
    }

    /// Current authoritative shard count.
    pub fn shards_count(&self) -> u32 {
        self.state.read().shards_count
    }

    /// Apply a new shard count if it differs from the current one.
    ///
    /// General wrappers always receive the new count. Only-growing wrappers
    /// receive it when it is strictly greater than the previous count.
    /// Returns `true` if the count changed, `false` if it was already current.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] and leaves everything untouched if
    /// `shards_count` is outside the valid range.
    pub fn compare_and_update(&self, shards_count: u32) -> Result<bool, Error> {
        let mut state = self.state.write();
        let previous = state.shards_count;
        if previous == shards_count {
            return Ok(false);
        }

        check_range(shards_count)?;

        let grew = shards_count > previous;
        state.general.update(shards_count);
        if grew {
            state.only_growing.update(shards_count);
        }
        state.shards_count = shards_count;

        tracing::debug!(
            previous,
            current = shards_count,
            general = state.general.len(),
            only_growing = state.only_growing.len(),
            grew,
            "Shards count changed, wrappers updated"
        );
        Ok(true)
    }

    /// Snapshot of the count and group sizes, taken under one lock.
    pub fn stats(&self) -> FactoryStats {
        let state = self.state.read();
        FactoryStats {
            shards_count: state.shards_count,
            general_wrappers: state.general.len(),
            only_growing_wrappers: state.only_growing.len(),
        }
    }
}

fn check_range(count: u32) -> Result<(), Error> {
    if (MIN_SHARDS_COUNT..=MAX_SHARDS_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            count,
            min: MIN_SHARDS_COUNT,
            max: MAX_SHARDS_COUNT,
        })
    }
}
