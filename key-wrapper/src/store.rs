use crate::ResetShards;
use std::sync::Arc;

/// Which broadcast group a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapperGroup {
    /// Receives every shard count change.
    General,
    /// Receives a change only when the shard count grows.
    OnlyGrowing,
}

/// Ordered list of handles that receive the same shard count updates.
///
/// Not synchronized on its own; the owning factory's lock covers it.
#[derive(Default)]
pub(crate) struct WrapperStore {
    wrappers: Vec<Arc<dyn ResetShards>>,
}

impl WrapperStore {
    pub(crate) fn add(&mut self, wrapper: Arc<dyn ResetShards>) {
        self.wrappers.push(wrapper);
    }

    pub(crate) fn update(&self, count: u32) {
        for wrapper in &self.wrappers {
            wrapper.reset_shards_count(count);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.wrappers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Recorder(AtomicU32);

    impl ResetShards for Recorder {
        fn reset_shards_count(&self, count: u32) {
            self.0.store(count, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_store_update_reaches_every_handle() {
        let mut store = WrapperStore::default();
        let recorders: Vec<Arc<Recorder>> = (0..3).map(|_| Arc::default()).collect();
        for recorder in &recorders {
            store.add(recorder.clone());
        }

        assert_eq!(store.len(), 3);

        store.update(7);
        for recorder in &recorders {
            assert_eq!(recorder.0.load(Ordering::SeqCst), 7);
        }
    }

    #[test]
    fn test_empty_store_update_is_noop() {
        let store = WrapperStore::default();
        store.update(3);
        assert_eq!(store.len(), 0);
    }
}
