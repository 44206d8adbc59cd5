use parking_lot::Mutex;

/// Postfix returned whenever a wrapper has a single shard (or none).
pub const DEFAULT_POSTFIX: &str = ":1";

/// Appends a shard postfix to keys.
///
/// This is the capability handed out to callers on the hot path.
pub trait WrapKey: Send + Sync {
    /// Produce the next postfix in the rotation, e.g. `":2"`.
    fn next_postfix(&self) -> String;

    /// Append the next postfix to `key`.
    ///
    /// No escaping or validation is done: `"user:123"` becomes `"user:123:2"`.
    fn wrap_key(&self, key: &str) -> String {
        let mut wrapped = String::from(key);
        wrapped.push_str(&self.next_postfix());
        wrapped
    }
}

/// Accepts shard count updates.
///
/// This is the only thing [`WrapperFactory`](crate::WrapperFactory) needs from
/// the handles it broadcasts to.
pub trait ResetShards: Send + Sync {
    fn reset_shards_count(&self, count: u32);
}

#[derive(Debug, Default)]
struct Cursor {
    /// Last issued shard index, 1-based. Zero until the first multi-shard call.
    i: u32,
    shards_count: u32,
}

/// Round-robin postfix generator for one key-space.
///
/// Cycles through `:1`, `:2`, ..., `:n` where `n` is the current shard count.
/// Changing the count never rewinds the cursor; the rotation continues from
/// where it was, wrapping at the new count.
///
/// # Thread Safety
///
/// Cursor and count share one mutex, held only for the read-modify-write, so
/// `wrap_key` can race `reset_shards_count` freely.
#[derive(Debug)]
pub struct KeyWrapper {
    cursor: Mutex<Cursor>,
}

impl KeyWrapper {
    pub fn new(shards_count: u32) -> Self {
        Self {
            cursor: Mutex::new(Cursor {
                i: 0,
                shards_count,
            }),
        }
    }

    /// Shard count this wrapper currently rotates over.
    pub fn shards_count(&self) -> u32 {
        self.cursor.lock().shards_count
    }

    fn advance(&self) -> Option<u32> {
        let mut cursor = self.cursor.lock();
        if cursor.shards_count <= 1 {
            return None;
        }

        cursor.i += 1;
        if cursor.i > cursor.shards_count {
            cursor.i = 1;
        }
        Some(cursor.i)
    }
}

impl WrapKey for KeyWrapper {
    fn next_postfix(&self) -> String {
        match self.advance() {
            Some(i) => format!(":{}", i),
            None => DEFAULT_POSTFIX.to_string(),
        }
    }
}

impl ResetShards for KeyWrapper {
    fn reset_shards_count(&self, count: u32) {
        self.cursor.lock().shards_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_postfix_cycles_through_all_shards() {
        let wrapper = KeyWrapper::new(5);

        for k in 1..=23u32 {
            let expected = format!(":{}", (k - 1) % 5 + 1);
            assert_eq!(wrapper.next_postfix(), expected, "call #{}", k);
        }
    }

    #[test]
    fn test_wrap_key_appends_postfix() {
        let wrapper = KeyWrapper::new(6);
        let key = "key";

        for j in (1..=6).chain(1..=1) {
            assert_eq!(wrapper.wrap_key(key), format!("{}:{}", key, j));
        }
    }

    #[test]
    fn test_single_shard_always_default_postfix() {
        for count in [0, 1] {
            let wrapper = KeyWrapper::new(count);
            for _ in 0..100 {
                assert_eq!(wrapper.wrap_key("key"), "key:1");
            }
            assert_eq!(wrapper.cursor.lock().i, 0, "cursor must not move");
        }
    }

    #[test]
    fn test_reset_keeps_cursor_position() {
        let wrapper = KeyWrapper::new(4);
        assert_eq!(wrapper.next_postfix(), ":1");
        assert_eq!(wrapper.next_postfix(), ":2");
        assert_eq!(wrapper.next_postfix(), ":3");

        // Shrinking below the cursor wraps on the next call
        wrapper.reset_shards_count(2);
        assert_eq!(wrapper.shards_count(), 2);
        assert_eq!(wrapper.next_postfix(), ":1");
        assert_eq!(wrapper.next_postfix(), ":2");

        // Growing continues past the old bound
        wrapper.reset_shards_count(4);
        assert_eq!(wrapper.next_postfix(), ":3");
        assert_eq!(wrapper.next_postfix(), ":4");
        assert_eq!(wrapper.next_postfix(), ":1");
    }

    #[test]
    fn test_first_call_after_reset_from_single_shard() {
        let wrapper = KeyWrapper::new(1);
        assert_eq!(wrapper.next_postfix(), ":1");
        assert_eq!(wrapper.next_postfix(), ":1");

        wrapper.reset_shards_count(3);
        assert_eq!(wrapper.next_postfix(), ":1");
        assert_eq!(wrapper.next_postfix(), ":2");
    }

    #[test]
    fn test_concurrent_wrap_stays_in_range() {
        let wrapper = Arc::new(KeyWrapper::new(5));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let wrapper = wrapper.clone();
                std::thread::spawn(move || {
                    for n in 0..500 {
                        if t == 0 && n % 50 == 0 {
                            wrapper.reset_shards_count(3 + (n / 50) % 4);
                        }
                        let postfix = wrapper.next_postfix();
                        let shard: u32 = postfix[1..].parse().unwrap();
                        assert!((1..=6).contains(&shard), "bad postfix {}", postfix);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
