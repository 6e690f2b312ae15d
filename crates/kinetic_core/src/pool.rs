//! Bounded object reuse
//!
//! A free-list allocator for hosts that build and discard many tween
//! instances per frame. `obtain` hands back a recycled instance or
//! constructs a fresh one; `release` resets the instance and stores it for
//! reuse, up to a fixed bound.

/// Restores an instance to its just-constructed state before reuse.
pub trait Recycle: Default {
    /// Clear all per-use state.
    fn reset(&mut self);
}

/// A bounded free list of reusable instances.
pub struct Pool<T: Recycle> {
    free: Vec<T>,
    capacity: usize,
}

impl<T: Recycle> Pool<T> {
    /// Create a pool that retains at most `capacity` released instances.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Pop a recycled instance, or construct a fresh one.
    pub fn obtain(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Reset `item` and keep it for later reuse.
    ///
    /// Items released past the bound are dropped.
    pub fn release(&mut self, mut item: T) {
        if self.free.len() < self.capacity {
            item.reset();
            self.free.push(item);
        } else {
            tracing::debug!("pool at capacity {}, dropping released instance", self.capacity);
        }
    }

    /// Number of instances currently available for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl<T: Recycle> Default for Pool<T> {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scratch {
        value: i32,
    }

    impl Recycle for Scratch {
        fn reset(&mut self) {
            self.value = 0;
        }
    }

    #[test]
    fn test_obtain_constructs_when_empty() {
        let mut pool: Pool<Scratch> = Pool::with_capacity(4);
        assert_eq!(pool.available(), 0);
        let item = pool.obtain();
        assert_eq!(item.value, 0);
    }

    #[test]
    fn test_release_resets_state() {
        let mut pool: Pool<Scratch> = Pool::with_capacity(4);
        let mut item = pool.obtain();
        item.value = 42;
        pool.release(item);
        assert_eq!(pool.available(), 1);

        let reused = pool.obtain();
        assert_eq!(reused.value, 0);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_release_respects_bound() {
        let mut pool: Pool<Scratch> = Pool::with_capacity(2);
        pool.release(Scratch::default());
        pool.release(Scratch::default());
        pool.release(Scratch::default());
        assert_eq!(pool.available(), 2);
    }
}
