//! Time source abstraction
//!
//! Block transfers bound every read with a deadline. The clock only needs to
//! be monotonic; its epoch is irrelevant.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin
    ///
    /// Must never go backwards.
    fn now_ms(&self) -> u64;

    /// Pause briefly between polls of an idle stream
    ///
    /// Implementations may sleep, yield, or do nothing.
    fn idle(&mut self, micros: u32);

    /// Milliseconds elapsed since `start_ms`
    fn elapsed_ms(&self, start_ms: u64) -> u64 {
        self.now_ms().saturating_sub(start_ms)
    }
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&self) -> u64 {
        T::now_ms(self)
    }

    fn idle(&mut self, micros: u32) {
        T::idle(self, micros)
    }
}
