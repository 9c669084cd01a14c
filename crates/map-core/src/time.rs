//! Monotonic millisecond time source

/// Monotonic millisecond clock used for all duration math.
///
/// Implementations must never go backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// [`Clock`] backed by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embassy_clock_is_monotonic() {
        let clock = EmbassyClock;
        let first = clock.now_ms();
        let second = clock.now_ms();
        assert!(second >= first);
    }
}
