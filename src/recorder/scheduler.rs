/// Flush cadence over the base timer
///
/// Counts base timer ticks and signals a drain every `flush_every`
/// ticks, keeping the flush cycle on a wall-clock cadence regardless
/// of tick arrival rate.
pub struct FlushScheduler {
    count: u32,
    flush_every: u32,
}

impl FlushScheduler {
    pub fn new(flush_every: u32) -> Self {
        FlushScheduler {
            count: 0,
            flush_every: flush_every.max(1),
        }
    }

    /// Returns true when the flush multiple has been reached; the
    /// counter then restarts from zero
    pub fn on_timer(&mut self) -> bool {
        self.count += 1;
        if self.count < self.flush_every {
            return false;
        }

        self.count = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_the_configured_multiple() {
        let mut scheduler = FlushScheduler::new(10);

        for _ in 0..9 {
            assert!(!scheduler.on_timer());
        }
        assert!(scheduler.on_timer());

        // Counter restarts for the next cycle
        for _ in 0..9 {
            assert!(!scheduler.on_timer());
        }
        assert!(scheduler.on_timer());
    }

    #[test]
    fn test_multiple_of_one_fires_every_tick() {
        let mut scheduler = FlushScheduler::new(1);

        assert!(scheduler.on_timer());
        assert!(scheduler.on_timer());
    }

    #[test]
    fn test_zero_is_clamped() {
        let mut scheduler = FlushScheduler::new(0);
        assert!(scheduler.on_timer());
    }
}
