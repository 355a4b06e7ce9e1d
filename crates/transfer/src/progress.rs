use std::time::Duration;

/// Upper bound of the hashing phase on the unified scale.
pub const HASHING_END: u8 = 10;
/// Upper bound of the chunk transfer phase.
pub const TRANSFER_END: u8 = 95;
/// Terminal value.
pub const PROGRESS_DONE: u8 = 100;
/// Increment used by the closing ramp.
pub const RAMP_STEP: u8 = 5;

/// Maps the hashing, transfer and finalize phases onto one 0–100 scale.
///
/// Every mutator returns `Some(value)` only when the unified value
/// actually increased, so callers can forward the result as-is and the
/// emitted sequence is strictly increasing.
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    current: u8,
    total_chunks: u64,
    uploaded_chunks: u64,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last emitted value.
    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn uploaded_chunks(&self) -> u64 {
        self.uploaded_chunks
    }

    /// Hashing progress as a fraction of bytes read.
    pub fn hashing(&mut self, fraction: f64) -> Option<u8> {
        let fraction = fraction.clamp(0.0, 1.0);
        self.advance((fraction * f64::from(HASHING_END)).floor() as u8)
    }

    /// Marks hashing as finished (or skipped) and resets the chunk counter.
    pub fn begin_transfer(&mut self, total_chunks: u64) -> Option<u8> {
        self.total_chunks = total_chunks;
        self.uploaded_chunks = 0;
        let emitted = self.advance(HASHING_END);
        if total_chunks == 0 {
            return self.advance(TRANSFER_END).or(emitted);
        }
        emitted
    }

    /// Records one successfully uploaded chunk.
    pub fn chunk_completed(&mut self) -> Option<u8> {
        if self.uploaded_chunks >= self.total_chunks {
            return None;
        }
        self.uploaded_chunks += 1;
        let span = u64::from(TRANSFER_END - HASHING_END);
        let gained = span * self.uploaded_chunks / self.total_chunks;
        self.advance(HASHING_END + gained as u8)
    }

    /// Plans the closing ramp from the current value to 100.
    ///
    /// A zero `duration` yields a single jump to 100.
    pub fn ramp(&self, duration: Duration) -> RampPlan {
        let mut steps = Vec::new();
        if !duration.is_zero() {
            let mut value = self.current;
            while value < PROGRESS_DONE {
                value = value.saturating_add(RAMP_STEP).min(PROGRESS_DONE);
                steps.push(value);
            }
        } else if self.current < PROGRESS_DONE {
            steps.push(PROGRESS_DONE);
        }
        let tick = match u32::try_from(steps.len()) {
            Ok(n) if n > 0 => duration / n,
            _ => Duration::ZERO,
        };
        RampPlan { steps, tick }
    }

    /// Applies one ramp step (or any other terminal value).
    pub fn finish_step(&mut self, value: u8) -> Option<u8> {
        self.advance(value)
    }

    fn advance(&mut self, value: u8) -> Option<u8> {
        let value = value.min(PROGRESS_DONE);
        if value > self.current {
            self.current = value;
            Some(value)
        } else {
            None
        }
    }
}

/// Fixed-size steps of the closing ramp and the delay between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RampPlan {
    pub steps: Vec<u8>,
    pub tick: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_maps_to_first_ten_points() {
        let mut p = ProgressAggregator::new();
        assert_eq!(p.hashing(0.0), None);
        assert_eq!(p.hashing(0.25), Some(2));
        assert_eq!(p.hashing(0.29), None);
        assert_eq!(p.hashing(1.0), Some(10));
        assert_eq!(p.hashing(7.0), None);
    }

    #[test]
    fn chunks_fill_ten_to_ninety_five() {
        let mut p = ProgressAggregator::new();
        p.hashing(1.0);
        assert_eq!(p.begin_transfer(3), None);

        assert_eq!(p.chunk_completed(), Some(38));
        assert_eq!(p.chunk_completed(), Some(66));
        assert_eq!(p.chunk_completed(), Some(95));
        assert_eq!(p.uploaded_chunks(), 3);
        // Extra completions are ignored.
        assert_eq!(p.chunk_completed(), None);
        assert_eq!(p.current(), 95);
    }

    #[test]
    fn skipped_hashing_jumps_to_ten() {
        let mut p = ProgressAggregator::new();
        assert_eq!(p.begin_transfer(2), Some(10));
    }

    #[test]
    fn empty_transfer_jumps_to_ninety_five() {
        let mut p = ProgressAggregator::new();
        p.hashing(1.0);
        assert_eq!(p.begin_transfer(0), Some(95));
    }

    #[test]
    fn many_chunks_never_decrease() {
        let mut p = ProgressAggregator::new();
        p.begin_transfer(1000);
        let mut last = p.current();
        for _ in 0..1000 {
            if let Some(v) = p.chunk_completed() {
                assert!(v > last);
                last = v;
            }
        }
        assert_eq!(last, TRANSFER_END);
    }

    #[test]
    fn ramp_from_slow_path() {
        let mut p = ProgressAggregator::new();
        p.begin_transfer(1);
        p.chunk_completed();
        let plan = p.ramp(Duration::from_millis(300));
        assert_eq!(plan.steps, vec![100]);
        assert_eq!(plan.tick, Duration::from_millis(300));
    }

    #[test]
    fn ramp_from_fast_path() {
        let mut p = ProgressAggregator::new();
        p.hashing(1.0);
        let plan = p.ramp(Duration::from_millis(300));
        assert_eq!(plan.steps.len(), 18);
        assert_eq!(plan.steps[0], 15);
        assert_eq!(*plan.steps.last().unwrap(), 100);
        assert_eq!(plan.tick, Duration::from_millis(300) / 18);

        for step in plan.steps {
            assert_eq!(p.finish_step(step), Some(step));
        }
        assert_eq!(p.current(), 100);
    }

    #[test]
    fn zero_duration_ramp_is_single_jump() {
        let mut p = ProgressAggregator::new();
        p.hashing(0.5);
        let plan = p.ramp(Duration::ZERO);
        assert_eq!(plan.steps, vec![100]);
        assert_eq!(plan.tick, Duration::ZERO);
    }

    #[test]
    fn ramp_at_done_is_empty() {
        let mut p = ProgressAggregator::new();
        p.finish_step(100);
        assert!(p.ramp(Duration::from_millis(300)).steps.is_empty());
        assert!(p.ramp(Duration::ZERO).steps.is_empty());
    }
}
