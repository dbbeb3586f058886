/// Fixed-window moving average with an O(1) running sum.
///
/// Until the window has been filled once, the average is taken over the
/// samples received so far rather than the whole (zero-initialised) buffer.
pub struct MovingAverage<const N: usize> {
    buffer: [f32; N],
    cursor: usize,
    sum: f32,
    filled: usize,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0.0; N],
            cursor: 0,
            sum: 0.0,
            filled: 0,
        }
    }

    /// Push one sample, evicting the oldest, and return the new average.
    pub fn update(&mut self, sample: f32) -> f32 {
        self.sum -= self.buffer[self.cursor];
        self.buffer[self.cursor] = sample;
        self.sum += sample;

        self.cursor = (self.cursor + 1) % N;
        if self.filled < N {
            self.filled += 1;
        }

        // Re-derive the sum once per lap so f32 rounding cannot accumulate
        // over the lifetime of the process.
        if self.cursor == 0 && self.filled == N {
            self.sum = self.buffer.iter().sum();
        }

        self.sum / self.filled as f32
    }

    /// Current average, `None` before the first sample.
    pub fn average(&self) -> Option<f32> {
        if self.filled == 0 {
            None
        } else {
            Some(self.sum / self.filled as f32)
        }
    }

    /// Number of valid samples in the window.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn reset(&mut self) {
        self.buffer = [0.0; N];
        self.cursor = 0;
        self.sum = 0.0;
        self.filled = 0;
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(samples: &[f32]) -> f32 {
        samples.iter().sum::<f32>() / samples.len() as f32
    }

    #[test]
    fn test_empty_has_no_average() {
        let filter = MovingAverage::<20>::new();
        assert!(filter.average().is_none());
        assert!(filter.is_empty());
        assert_eq!(filter.capacity(), 20);
    }

    #[test]
    fn test_warmup_divides_by_fill_count() {
        let mut filter = MovingAverage::<20>::new();
        let samples: Vec<f32> = (0..20).map(|i| 60.0 + i as f32 * 0.7).collect();

        for (i, &s) in samples.iter().enumerate() {
            let avg = filter.update(s);
            let expected = mean(&samples[..=i]);
            assert!((avg - expected).abs() < 1e-3, "sample {}: {} != {}", i, avg, expected);
        }
        assert!(filter.is_full());
    }

    #[test]
    fn test_eviction_keeps_most_recent_window() {
        let mut filter = MovingAverage::<20>::new();
        let samples: Vec<f32> = (0..57).map(|i| ((i * 37) % 11) as f32 - 3.5).collect();

        for (i, &s) in samples.iter().enumerate() {
            let avg = filter.update(s);
            let start = (i + 1).saturating_sub(20);
            let expected = mean(&samples[start..=i]);
            assert!((avg - expected).abs() < 1e-3, "sample {}: {} != {}", i, avg, expected);
        }
        assert_eq!(filter.len(), 20);
    }

    #[test]
    fn test_running_sum_matches_buffer() {
        let mut filter = MovingAverage::<7>::new();
        for i in 0..30 {
            filter.update(1000.0 + (i % 3) as f32 * 0.1);
            let direct: f32 = filter.buffer.iter().sum();
            assert!((filter.sum - direct).abs() < 1e-2);
        }
    }

    #[test]
    fn test_no_zero_bias_after_warmup() {
        let mut filter = MovingAverage::<100>::new();
        let mut avg = 0.0;
        for _ in 0..5 {
            avg = filter.update(900.0);
        }
        assert!((avg - 900.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset() {
        let mut filter = MovingAverage::<4>::new();
        filter.update(5.0);
        filter.update(7.0);
        filter.reset();
        assert!(filter.average().is_none());
        assert!((filter.update(3.0) - 3.0).abs() < 1e-6);
    }
}
