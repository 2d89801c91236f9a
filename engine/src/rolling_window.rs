use std::collections::VecDeque;

pub const DEFAULT_WINDOW_SIZE: usize = 200;

/// Count-bounded rolling window of numeric samples.
///
/// Samples are kept in arrival order. Once the window holds `capacity` samples,
/// every push evicts the oldest one (FIFO), so `len() <= capacity` always holds.
///
/// Statistics are computed over the samples currently held:
/// - `mean()` is the arithmetic mean
/// - `population_stdev()` divides by N, not N - 1: the window describes the
///   recent observed dispersion, it is not a sample drawn from a larger population
///
/// Both return `0.0` for an empty window. That value is a convention, not a
/// baseline; callers gate on `len()` before trusting either number.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones while over capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);

        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn population_stdev(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        let n = self.values.len() as f64;
        let mean = self.mean();
        let sq_sum: f64 = self.values.iter().map(|v| (v - mean) * (v - mean)).sum();

        (sq_sum / n).sqrt()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn oldest(&self) -> Option<f64> {
        self.values.front().copied()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, values: &[f64]) -> RollingWindow {
        let mut w = RollingWindow::new(capacity);
        for v in values {
            w.push(*v);
        }
        w
    }

    #[test]
    fn empty_window_reports_zero_stats() {
        let w = RollingWindow::new(10);

        assert!(w.is_empty());
        assert_eq!(w.mean(), 0.0);
        assert_eq!(w.population_stdev(), 0.0);
        assert_eq!(w.latest(), None);
        assert_eq!(w.oldest(), None);
    }

    #[test]
    fn stdev_uses_population_divisor() {
        // mean = 5, squared deviations sum to 32, 32 / 8 = 4
        let w = filled(16, &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);

        assert!((w.mean() - 5.0).abs() < 1e-12);
        assert!((w.population_stdev() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_samples_have_zero_stdev() {
        let w = filled(32, &[100.0; 20]);

        assert!((w.mean() - 100.0).abs() < 1e-12);
        assert_eq!(w.population_stdev(), 0.0);
    }

    #[test]
    fn overflow_keeps_last_capacity_values_in_order() {
        let cap = 200;
        let mut w = RollingWindow::new(cap);
        for i in 0..=cap {
            w.push(i as f64);
        }

        assert_eq!(w.len(), cap);
        assert_eq!(w.oldest(), Some(1.0));
        assert_eq!(w.latest(), Some(cap as f64));

        let expected: Vec<f64> = (1..=cap).map(|i| i as f64).collect();
        assert_eq!(w.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let w = filled(8, &[1.5, 2.25, 9.0, -3.0, 0.125]);

        let (m1, s1) = (w.mean(), w.population_stdev());
        let (m2, s2) = (w.mean(), w.population_stdev());

        assert_eq!(m1.to_bits(), m2.to_bits());
        assert_eq!(s1.to_bits(), s2.to_bits());
    }

    #[test]
    fn zero_capacity_window_stays_empty() {
        let w = filled(0, &[1.0, 2.0]);

        assert!(w.is_empty());
        assert_eq!(w.capacity(), 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn window_invariants_hold(
            capacity in 1usize..64,
            values in prop::collection::vec(-1.0e6..1.0e6f64, 0..256)
        ) {
            let mut w = RollingWindow::new(capacity);
            for v in &values {
                w.push(*v);
                // --- INVARIANT 1: never over capacity ---
                prop_assert!(w.len() <= capacity);
            }

            // --- INVARIANT 2: holds exactly the most recent values, in arrival order ---
            let keep = values.len().min(capacity);
            let expected = &values[values.len() - keep..];
            prop_assert_eq!(w.iter().collect::<Vec<_>>(), expected.to_vec());

            // --- INVARIANT 3: stdev is non-negative and queries are pure ---
            let s = w.population_stdev();
            prop_assert!(s >= 0.0);
            prop_assert_eq!(s.to_bits(), w.population_stdev().to_bits());
            prop_assert_eq!(w.mean().to_bits(), w.mean().to_bits());
        }
    }
}
