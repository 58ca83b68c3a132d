//! Bounded FIFO of the most recently retained samples.

use std::collections::VecDeque;

/// Columns reserved left and right of the plot.
pub const PLOT_MARGIN: u16 = 20;

/// Window capacity for a viewport `width` columns wide.
pub fn capacity_for_width(width: u16) -> usize {
    usize::from(width.saturating_sub(PLOT_MARGIN))
}

/// Fixed-capacity sliding window of samples in arrival order.
///
/// Pushing into a full window evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: VecDeque<i16>,
    capacity: usize,
}

impl SlidingWindow {
    /// Creates an empty window.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a window already full of silence, so the plot spans its whole width
    /// before any sample arrives.
    pub fn filled(capacity: usize) -> Self {
        let mut window = Self::new(capacity);
        window.samples.resize(capacity, 0);
        window
    }

    pub fn push(&mut self, sample: i16) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = i16> + '_ {
        self.samples.iter().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_from_width() {
        assert_eq!(capacity_for_width(100), 80);
        assert_eq!(capacity_for_width(20), 0);
        assert_eq!(capacity_for_width(5), 0);
    }

    #[test]
    fn test_keeps_most_recent_samples_in_order() {
        let mut window = SlidingWindow::new(capacity_for_width(100));
        for sample in 1..=85 {
            window.push(sample);
        }

        let contents: Vec<i16> = window.snapshot().collect();
        assert_eq!(contents, (6..=85).collect::<Vec<i16>>());
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = SlidingWindow::new(3);
        for sample in 0..10 {
            window.push(sample);
            assert!(window.snapshot().len() <= window.capacity());
        }
        assert_eq!(window.snapshot().collect::<Vec<_>>(), vec![7, 8, 9]);
    }

    #[test]
    fn test_partial_fill_keeps_everything() {
        let mut window = SlidingWindow::new(5);
        window.push(-1);
        window.push(2);
        assert_eq!(window.snapshot().collect::<Vec<_>>(), vec![-1, 2]);
    }

    #[test]
    fn test_filled_starts_with_silence() {
        let mut window = SlidingWindow::filled(4);
        assert_eq!(window.snapshot().collect::<Vec<_>>(), vec![0, 0, 0, 0]);
        window.push(9);
        assert_eq!(window.snapshot().collect::<Vec<_>>(), vec![0, 0, 0, 9]);
    }

    #[test]
    fn test_snapshot_does_not_consume() {
        let mut window = SlidingWindow::new(2);
        window.push(1);
        let _ = window.snapshot().count();
        assert_eq!(window.snapshot().len(), 1);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut window = SlidingWindow::new(0);
        window.push(1);
        assert_eq!(window.snapshot().len(), 0);
    }
}
