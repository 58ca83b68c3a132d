//! Stride-based downsampling of the produced sample stream.

/// Keeps every Nth sample of a continuous stream.
///
/// The position counter survives across batches, so the selection depends only on a
/// sample's index in the whole stream: index `i` is kept when `i % stride == 0`.
#[derive(Debug, Clone)]
pub struct Downsampler {
    stride: usize,
    position: usize,
}

impl Downsampler {
    /// Creates a downsampler. A stride of 0 is treated as 1.
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
            position: 0,
        }
    }

    /// Returns whether the next sample of the stream is kept.
    pub fn keep(&mut self) -> bool {
        let keep = self.position == 0;
        self.position = (self.position + 1) % self.stride;
        keep
    }

    /// Filters one batch, preserving order.
    pub fn select<'a, I>(&'a mut self, batch: I) -> impl Iterator<Item = i16> + 'a
    where
        I: IntoIterator<Item = i16>,
        I::IntoIter: 'a,
    {
        batch.into_iter().filter(move |_| self.keep())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride_fifty_over_two_hundred_samples() {
        let mut downsampler = Downsampler::new(50);
        let batch: Vec<i16> = (0..200).collect();
        let kept: Vec<i16> = downsampler.select(batch).collect();
        assert_eq!(kept, vec![0, 50, 100, 150]);
    }

    #[test]
    fn test_stride_one_keeps_everything_in_order() {
        let mut downsampler = Downsampler::new(1);
        let kept: Vec<i16> = downsampler.select(vec![10, -20, 30]).collect();
        assert_eq!(kept, vec![10, -20, 30]);
    }

    #[test]
    fn test_counter_persists_across_batches() {
        let mut downsampler = Downsampler::new(4);
        let first: Vec<i16> = downsampler.select(vec![0, 1, 2]).collect();
        let second: Vec<i16> = downsampler.select(vec![3, 4, 5, 6, 7, 8]).collect();
        assert_eq!(first, vec![0]);
        assert_eq!(second, vec![4, 8]);
    }

    #[test]
    fn test_stride_changes_selection() {
        let stream: Vec<i16> = (0..12).collect();
        let every_third: Vec<i16> = Downsampler::new(3).select(stream.clone()).collect();
        let every_fifth: Vec<i16> = Downsampler::new(5).select(stream).collect();
        assert_eq!(every_third, vec![0, 3, 6, 9]);
        assert_eq!(every_fifth, vec![0, 5, 10]);
    }

    #[test]
    fn test_zero_stride_behaves_like_one() {
        let mut downsampler = Downsampler::new(0);
        assert!(downsampler.keep());
        assert!(downsampler.keep());
    }
}
