//! Test RNG: deterministic `DeterministicRng` implementation for tests.

use verdant_core::rng::DeterministicRng;

/// An RNG that replays a predetermined sequence of indices, starting over
/// once it is exhausted. Each value is reduced modulo the requested bound.
#[derive(Debug)]
pub struct SequenceRng {
    values: Vec<usize>,
    index: usize,
}

impl SequenceRng {
    /// Create a new `SequenceRng` with the given values.
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        assert!(!values.is_empty(), "SequenceRng needs at least one value");
        Self { values, index: 0 }
    }

    /// An RNG that yields `0, 1, 2, ...` modulo the bound.
    #[must_use]
    pub fn counting(len: usize) -> Self {
        Self::new((0..len.max(1)).collect())
    }
}

impl DeterministicRng for SequenceRng {
    fn next_index(&mut self, upper: usize) -> usize {
        let val = self.values[self.index % self.values.len()];
        self.index += 1;
        val % upper
    }
}
