use serde::{Deserialize, Serialize};

/// Seeded generator driving workloads; identical seeds give identical runs
/// on every platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Derive an independent stream, e.g. one per grouping shape.
    #[must_use]
    pub const fn fork(&self, stream: u64) -> Self {
        Self::new(self.state.rotate_left(17) ^ stream.wrapping_mul(0xA24B_AED4_963E_E407))
    }

    #[must_use]
    pub const fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        // Low bits of an LCG cycle with short periods.
        self.state >> 17
    }

    /// Next value in `[0, upper)`; always 0 when `upper` is 0.
    #[must_use]
    pub const fn below(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() % upper as u64) as usize
    }

    /// Bernoulli trial with integer percent.
    #[must_use]
    pub const fn percent(&mut self, percent: u8) -> bool {
        match percent {
            0 => false,
            100.. => true,
            p => self.below(100) < p as usize,
        }
    }

    /// A uniformly chosen element, `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.below(items.len()))
    }

    /// A random subset of `items`, each kept with probability `percent`.
    pub fn subset<T: Clone>(&mut self, items: &[T], percent: u8) -> Vec<T> {
        items
            .iter()
            .filter(|_| self.percent(percent))
            .cloned()
            .collect()
    }
}
