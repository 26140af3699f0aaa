#[cfg(feature = "hprof")]
use coarse_prof::profile;

/// Read and write access to a region-to-region visibility relation.
///
/// Bits are only ever set, never cleared. The search routines only talk to
/// the relation through this trait.
pub trait VisibilityStore {
    fn region_count(&self) -> usize;

    /// Marks region `to` as visible from region `from`
    fn flag_visible(&mut self, from: usize, to: usize);

    /// Returns true if region `to` is visible from region `from`
    fn is_visible(&self, from: usize, to: usize) -> bool;

    #[inline]
    fn flag_mutual(&mut self, a: usize, b: usize) {
        self.flag_visible(a, b);
        self.flag_visible(b, a);
    }

    /// Number of visible regions per region, on average. Ranges from 1.0
    /// (every region only sees itself) to `region_count`.
    fn average_visibility(&self) -> f64 {
        let count = self.region_count();
        if count == 0 {
            return 0.0;
        }
        let mut visible = 0usize;
        for from in 0..count {
            for to in 0..count {
                if self.is_visible(from, to) {
                    visible += 1;
                }
            }
        }
        visible as f64 / count as f64
    }
}

/// Bit-packed N x N visibility matrix, bit `from * N + to` of a `u32` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityMatrix {
    region_count: usize,
    data: Vec<u32>,
}

impl VisibilityMatrix {
    /// Creates a matrix for `region_count` regions with every bit cleared
    pub fn new(region_count: usize) -> Self {
        #[cfg(feature = "hprof")]
        profile!("visibility_matrix_new");
        let bit_count = region_count * region_count;
        let words_needed = bit_count.div_ceil(32);

        Self {
            region_count,
            data: vec![0; words_needed],
        }
    }

    /// Wraps previously stored words. `None` if the word count does not fit
    /// `region_count`.
    pub fn from_words(region_count: usize, data: Vec<u32>) -> Option<Self> {
        if data.len() != (region_count * region_count).div_ceil(32) {
            return None;
        }
        Some(Self { region_count, data })
    }

    #[inline]
    fn bit(&self, from: usize, to: usize) -> (usize, u32) {
        let bit_index = from * self.region_count + to;
        (bit_index >> 5, 1u32 << (bit_index & 31))
    }

    /// The packed words, in bit order
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.data
    }

    /// Returns all regions visible from the given region
    pub fn visible_from(&self, from: usize) -> Vec<usize> {
        (0..self.region_count)
            .filter(|&to| self.is_visible(from, to))
            .collect()
    }

    /// Total number of set bits
    pub fn visible_count(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_symmetric(&self) -> bool {
        for a in 0..self.region_count {
            for b in a + 1..self.region_count {
                if self.is_visible(a, b) != self.is_visible(b, a) {
                    return false;
                }
            }
        }
        true
    }

    /// Returns memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.data.len() * std::mem::size_of::<u32>()
    }
}

impl VisibilityStore for VisibilityMatrix {
    #[inline]
    fn region_count(&self) -> usize {
        self.region_count
    }

    #[inline]
    fn flag_visible(&mut self, from: usize, to: usize) {
        let (word, mask) = self.bit(from, to);
        self.data[word] |= mask;
    }

    #[inline]
    fn is_visible(&self, from: usize, to: usize) -> bool {
        let (word, mask) = self.bit(from, to);
        self.data[word] & mask != 0
    }

    fn average_visibility(&self) -> f64 {
        if self.region_count == 0 {
            return 0.0;
        }
        self.visible_count() as f64 / self.region_count as f64
    }
}
