//! Inner-sweep index enumeration
//!
//! The four inner indices are visited in lexicographic nested order with the
//! first index outermost. This ordering is a contract: checkpoint row counts
//! and resume reasoning depend on a stable, deterministic enumeration.

/// Iterator over the Cartesian product `x3, x4, x5, x6 in 0..=n`.
#[derive(Debug, Clone)]
pub struct InnerGrid {
    side: usize,
    next: Option<[usize; 4]>,
}

impl InnerGrid {
    /// A grid of `(n + 1)^4` tuples for resolution `n`.
    pub fn new(resolution: usize) -> Self {
        Self {
            side: resolution + 1,
            next: Some([0; 4]),
        }
    }

    /// Total number of tuples the grid yields.
    pub fn tuple_count(&self) -> u64 {
        (self.side as u64).pow(4)
    }
}

impl Iterator for InnerGrid {
    type Item = [usize; 4];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        // Advance like a fixed-base odometer, last index fastest
        let mut incremented = current;
        let mut pos = 3;
        loop {
            incremented[pos] += 1;
            if incremented[pos] < self.side {
                self.next = Some(incremented);
                break;
            }
            incremented[pos] = 0;
            if pos == 0 {
                self.next = None;
                break;
            }
            pos -= 1;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_resolution_single_tuple() {
        let tuples: Vec<[usize; 4]> = InnerGrid::new(0).collect();
        assert_eq!(tuples, vec![[0, 0, 0, 0]]);
    }

    #[test]
    fn test_tuple_count() {
        assert_eq!(InnerGrid::new(0).tuple_count(), 1);
        assert_eq!(InnerGrid::new(1).tuple_count(), 16);
        assert_eq!(InnerGrid::new(8).tuple_count(), 6561);
    }

    #[test]
    fn test_visits_each_tuple_exactly_once() {
        let tuples: Vec<[usize; 4]> = InnerGrid::new(2).collect();
        assert_eq!(tuples.len(), 81);
        let unique: std::collections::HashSet<[usize; 4]> = tuples.iter().copied().collect();
        assert_eq!(unique.len(), 81);
    }

    #[test]
    fn test_lexicographic_order() {
        let tuples: Vec<[usize; 4]> = InnerGrid::new(1).collect();
        assert_eq!(tuples[0], [0, 0, 0, 0]);
        assert_eq!(tuples[1], [0, 0, 0, 1]);
        assert_eq!(tuples[2], [0, 0, 1, 0]);
        assert_eq!(tuples[15], [1, 1, 1, 1]);
        let mut sorted = tuples.clone();
        sorted.sort();
        assert_eq!(tuples, sorted);
    }
}
