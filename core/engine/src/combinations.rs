//! FILENAME: core/engine/src/combinations.rs
//! PURPOSE: Iterative subset enumeration for interaction expansion.
//! CONTEXT: A `*` group over n operands produces one term per non-empty
//! subset of operands. Subsets are yielded by increasing size, and in
//! lexicographic index order within a size, so generated columns come out
//! in a stable order. No recursion is involved; the 2^n cost is visible in
//! the caller's loop.

/// Yields every k-element combination of `0..n` in lexicographic order.
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }

        let current = self.indices.clone();
        let k = self.indices.len();

        // Find the rightmost index that can still move right.
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                break;
            }
        }

        Some(current)
    }
}

/// All non-empty subsets of `0..n`, smallest first.
pub fn subsets_by_size(n: usize) -> impl Iterator<Item = Vec<usize>> {
    (1..=n).flat_map(move |k| Combinations::new(n, k))
}
