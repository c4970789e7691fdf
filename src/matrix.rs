//! Incremental GF(2) linear algebra.
//!
//! Rows arrive one at a time as sieving produces relations; the matrix keeps
//! itself in row-echelon form and reports, at the exact moment it happens,
//! any linear combination of the added rows that XORs to zero. Each row
//! carries an opaque identity so the caller can recover which relations
//! participate in a dependency.

/// A fixed-length bit vector backed by u64 words.
struct BitVec {
    words: Vec<u64>,
}

impl BitVec {
    fn new(bits: usize) -> Self {
        BitVec {
            words: vec![0; (bits + 63) / 64],
        }
    }

    fn get(&self, i: usize) -> bool {
        self.words[i / 64] >> (i % 64) & 1 != 0
    }

    fn set(&mut self, i: usize) {
        self.words[i / 64] |= 1u64 << (i % 64);
    }

    fn toggle(&mut self, i: usize) {
        self.words[i / 64] ^= 1u64 << (i % 64);
    }

    fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Index of the lowest set bit. Panics on an all-zero vector.
    fn first_set(&self) -> usize {
        for (i, &w) in self.words.iter().enumerate() {
            if w != 0 {
                return i * 64 + w.trailing_zeros() as usize;
            }
        }
        panic!("first_set on an all-zero bit vector");
    }

    /// self ^= other. Both vectors must have the same length.
    fn xor_with(&mut self, other: &BitVec) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w ^= o;
        }
    }
}

struct Row {
    /// 2n bits: the first n are the reduced factor-parity vector, the
    /// second n record which original inserts were combined to form it.
    bits: BitVec,
    /// Pivot column, the first set bit of the parity half.
    pivot: usize,
}

/// A GF(2) matrix over column indexes 0 <= i < n, with one identity of type
/// `R` per stored row.
pub struct Gf2Matrix<R> {
    n: usize,
    ids: Vec<R>,
    rows: Vec<Row>,
}

impl<R: Clone> Gf2Matrix<R> {
    /// A new matrix handling column indexes 0 <= i < n.
    pub fn new(n: usize) -> Self {
        Gf2Matrix {
            n,
            ids: Vec::with_capacity(n),
            rows: Vec::with_capacity(n),
        }
    }

    /// Number of stored (linearly independent) rows.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Add the vector whose set bits are the given indexes; an index
    /// appearing an odd number of times sets its bit.
    ///
    /// Returns `None` if the row is independent (it is stored), or the
    /// identities of a set of added rows (including this one) whose XOR
    /// is the zero vector. Dependent rows are not stored.
    pub fn add_row(&mut self, indexes: &[usize], id: R) -> Option<Vec<R>> {
        let mut bits = BitVec::new(2 * self.n);
        for &i in indexes {
            bits.toggle(i);
        }
        if bits.is_zero() {
            // The input vector itself is zero.
            return Some(vec![id]);
        }
        for row in &self.rows {
            if bits.get(row.pivot) {
                bits.xor_with(&row.bits);
            }
        }
        let pivot = bits.first_set();
        if pivot < self.n {
            bits.set(self.n + self.ids.len());
            self.ids.push(id);
            self.rows.push(Row { bits, pivot });
            return None;
        }

        // The parity half vanished: the witness half names the rows whose
        // combination is zero.
        let mut dependency = vec![id];
        for i in 0..self.ids.len() {
            if bits.get(self.n + i) {
                dependency.push(self.ids[i].clone());
            }
        }
        Some(dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_rows() {
        let mut m = Gf2Matrix::new(3);
        assert!(m.add_row(&[0], "a").is_none());
        assert!(m.add_row(&[1], "b").is_none());
        assert!(m.add_row(&[2], "c").is_none());
        assert_eq!(m.rows(), 3);
    }

    #[test]
    fn test_cancelling_input() {
        // All bits toggle away: reported immediately, nothing stored.
        let mut m = Gf2Matrix::new(4);
        assert_eq!(m.add_row(&[2, 2], "x"), Some(vec!["x"]));
        assert_eq!(m.rows(), 0);
    }

    #[test]
    fn test_duplicate_row() {
        let mut m = Gf2Matrix::new(3);
        assert!(m.add_row(&[0, 2], 1).is_none());
        let dep = m.add_row(&[0, 2], 2).unwrap();
        assert_eq!(dep, vec![2, 1]);
        assert_eq!(m.rows(), 1);
    }

    #[test]
    fn test_three_row_dependency() {
        // [0,1] ^ [1,2] ^ [0,2] = 0.
        let mut m = Gf2Matrix::new(3);
        assert!(m.add_row(&[0, 1], "r1").is_none());
        assert!(m.add_row(&[1, 2], "r2").is_none());
        let dep = m.add_row(&[0, 2], "r3").unwrap();
        let mut dep = dep;
        dep.sort();
        assert_eq!(dep, vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_odd_multiplicity() {
        // An index appearing twice contributes nothing; three times, one bit.
        let mut m = Gf2Matrix::new(3);
        assert!(m.add_row(&[1, 1, 1], "a").is_none());
        let dep = m.add_row(&[1], "b").unwrap();
        let mut dep = dep;
        dep.sort();
        assert_eq!(dep, vec!["a", "b"]);
    }

    #[test]
    fn test_dependency_after_reduction() {
        // The third row equals the XOR of the first two, so it has to reduce
        // through both pivots before the cancellation shows.
        let mut m = Gf2Matrix::new(4);
        assert!(m.add_row(&[0, 1, 2], 0).is_none());
        assert!(m.add_row(&[1, 2, 3], 1).is_none());
        let mut dep = m.add_row(&[0, 3], 2).unwrap();
        dep.sort();
        assert_eq!(dep, vec![0, 1, 2]);
        assert_eq!(m.rows(), 2);
    }
}
