use serde::{Deserialize, Serialize};

/// Row-major boolean matrix packed into 64-bit words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    /// words per row, rows never share a word
    stride: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        let stride = cols.div_ceil(64);
        Self {
            rows,
            cols,
            stride,
            words: vec![0; rows * stride],
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn locate(&self, row: usize, col: usize) -> (usize, u64) {
        debug_assert!(row < self.rows && col < self.cols);
        (row * self.stride + col / 64, 1u64 << (col % 64))
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        let (word, mask) = self.locate(row, col);
        self.words[word] & mask != 0
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        let (word, mask) = self.locate(row, col);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
    }

    /// set columns of one row
    pub fn row_ones(&self, row: usize) -> Vec<usize> {
        (0..self.cols).filter(|&c| self.get(row, c)).collect()
    }

    /// set rows of one column
    pub fn col_ones(&self, col: usize) -> Vec<usize> {
        (0..self.rows).filter(|&r| self.get(r, col)).collect()
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_do_not_leak_across_rows() {
        let mut bits = BitMatrix::new(3, 65);
        bits.set(0, 64, true);
        bits.set(1, 0, true);
        assert!(bits.get(0, 64));
        assert!(!bits.get(1, 64));
        assert!(bits.get(1, 0));
        assert_eq!(bits.count_ones(), 2);
        assert_eq!(bits.col_ones(64), vec![0]);

        bits.set(0, 64, false);
        assert_eq!(bits.row_ones(0), Vec::<usize>::new());
    }
}
