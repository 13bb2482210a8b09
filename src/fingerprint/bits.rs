use std::fmt::{Display, Formatter, Result as FmtResult};

const WORD: usize = u64::BITS as usize;

/// A fixed-length bit vector.
///
/// Displays as a string of `0` and `1` characters, bit 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitVector {
    len: usize,
    words: Vec<u64>,
}

impl BitVector {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD)],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, index: usize) {
        assert!(index < self.len, "bit {index} out of range for {} bits", self.len);
        self.words[index / WORD] |= 1u64 << (index % WORD);
    }

    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD] & (1u64 << (index % WORD)) != 0
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Indices of the set bits in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&index| self.get(index))
    }
}

impl Display for BitVector {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let text: String = (0..self.len)
            .map(|index| if self.get(index) { '1' } else { '0' })
            .collect();
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut bits = BitVector::new(130);
        assert_eq!(bits.len(), 130);
        assert_eq!(bits.count_ones(), 0);
        bits.set(0);
        bits.set(64);
        bits.set(129);
        bits.set(64);
        assert!(bits.get(0) && bits.get(64) && bits.get(129));
        assert!(!bits.get(1) && !bits.get(130));
        assert_eq!(bits.count_ones(), 3);
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![0, 64, 129]);
    }

    #[test]
    fn test_display() {
        let mut bits = BitVector::new(6);
        bits.set(1);
        bits.set(5);
        assert_eq!(bits.to_string(), "010001");
        assert_eq!(BitVector::new(0).to_string(), "");
        assert!(BitVector::new(0).is_empty());
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_range() {
        BitVector::new(8).set(8);
    }
}
