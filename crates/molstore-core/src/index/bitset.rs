use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

struct RangeWords {
    first: usize,
    last: usize,
    first_mask: u64,
    last_mask: u64,
}

impl RangeWords {
    fn mask(&self, word: usize) -> u64 {
        let mut mask = !0;
        if word == self.first {
            mask &= self.first_mask;
        }
        if word == self.last {
            mask &= self.last_mask;
        }
        mask
    }
}

/// A fixed-length packed set of indices in `[0, length)`.
///
/// Bits past `length` in the last word are always zero, so word-wise population
/// counts and comparisons never see padding.
///
/// Binary operations accept sets of a different length. The other set is treated as
/// empty beyond its own length and the receiver keeps its length: a union never grows
/// the receiver, an intersection clears everything past the shorter length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitSet {
    length: usize,
    words: Vec<u64>,
}

impl BitSet {
    /// Creates a set of the given length with no index set.
    pub fn new(length: usize) -> Self {
        Self {
            length,
            words: vec![0; length.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a set of the given length with every index set.
    pub fn filled(length: usize) -> Self {
        let mut set = Self::new(length);
        set.set_all();
        set
    }

    /// Creates a set of the given length containing `indices`.
    pub fn from_indices(length: usize, indices: &[usize]) -> Self {
        let mut set = Self::new(length);
        set.set_bits(indices);
        set
    }

    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn locate(index: usize) -> (usize, u64) {
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    fn last_word_mask(&self) -> u64 {
        match self.length % WORD_BITS {
            0 => !0,
            rest => (1u64 << rest) - 1,
        }
    }

    fn mask_padding(&mut self) {
        let mask = self.last_word_mask();
        if let Some(last) = self.words.last_mut() {
            *last &= mask;
        }
    }

    /// Mask of bits `[lo, hi]` within one word.
    fn word_range_mask(lo: usize, hi: usize) -> u64 {
        let upper = if hi == WORD_BITS - 1 { !0 } else { (1u64 << (hi + 1)) - 1 };
        upper & !((1u64 << lo) - 1)
    }

    /// Word span of the inclusive range `[start, end]`, clamped to the set.
    fn range_words(&self, start: usize, end: usize) -> Option<RangeWords> {
        if self.length == 0 || start >= self.length {
            return None;
        }
        let end = end.min(self.length - 1);
        (start <= end).then(|| RangeWords {
            first: start / WORD_BITS,
            last: end / WORD_BITS,
            first_mask: Self::word_range_mask(start % WORD_BITS, WORD_BITS - 1),
            last_mask: Self::word_range_mask(0, end % WORD_BITS),
        })
    }

    fn update_range(&mut self, start: usize, end: usize, op: impl Fn(u64, u64) -> u64) {
        if let Some(range) = self.range_words(start, end) {
            for word in range.first..=range.last {
                self.words[word] = op(self.words[word], range.mask(word));
            }
        }
    }

    fn test_range(&self, start: usize, end: usize, pred: impl Fn(u64, u64) -> bool) -> bool {
        self.range_words(start, end).is_none_or(|range| {
            (range.first..=range.last).all(|word| pred(self.words[word], range.mask(word)))
        })
    }

    pub fn get(&self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        self.words[word] & bit != 0
    }

    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.length);
        let (word, bit) = Self::locate(index);
        self.words[word] |= bit;
    }

    pub fn clear(&mut self, index: usize) {
        let (word, bit) = Self::locate(index);
        self.words[word] &= !bit;
    }

    pub fn flip(&mut self, index: usize) {
        debug_assert!(index < self.length);
        let (word, bit) = Self::locate(index);
        self.words[word] ^= bit;
    }

    /// Sets every index in the inclusive range `[start, end]`.
    pub fn set_range(&mut self, start: usize, end: usize) {
        self.update_range(start, end, |word, mask| word | mask);
    }

    /// Clears every index in the inclusive range `[start, end]`.
    pub fn clear_range(&mut self, start: usize, end: usize) {
        self.update_range(start, end, |word, mask| word & !mask);
    }

    pub fn set_bits(&mut self, indices: &[usize]) {
        for &index in indices {
            self.set(index);
        }
    }

    pub fn clear_bits(&mut self, indices: &[usize]) {
        for &index in indices {
            self.clear(index);
        }
    }

    pub fn set_all(&mut self) {
        self.words.fill(!0);
        self.mask_padding();
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    pub fn flip_all(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
        self.mask_padding();
    }

    /// Whether every index in the inclusive range is set.
    pub fn is_range_set(&self, start: usize, end: usize) -> bool {
        self.test_range(start, end, |word, mask| word & mask == mask)
    }

    /// Whether every index in the inclusive range is clear.
    pub fn is_range_clear(&self, start: usize, end: usize) -> bool {
        self.test_range(start, end, |word, mask| word & mask == 0)
    }

    pub fn is_all_set(&self) -> bool {
        self.size() == self.length
    }

    pub fn is_all_clear(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Whether all of the given indices are set.
    pub fn is_set(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&i| self.get(i))
    }

    /// Whether all of the given indices are clear.
    pub fn is_clear(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&i| !self.get(i))
    }

    /// Number of set indices.
    pub fn size(&self) -> usize {
        let count: usize = self.words.iter().map(|w| w.count_ones() as usize).sum();
        count.min(self.length)
    }

    /// Removes every index that is set in `other`.
    pub fn difference(&mut self, other: &BitSet) {
        for (word, &o) in self.words.iter_mut().zip(&other.words) {
            *word &= !o;
        }
    }

    /// Adds every index that is set in `other` and lies within this set's length.
    pub fn union(&mut self, other: &BitSet) {
        for (word, &o) in self.words.iter_mut().zip(&other.words) {
            *word |= o;
        }
        self.mask_padding();
    }

    /// Keeps only the indices that are also set in `other`.
    pub fn intersection(&mut self, other: &BitSet) {
        let shared = other.words.len().min(self.words.len());
        for (word, &o) in self.words.iter_mut().zip(&other.words) {
            *word &= o;
        }
        self.words[shared..].fill(0);
    }

    /// Whether the two sets share at least one index.
    pub fn intersects(&self, other: &BitSet) -> bool {
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    /// Number of indices set in both sets.
    pub fn intersection_size(&self, other: &BitSet) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Returns a new set, as long as the shorter operand, with the shared indices.
    pub fn make_intersection(&self, other: &BitSet) -> BitSet {
        let mut result = BitSet::new(self.length.min(other.length));
        for ((word, a), b) in result.words.iter_mut().zip(&self.words).zip(&other.words) {
            *word = a & b;
        }
        result.mask_padding();
        result
    }

    /// Iterates the set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(word_index * WORD_BITS + bit)
            })
        })
    }

    /// Calls `f(index, counter)` for every set index in ascending order, where `counter`
    /// counts the visited indices starting at zero.
    pub fn for_each(&self, mut f: impl FnMut(usize, usize)) {
        for (counter, index) in self.iter().enumerate() {
            f(index, counter);
        }
    }

    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Formats the set as an atom index selection, `NONE` when empty.
    pub fn to_sele_string(&self) -> String {
        if self.is_all_clear() {
            "NONE".to_string()
        } else {
            format!("@{}", self.iter().join(","))
        }
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod point_ops {
        use super::*;

        #[test]
        fn set_then_get_and_clear_then_get() {
            let mut set = BitSet::new(130);
            for i in [0, 1, 63, 64, 65, 127, 128, 129] {
                set.set(i);
                assert!(set.get(i));
                set.clear(i);
                assert!(!set.get(i));
            }
        }

        #[test]
        fn flip_toggles_a_single_index() {
            let mut set = BitSet::new(10);
            set.flip(3);
            assert!(set.get(3));
            set.flip(3);
            assert!(!set.get(3));
        }

        #[test]
        fn set_bits_and_clear_bits_touch_only_given_indices() {
            let mut set = BitSet::new(100);
            set.set_bits(&[2, 70, 99]);
            assert!(set.is_set(&[2, 70, 99]));
            assert_eq!(set.size(), 3);
            set.clear_bits(&[70]);
            assert!(set.is_clear(&[70, 3]));
            assert_eq!(set.to_vec(), vec![2, 99]);
        }
    }

    mod bulk_ops {
        use super::*;

        #[test]
        fn set_all_and_clear_all_report_full_and_empty_size() {
            for length in [0, 1, 63, 64, 65, 92, 200] {
                let mut set = BitSet::new(length);
                set.set_all();
                assert_eq!(set.size(), length);
                assert!(set.is_all_set());
                set.clear_all();
                assert_eq!(set.size(), 0);
                assert!(set.is_all_clear());
            }
        }

        #[test]
        fn flip_all_keeps_padding_clear() {
            let mut set = BitSet::new(70);
            set.set(5);
            set.flip_all();
            assert_eq!(set.size(), 69);
            assert!(!set.get(5));
        }

        #[test]
        fn set_range_within_one_word_of_length_92() {
            let mut set = BitSet::new(92);
            set.set_range(1, 10);
            for i in 0..92 {
                assert_eq!(set.get(i), (1..=10).contains(&i), "index {i}");
            }
        }

        #[test]
        fn set_range_spanning_several_words() {
            let mut set = BitSet::new(300);
            set.set_range(60, 200);
            for i in 0..300 {
                assert_eq!(set.get(i), (60..=200).contains(&i), "index {i}");
            }
            assert_eq!(set.size(), 141);
            assert!(set.is_range_set(60, 200));
            assert!(!set.is_range_set(59, 200));
            assert!(set.is_range_clear(201, 299));
        }

        #[test]
        fn set_range_on_word_boundaries() {
            let mut set = BitSet::new(192);
            set.set_range(64, 127);
            assert_eq!(set.to_vec(), (64..128).collect::<Vec<_>>());
            set.set_range(0, 191);
            assert!(set.is_all_set());
        }

        #[test]
        fn set_range_is_clamped_to_length() {
            let mut set = BitSet::new(70);
            set.set_range(65, 1000);
            assert_eq!(set.size(), 5);
        }

        #[test]
        fn clear_range_clears_only_the_range() {
            let mut set = BitSet::filled(150);
            set.clear_range(10, 140);
            assert_eq!(set.size(), 19);
            assert!(set.is_range_clear(10, 140));
            assert!(set.get(9) && set.get(141));
        }
    }

    mod set_algebra {
        use super::*;

        #[test]
        fn union_intersection_and_difference() {
            let a = BitSet::from_indices(100, &[1, 2, 3, 80]);
            let b = BitSet::from_indices(100, &[3, 4, 80, 99]);

            let mut union = a.clone();
            union.union(&b);
            assert_eq!(union.to_vec(), vec![1, 2, 3, 4, 80, 99]);

            let mut intersection = a.clone();
            intersection.intersection(&b);
            assert_eq!(intersection.to_vec(), vec![3, 80]);
            assert_eq!(a.make_intersection(&b), intersection);
            assert_eq!(a.intersection_size(&b), 2);
            assert!(a.intersects(&b));

            let mut difference = a.clone();
            difference.difference(&b);
            assert_eq!(difference.to_vec(), vec![1, 2]);
        }

        #[test]
        fn disjoint_sets_do_not_intersect() {
            let a = BitSet::from_indices(10, &[1]);
            let b = BitSet::from_indices(10, &[2]);
            assert!(!a.intersects(&b));
            assert_eq!(a.intersection_size(&b), 0);
        }

        #[test]
        fn intersection_with_shorter_set_truncates() {
            let mut long = BitSet::from_indices(200, &[5, 100, 150]);
            let short = BitSet::from_indices(120, &[5, 100, 119]);
            long.intersection(&short);
            assert_eq!(long.length(), 200);
            assert_eq!(long.to_vec(), vec![5, 100]);

            let made = BitSet::from_indices(200, &[5, 100, 150]).make_intersection(&short);
            assert_eq!(made.length(), 120);
            assert_eq!(made.to_vec(), vec![5, 100]);
        }

        #[test]
        fn union_with_longer_set_never_grows_receiver() {
            let mut short = BitSet::from_indices(70, &[1]);
            let long = BitSet::from_indices(200, &[2, 69, 70, 71, 150]);
            short.union(&long);
            assert_eq!(short.length(), 70);
            assert_eq!(short.to_vec(), vec![1, 2, 69]);
            assert_eq!(short.size(), 3);
        }

        #[test]
        fn equality_compares_length_and_content() {
            let a = BitSet::from_indices(10, &[1]);
            assert_eq!(a, BitSet::from_indices(10, &[1]));
            assert_ne!(a, BitSet::from_indices(11, &[1]));
            assert_ne!(a, BitSet::from_indices(10, &[2]));
        }
    }

    mod iteration {
        use super::*;

        #[test]
        fn for_each_visits_ascending_with_contiguous_counter() {
            let set = BitSet::from_indices(300, &[299, 0, 64, 63, 128]);
            let mut seen = Vec::new();
            set.for_each(|index, counter| seen.push((index, counter)));
            assert_eq!(seen, vec![(0, 0), (63, 1), (64, 2), (128, 3), (299, 4)]);
        }

        #[test]
        fn display_and_selection_strings() {
            let set = BitSet::from_indices(10, &[1, 4]);
            assert_eq!(set.to_string(), "{1,4}");
            assert_eq!(set.to_sele_string(), "@1,4");
            assert_eq!(BitSet::new(10).to_sele_string(), "NONE");
            assert_eq!(BitSet::new(10).to_string(), "{}");
        }
    }
}
