use std::cmp::Ordering;

/// Smallest capacity a store grows to when it runs out of rows.
pub const MIN_STORE_GROWTH: usize = 256;

/// Growth factor applied to the current capacity by [`ColumnStore::grow_if_full`].
pub const STORE_GROWTH_FACTOR: f64 = 1.5;

/// A table of fixed-width columns sharing one logical row count.
///
/// Every implementor keeps all of its columns at the same physical `length`, with
/// `count <= length` at all times. Rows past `count` are allocated but unused. The
/// required methods are the column-wise primitives; the provided methods implement
/// the store semantics (growth, bulk copies, sorting) on top of them, so that every
/// entity store behaves identically.
///
/// Row indices are never bounds-checked beyond what slice indexing does: passing a
/// row outside `[0, length)` is a caller bug and panics.
pub trait ColumnStore: Sized {
    /// Number of rows in use.
    fn count(&self) -> usize;

    /// Sets the number of rows in use without touching column data.
    fn set_count(&mut self, count: usize);

    /// Physical capacity of every column.
    fn length(&self) -> usize;

    /// Resizes every column to `length`, keeping the leading rows and zero-filling new ones.
    fn resize_columns(&mut self, length: usize);

    /// Copies every column of row `src` in `other` into row `dst` of `self`.
    fn copy_row_from(&mut self, other: &Self, dst: usize, src: usize);

    /// Copies every column of row `src` into row `dst` of the same store.
    fn copy_row_within(&mut self, dst: usize, src: usize);

    /// Reorders the first `order.len()` rows so that new row `i` holds old row `order[i]`.
    fn gather(&mut self, order: &[usize]);

    /// Releases every column.
    fn release(&mut self);

    /// Resizes the store, clamping `count` to the new length.
    fn resize(&mut self, length: usize) {
        self.resize_columns(length);
        if self.count() > length {
            self.set_count(length);
        }
    }

    /// Grows the store when no free row is left. Must be called before appending a row.
    fn grow_if_full(&mut self) {
        let length = self.length();
        if self.count() >= length {
            let grown = (length as f64 * STORE_GROWTH_FACTOR).round() as usize;
            self.resize(grown.max(MIN_STORE_GROWTH));
        }
    }

    /// Copies `n` rows of `other`, starting at `other_offset`, into `self` at `this_offset`.
    fn copy_from(&mut self, other: &Self, this_offset: usize, other_offset: usize, n: usize) {
        for i in 0..n {
            self.copy_row_from(other, this_offset + i, other_offset + i);
        }
    }

    /// Moves `n` rows starting at `source` to start at `target`. Overlapping ranges are handled.
    fn copy_within(&mut self, target: usize, source: usize, n: usize) {
        if target <= source {
            for i in 0..n {
                self.copy_row_within(target + i, source + i);
            }
        } else {
            for i in (0..n).rev() {
                self.copy_row_within(target + i, source + i);
            }
        }
    }

    /// Sorts the rows `[0, count)` with a three-way comparator over row indices.
    ///
    /// The comparator sees the store in its unsorted state for the whole sort. The
    /// resulting permutation is applied to every column in a single gather pass, so
    /// no column can get out of step with the others.
    fn sort_by<F>(&mut self, mut cmp: F)
    where
        F: FnMut(&Self, usize, usize) -> Ordering,
    {
        let mut order: Vec<usize> = (0..self.count()).collect();
        let this: &Self = self;
        order.sort_by(|&a, &b| cmp(this, a, b));
        self.gather(&order);
    }

    /// Applies an externally computed row order to `[0, order.len())`.
    fn permute(&mut self, order: &[usize]) {
        self.gather(order);
    }

    /// Drops every row while keeping the allocated capacity.
    fn clear(&mut self) {
        self.set_count(0);
    }

    /// Releases every column and resets the store to zero capacity.
    fn dispose(&mut self) {
        self.release();
        self.set_count(0);
    }
}

pub(crate) fn gather_column<T: Copy>(column: &[T], order: &[usize]) -> Vec<T> {
    order
        .iter()
        .map(|&i| column[i])
        .chain(column[order.len()..].iter().copied())
        .collect()
}

/// Implements [`ColumnStore`] and a sized constructor for a store struct.
///
/// The struct must have `count: usize` and `length: usize` fields, one `Vec<T>`
/// field per listed column and one `Option<Vec<T>>` field per listed optional column.
macro_rules! column_store {
    ($store:ident { $($column:ident),+ $(,)? } $(optional { $($opt:ident),+ $(,)? })?) => {
        impl $store {
            /// Creates a store with capacity for `length` rows and no rows in use.
            pub fn new(length: usize) -> Self {
                Self {
                    count: 0,
                    length,
                    $($column: vec![Default::default(); length],)+
                    $($($opt: None,)+)?
                }
            }
        }

        impl Default for $store {
            fn default() -> Self {
                Self::new(0)
            }
        }

        impl $crate::core::store::column::ColumnStore for $store {
            fn count(&self) -> usize {
                self.count
            }

            fn set_count(&mut self, count: usize) {
                self.count = count;
            }

            fn length(&self) -> usize {
                self.length
            }

            fn resize_columns(&mut self, length: usize) {
                $(self.$column.resize(length, Default::default());)+
                $($(
                    if let Some(column) = self.$opt.as_mut() {
                        column.resize(length, Default::default());
                    }
                )+)?
                self.length = length;
            }

            fn copy_row_from(&mut self, other: &Self, dst: usize, src: usize) {
                $(self.$column[dst] = other.$column[src];)+
                $($(
                    if let Some(column) = self.$opt.as_mut() {
                        column[dst] = other.$opt.as_ref().map_or(Default::default(), |c| c[src]);
                    }
                )+)?
            }

            fn copy_row_within(&mut self, dst: usize, src: usize) {
                $(self.$column[dst] = self.$column[src];)+
                $($(
                    if let Some(column) = self.$opt.as_mut() {
                        column[dst] = column[src];
                    }
                )+)?
            }

            fn gather(&mut self, order: &[usize]) {
                $(self.$column = $crate::core::store::column::gather_column(&self.$column, order);)+
                $($(
                    if let Some(column) = self.$opt.take() {
                        self.$opt = Some($crate::core::store::column::gather_column(&column, order));
                    }
                )+)?
            }

            fn release(&mut self) {
                $(self.$column = Vec::new();)+
                $($(self.$opt = None;)+)?
                self.length = 0;
            }
        }
    };
}

pub(crate) use column_store;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct PairStore {
        count: usize,
        length: usize,
        key: Vec<i32>,
        value: Vec<f32>,
        extra: Option<Vec<u8>>,
    }

    column_store!(PairStore { key, value } optional { extra });

    impl PairStore {
        fn push(&mut self, key: i32, value: f32) {
            self.grow_if_full();
            let i = self.count;
            self.key[i] = key;
            self.value[i] = value;
            self.count += 1;
        }
    }

    fn filled(keys: &[i32]) -> PairStore {
        let mut store = PairStore::new(0);
        for &k in keys {
            store.push(k, k as f32 * 10.0);
        }
        store
    }

    mod growth {
        use super::*;

        #[test]
        fn new_store_has_capacity_but_no_rows() {
            let store = PairStore::new(8);
            assert_eq!(store.count(), 0);
            assert_eq!(store.length(), 8);
            assert_eq!(store.key.len(), 8);
            assert_eq!(store.value.len(), 8);
        }

        #[test]
        fn grow_if_full_uses_minimum_floor() {
            let mut store = PairStore::new(0);
            store.grow_if_full();
            assert_eq!(store.length(), MIN_STORE_GROWTH);
        }

        #[test]
        fn grow_if_full_is_noop_when_rows_are_free() {
            let mut store = PairStore::new(4);
            store.set_count(3);
            store.grow_if_full();
            assert_eq!(store.length(), 4);
        }

        #[test]
        fn grow_if_full_grows_by_factor_above_floor() {
            let mut store = PairStore::new(1000);
            store.set_count(1000);
            store.grow_if_full();
            assert_eq!(store.length(), 1500);
        }

        #[test]
        fn appending_across_many_growths_never_loses_values() {
            let keys: Vec<i32> = (0..5000).collect();
            let store = filled(&keys);
            assert_eq!(store.count(), 5000);
            assert!(store.length() >= 5000);
            for (i, &k) in keys.iter().enumerate() {
                assert_eq!(store.key[i], k);
                assert_eq!(store.value[i], k as f32 * 10.0);
            }
        }

        #[test]
        fn resize_truncates_and_clamps_count() {
            let mut store = filled(&[1, 2, 3, 4, 5]);
            store.resize(3);
            assert_eq!(store.length(), 3);
            assert_eq!(store.count(), 3);
            assert_eq!(store.key, vec![1, 2, 3]);
        }

        #[test]
        fn resize_keeps_optional_columns_in_step() {
            let mut store = PairStore::new(2);
            store.extra = Some(vec![7, 8]);
            store.resize(4);
            assert_eq!(store.extra.as_deref(), Some(&[7, 8, 0, 0][..]));
        }
    }

    mod copying {
        use super::*;

        #[test]
        fn copy_from_copies_all_columns() {
            let source = filled(&[1, 2, 3]);
            let mut target = PairStore::new(4);
            target.copy_from(&source, 1, 0, 3);
            assert_eq!(target.key, vec![0, 1, 2, 3]);
            assert_eq!(target.value, vec![0.0, 10.0, 20.0, 30.0]);
        }

        #[test]
        fn copy_from_zero_fills_optional_column_missing_in_source() {
            let source = filled(&[1]);
            let mut target = PairStore::new(1);
            target.extra = Some(vec![9]);
            target.copy_from(&source, 0, 0, 1);
            assert_eq!(target.extra, Some(vec![0]));
        }

        #[test]
        fn copy_within_handles_forward_overlap() {
            let mut store = filled(&[1, 2, 3, 4, 5]);
            store.copy_within(1, 0, 3);
            assert_eq!(&store.key[..5], &[1, 1, 2, 3, 5]);
        }

        #[test]
        fn copy_within_handles_backward_overlap() {
            let mut store = filled(&[1, 2, 3, 4, 5]);
            store.copy_within(0, 1, 3);
            assert_eq!(&store.key[..5], &[2, 3, 4, 4, 5]);
        }
    }

    mod sorting {
        use super::*;

        #[test]
        fn sort_by_orders_rows_and_keeps_columns_in_step() {
            let mut store = filled(&[5, 3, 9, 1, 7, 3]);
            store.sort_by(|s, a, b| s.key[a].cmp(&s.key[b]));
            for i in 0..store.count() - 1 {
                assert!(store.key[i] <= store.key[i + 1]);
            }
            for i in 0..store.count() {
                assert_eq!(store.value[i], store.key[i] as f32 * 10.0);
            }
        }

        #[test]
        fn sort_by_leaves_unused_rows_untouched() {
            let mut store = PairStore::new(6);
            store.key.copy_from_slice(&[3, 1, 2, 42, 43, 44]);
            store.set_count(3);
            store.sort_by(|s, a, b| s.key[a].cmp(&s.key[b]));
            assert_eq!(store.key, vec![1, 2, 3, 42, 43, 44]);
        }

        #[test]
        fn sort_by_moves_optional_column_too() {
            let mut store = filled(&[2, 1]);
            store.extra = Some(vec![20; store.length()]);
            if let Some(extra) = store.extra.as_mut() {
                extra[1] = 10;
            }
            store.sort_by(|s, a, b| s.key[a].cmp(&s.key[b]));
            assert_eq!(store.extra.as_ref().map(|e| (e[0], e[1])), Some((10, 20)));
        }

        #[test]
        fn permute_applies_external_order() {
            let mut store = filled(&[10, 20, 30]);
            store.permute(&[2, 0, 1]);
            assert_eq!(&store.key[..3], &[30, 10, 20]);
        }
    }

    #[test]
    fn clear_keeps_capacity_and_dispose_releases_it() {
        let mut store = filled(&[1, 2, 3]);
        let length = store.length();
        store.clear();
        assert_eq!(store.count(), 0);
        assert_eq!(store.length(), length);

        store.dispose();
        assert_eq!(store.length(), 0);
        assert!(store.key.is_empty());
        assert!(store.value.is_empty());
    }
}
