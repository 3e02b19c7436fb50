//! Range-bounded quicksort.
//!
//! [`partial_sort`] guarantees sorted order only inside a requested index
//! range: after it returns, every position in the range holds the element a
//! full sort would put there. Positions outside the range hold the remaining
//! elements in no particular order. Partitions that do not intersect the
//! range are never touched, so narrow ranges near either end cost close to
//! O(n).
//!
//! The sort is not stable.
//!
//! ```
//! use standout_sequence::partial_sort;
//!
//! let mut items = vec![9, 4, 7, 1, 8, 2, 6, 3, 5, 0];
//! partial_sort(&mut items, |a, b| a.cmp(b), 2..5);
//! assert_eq!(&items[2..5], &[2, 3, 4]);
//! ```

use std::cmp::Ordering;
use std::ops::Range;

use tracing::trace;

/// Default partition size below which insertion sort takes over.
pub const DEFAULT_INSERTION_THRESHOLD: usize = 64;

/// Tuning options for the partial sort.
///
/// # Example
///
/// ```
/// use standout_sequence::{partial_sort_with, SortOptions};
///
/// let options = SortOptions::new().insertion_threshold(8);
/// let mut items: Vec<u32> = (0..100).rev().collect();
/// partial_sort_with(&mut items, |a, b| a.cmp(b), 0..10, &options);
/// assert_eq!(&items[..10], &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOptions {
    insertion_threshold: usize,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            insertion_threshold: DEFAULT_INSERTION_THRESHOLD,
        }
    }
}

impl SortOptions {
    /// Creates options with the defaults.
    pub fn new() -> Self {
        SortOptions::default()
    }

    /// Sets the partition size below which insertion sort is used.
    ///
    /// Values below 1 are raised to 1.
    pub fn insertion_threshold(mut self, threshold: usize) -> Self {
        self.insertion_threshold = threshold.max(1);
        self
    }

    /// Returns the insertion-sort threshold.
    pub fn get_insertion_threshold(&self) -> usize {
        self.insertion_threshold
    }
}

/// Sorts `items` in place.
pub fn sort<T, F>(items: &mut [T], compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    partial_sort(items, compare, 0..len);
}

/// Sorts `items` so that positions in `range` hold their fully-sorted values.
///
/// The range is clamped to the slice. Elements outside it are a permutation
/// of the rest.
pub fn partial_sort<T, F>(items: &mut [T], compare: F, range: Range<usize>)
where
    F: FnMut(&T, &T) -> Ordering,
{
    partial_sort_with(items, compare, range, &SortOptions::default());
}

/// [`partial_sort`] with explicit [`SortOptions`].
pub fn partial_sort_with<T, F>(
    items: &mut [T],
    mut compare: F,
    range: Range<usize>,
    options: &SortOptions,
) where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    let min = range.start.min(len);
    let max = range.end.min(len);
    if len < 2 || min >= max {
        return;
    }

    let threshold = options.insertion_threshold.max(1);
    let mut partitions = 0usize;
    let mut skipped = 0usize;

    // Inclusive bounds.
    let mut pending: Vec<(usize, usize)> = vec![(0, len - 1)];
    while let Some((lo, hi)) = pending.pop() {
        if hi < min || lo >= max {
            skipped += 1;
            continue;
        }
        if hi - lo + 1 < threshold {
            insertion_sort(&mut items[lo..=hi], &mut compare);
            continue;
        }

        partitions += 1;
        let (left_end, right_start) = partition(items, lo, hi, &mut compare);
        let left = left_end.filter(|&end| end > lo).map(|end| (lo, end));
        let right = (right_start < hi).then_some((right_start, hi));

        // Larger half first: the smaller one is popped next.
        match (left, right) {
            (Some(l), Some(r)) if l.1 - l.0 > r.1 - r.0 => {
                pending.push(l);
                pending.push(r);
            }
            (Some(l), Some(r)) => {
                pending.push(r);
                pending.push(l);
            }
            (Some(one), None) | (None, Some(one)) => pending.push(one),
            (None, None) => {}
        }
    }

    trace!(len, min, max, partitions, skipped, "partial sort finished");
}

/// Hoare partition of `items[lo..=hi]` around the middle element.
///
/// Returns `(left_end, right_start)`: `items[lo..=left_end]` compare no
/// greater than the pivot, `items[right_start..=hi]` no less, and anything
/// strictly between is equal to the pivot and already in place.
/// `left_end` is `None` when the left part is empty.
///
/// The pivot is tracked by index, and both scans are bounds-guarded so an
/// inconsistent comparator cannot run them off the slice.
fn partition<T, F>(items: &mut [T], lo: usize, hi: usize, compare: &mut F) -> (Option<usize>, usize)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut pivot = lo + (hi - lo) / 2;
    let mut i = lo;
    let mut j = hi;
    loop {
        while i < hi && compare(&items[i], &items[pivot]) == Ordering::Less {
            i += 1;
        }
        while j > lo && compare(&items[j], &items[pivot]) == Ordering::Greater {
            j -= 1;
        }
        if i <= j {
            items.swap(i, j);
            if pivot == i {
                pivot = j;
            } else if pivot == j {
                pivot = i;
            }
            i += 1;
            if j == lo {
                return (None, i);
            }
            j -= 1;
        }
        if i > j {
            return (Some(j), i);
        }
    }
}

fn insertion_sort<T, F>(items: &mut [T], compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j], &items[j - 1]) == Ordering::Less {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}
