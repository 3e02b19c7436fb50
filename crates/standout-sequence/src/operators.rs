//! Convenience operators built from the core primitives.
//!
//! Every operator here follows the same propagation contract as the core
//! operators in [`sequence`](crate::sequence): count and positional access
//! are passed through when they can be computed from the input's, and the
//! result falls back to full passes otherwise.
//!
//! Operators that need the whole input before producing anything (reverse
//! of an unseekable input, shuffle, the set operators) buffer on the first
//! pull of each cursor, never when the cursor is created.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::Hash;
use std::iter;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;

use crate::capability::{accessor, Access, TryGetAt};
use crate::cursor::{self, BoxedCursor};
use crate::error::{Result, SequenceError};
use crate::membership::{Equality, Hashed, Linear, Membership};
use crate::sequence::{Derivation, Sequence};

/// Cursor stepping through `indices` with a seekable accessor.
fn walk<'a, T: 'a>(get: TryGetAt<'a, T>, indices: impl Iterator<Item = usize> + 'a) -> BoxedCursor<'a, T> {
    Box::new(indices.map_while(move |index| get(index)))
}

/// How `intersect` and `except` test an element against the other side.
///
/// Both consume the other side's set as they go, so each kept element is
/// emitted once.
#[derive(Debug, Clone, Copy)]
enum SetTest {
    /// Keep elements present in the other side.
    Present,
    /// Keep elements absent from the other side.
    Absent,
}

fn random(seed: Option<u64>) -> fastrand::Rng {
    seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
}

impl<'a, T: Clone + 'a> Sequence<'a, T> {
    // ========================================================================
    // Slicing
    // ========================================================================

    /// Keeps at most the last `n` elements.
    ///
    /// Seekable inputs are read by index from `count - n`; others are
    /// buffered through a ring of `n` elements.
    pub fn take_last(&self, n: usize) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Derivation::new("take_last", move || {
            let parent = parent.clone();
            cursor::deferred(move || {
                let access = parent.access();
                if access.can_seek() {
                    let count = parent.count();
                    return walk(access.getter(), count.saturating_sub(n)..count);
                }
                let mut tail = VecDeque::new();
                if n > 0 {
                    for item in parent.open() {
                        if tail.len() == n {
                            tail.pop_front();
                        }
                        tail.push_back(item);
                    }
                }
                Box::new(tail.into_iter())
            })
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().min(n))
        })
        .access(move || {
            let access = indexed.access();
            if !access.can_seek() {
                return None;
            }
            let (get, count) = (access.getter(), indexed.count_fn());
            Some(Access::seek(accessor(move |index| {
                let count = count();
                let kept = count.min(n);
                (index < kept).then(|| get(count - kept + index)).flatten()
            })))
        })
        .build()
    }

    /// Drops the last `n` elements.
    ///
    /// Streams with a delay of `n` elements on unseekable inputs.
    pub fn skip_last(&self, n: usize) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Derivation::new("skip_last", move || {
            let parent = parent.clone();
            cursor::deferred(move || {
                let access = parent.access();
                if access.can_seek() {
                    return walk(access.getter(), 0..parent.count().saturating_sub(n));
                }
                let mut source = parent.open();
                let mut pending = VecDeque::new();
                Box::new(iter::from_fn(move || loop {
                    pending.push_back(source.next()?);
                    if pending.len() > n {
                        return pending.pop_front();
                    }
                }))
            })
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().saturating_sub(n))
        })
        .access(move || {
            let access = indexed.access();
            if !access.can_seek() {
                return None;
            }
            let (get, count) = (access.getter(), indexed.count_fn());
            Some(Access::seek(accessor(move |index| {
                (index < count().saturating_sub(n)).then(|| get(index)).flatten()
            })))
        })
        .build()
    }

    /// Yields elements while `predicate` holds, then stops.
    pub fn take_while<F>(&self, predicate: F) -> Sequence<'a, T>
    where
        F: Fn(&T) -> bool + 'a,
    {
        let (parent, predicate) = (self.clone(), Rc::new(predicate));
        Derivation::new("take_while", move || {
            let predicate = Rc::clone(&predicate);
            Box::new(parent.open().take_while(move |item| predicate(item)))
        })
        .build()
    }

    /// Skips elements while `predicate` holds, then yields the rest.
    pub fn skip_while<F>(&self, predicate: F) -> Sequence<'a, T>
    where
        F: Fn(&T) -> bool + 'a,
    {
        let (parent, predicate) = (self.clone(), Rc::new(predicate));
        Derivation::new("skip_while", move || {
            let predicate = Rc::clone(&predicate);
            Box::new(parent.open().skip_while(move |item| predicate(item)))
        })
        .build()
    }

    // ========================================================================
    // Projection and composition
    // ========================================================================

    /// Maps each element to an iterable and flattens the results.
    pub fn select_many<U, I, F>(&self, f: F) -> Sequence<'a, U>
    where
        U: Clone + 'a,
        I: IntoIterator<Item = U> + 'a,
        I::IntoIter: 'a,
        F: Fn(T) -> I + 'a,
    {
        let (parent, f) = (self.clone(), Rc::new(f));
        Derivation::new("select_many", move || {
            let f = Rc::clone(&f);
            Box::new(parent.open().flat_map(move |item| f(item)))
        })
        .build()
    }

    /// Appends a single element.
    pub fn append(&self, item: T) -> Sequence<'a, T> {
        self.concat(vec![item])
    }

    /// Prepends a single element.
    pub fn prepend(&self, item: T) -> Sequence<'a, T> {
        Sequence::from_vec(vec![item]).concat(self)
    }

    /// Yields `value` alone if this sequence is empty.
    pub fn default_if_empty(&self, value: T) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        let fallback = value.clone();
        Derivation::new("default_if_empty", move || {
            let mut source = parent.open().fuse();
            let mut fallback = Some(fallback.clone());
            Box::new(iter::from_fn(move || match source.next() {
                Some(item) => {
                    fallback = None;
                    Some(item)
                }
                None => fallback.take(),
            }))
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().max(1))
        })
        .access(move || {
            let access = indexed.access();
            let (get, count, value) = (access.getter(), indexed.count_fn(), value.clone());
            Some(access.rebind(accessor(move |index| {
                get(index).or_else(|| (index == 0 && count() == 0).then(|| value.clone()))
            })))
        })
        .build()
    }

    /// Extends the sequence with `value` up to `len` elements.
    ///
    /// Sequences already `len` long or longer are unchanged.
    pub fn pad(&self, len: usize, value: T) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        let filler = value.clone();
        Derivation::new("pad", move || {
            let mut source = parent.open().fuse();
            let (filler, mut emitted) = (filler.clone(), 0usize);
            Box::new(iter::from_fn(move || {
                let next = source
                    .next()
                    .or_else(|| (emitted < len).then(|| filler.clone()));
                if next.is_some() {
                    emitted += 1;
                }
                next
            }))
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().max(len))
        })
        .access(move || {
            let access = indexed.access();
            let (get, value) = (access.getter(), value.clone());
            Some(access.rebind(accessor(move |index| {
                get(index).or_else(|| (index < len).then(|| value.clone()))
            })))
        })
        .build()
    }

    /// Reverses the sequence.
    ///
    /// Seekable inputs stay seekable: index `i` reads `count - 1 - i`.
    /// Others are materialized on the first pull.
    pub fn reverse(&self) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Derivation::new("reverse", move || {
            let parent = parent.clone();
            cursor::deferred(move || {
                let access = parent.access();
                if access.can_seek() {
                    return walk(access.getter(), (0..parent.count()).rev());
                }
                trace!("reverse materializes an unseekable input");
                let mut items = parent.to_vec();
                items.reverse();
                Box::new(items.into_iter())
            })
        })
        .count(move || counted.count_fn())
        .access(move || {
            let access = indexed.access();
            if !access.can_seek() {
                return None;
            }
            let (get, count) = (access.getter(), indexed.count_fn());
            Some(Access::seek(accessor(move |index| {
                count()
                    .checked_sub(index)
                    .and_then(|rest| rest.checked_sub(1))
                    .and_then(|mirrored| get(mirrored))
            })))
        })
        .build()
    }

    /// Combines elements pairwise with `f`, stopping at the shorter input.
    ///
    /// Seekable when both inputs are.
    pub fn zip<U, R, F>(&self, other: impl Into<Sequence<'a, U>>, f: F) -> Sequence<'a, R>
    where
        U: Clone + 'a,
        R: Clone + 'a,
        F: Fn(T, U) -> R + 'a,
    {
        let other = other.into();
        let f = Rc::new(f);
        let (left, right, combine) = (self.clone(), other.clone(), Rc::clone(&f));
        let (left_count, right_count) = (self.clone(), other.clone());
        let (left_access, right_access) = (self.clone(), other);
        Derivation::new("zip", move || {
            let combine = Rc::clone(&combine);
            Box::new(
                left.open()
                    .zip(right.open())
                    .map(move |(a, b)| combine(a, b)),
            )
        })
        .count(move || {
            let (a, b) = (left_count.count_fn(), right_count.count_fn());
            Rc::new(move || a().min(b()))
        })
        .access(move || {
            let (a, b) = (left_access.access(), right_access.access());
            if !(a.can_seek() && b.can_seek()) {
                return None;
            }
            let (a, b, f) = (a.getter(), b.getter(), Rc::clone(&f));
            Some(Access::seek(accessor(move |index| Some(f(a(index)?, b(index)?)))))
        })
        .build()
    }

    /// Splits the sequence into batches of `size` elements.
    ///
    /// The last batch may be shorter. Fails with
    /// [`SequenceError::InvalidArgument`] when `size` is 0.
    ///
    /// ```
    /// use standout_sequence::Sequence;
    ///
    /// let chunks = Sequence::from(vec![1, 2, 3, 4, 5]).chunk(2).unwrap();
    /// assert_eq!(chunks.count(), 3);
    /// assert_eq!(chunks.to_vec(), vec![vec![1, 2], vec![3, 4], vec![5]]);
    /// ```
    pub fn chunk(&self, size: usize) -> Result<Sequence<'a, Vec<T>>> {
        if size == 0 {
            return Err(SequenceError::invalid_argument(
                "size",
                "chunk size must be at least 1",
            ));
        }
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Ok(Derivation::new("chunk", move || {
            let mut source = parent.open();
            Box::new(iter::from_fn(move || {
                let chunk: Vec<T> = source.by_ref().take(size).collect();
                (!chunk.is_empty()).then_some(chunk)
            }))
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().div_ceil(size))
        })
        .access(move || {
            let access = indexed.access();
            if !access.can_seek() {
                return None;
            }
            let (get, count) = (access.getter(), indexed.count_fn());
            Some(Access::seek(accessor(move |index: usize| {
                let start = index.checked_mul(size)?;
                let end = count().min(start.saturating_add(size));
                if start >= end {
                    return None;
                }
                let chunk: Vec<T> = (start..end).filter_map(|i| get(i)).collect();
                Some(chunk)
            })))
        })
        .build())
    }

    /// Pairs each element with the one `offset` positions before it, or
    /// `default` when there is none.
    pub fn lag(&self, offset: usize, default: T) -> Sequence<'a, (T, T)> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        let fallback = default.clone();
        Derivation::new("lag", move || {
            let fallback = fallback.clone();
            let mut history = VecDeque::new();
            Box::new(parent.open().map(move |item| {
                history.push_back(item.clone());
                let lagged = if history.len() > offset {
                    history.pop_front()
                } else {
                    None
                };
                (item, lagged.unwrap_or_else(|| fallback.clone()))
            }))
        })
        .count(move || counted.count_fn())
        .access(move || {
            let access = indexed.access();
            let (get, default) = (access.getter(), default.clone());
            Some(access.rebind(accessor(move |index| {
                let item = get(index)?;
                let lagged = index
                    .checked_sub(offset)
                    .and_then(|earlier| get(earlier))
                    .unwrap_or_else(|| default.clone());
                Some((item, lagged))
            })))
        })
        .build()
    }

    /// Pairs each element with the one `offset` positions after it, or
    /// `default` when there is none.
    pub fn lead(&self, offset: usize, default: T) -> Sequence<'a, (T, T)> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        let fallback = default.clone();
        Derivation::new("lead", move || {
            let fallback = fallback.clone();
            let mut source = parent.open().fuse();
            let mut ahead: VecDeque<T> = VecDeque::new();
            Box::new(iter::from_fn(move || {
                while ahead.len() <= offset {
                    match source.next() {
                        Some(item) => ahead.push_back(item),
                        None => break,
                    }
                }
                let item = ahead.pop_front()?;
                let led = match offset {
                    0 => item.clone(),
                    _ => ahead
                        .get(offset - 1)
                        .cloned()
                        .unwrap_or_else(|| fallback.clone()),
                };
                Some((item, led))
            }))
        })
        .count(move || counted.count_fn())
        .access(move || {
            let access = indexed.access();
            let (get, default) = (access.getter(), default.clone());
            Some(access.rebind(accessor(move |index| {
                let item = get(index)?;
                let led = index
                    .checked_add(offset)
                    .and_then(|later| get(later))
                    .unwrap_or_else(|| default.clone());
                Some((item, led))
            })))
        })
        .build()
    }

    // ========================================================================
    // Randomization
    // ========================================================================

    fn shuffled(&self, op: &'static str, seed: Option<u64>) -> Sequence<'a, T> {
        let (parent, counted) = (self.clone(), self.clone());
        Derivation::new(op, move || {
            let parent = parent.clone();
            cursor::deferred(move || {
                let mut items = parent.to_vec();
                random(seed).shuffle(&mut items);
                Box::new(items.into_iter())
            })
        })
        .count(move || counted.count_fn())
        .build()
    }

    /// Fisher–Yates shuffle of a materialized copy, fresh on every pass.
    ///
    /// The count propagates; the result is not seekable.
    pub fn shuffle(&self) -> Sequence<'a, T> {
        self.shuffled("shuffle", None)
    }

    /// [`shuffle`](Self::shuffle) with a fixed seed: every pass yields the
    /// same permutation.
    pub fn shuffle_with_seed(&self, seed: u64) -> Sequence<'a, T> {
        self.shuffled("shuffle", Some(seed))
    }

    fn sampled(&self, k: usize, seed: Option<u64>) -> Sequence<'a, T> {
        let (parent, counted) = (self.clone(), self.clone());
        Derivation::new("sample", move || {
            let parent = parent.clone();
            cursor::deferred(move || {
                if k == 0 {
                    return Box::new(iter::empty());
                }
                let mut rng = random(seed);
                let mut reservoir = Vec::new();
                for (seen, item) in parent.open().enumerate() {
                    if seen < k {
                        reservoir.push(item);
                    } else {
                        let slot = rng.usize(..=seen);
                        if slot < k {
                            reservoir[slot] = item;
                        }
                    }
                }
                Box::new(reservoir.into_iter())
            })
        })
        .count(move || {
            let count = counted.count_fn();
            Rc::new(move || count().min(k))
        })
        .build()
    }

    /// Reservoir sample of at most `k` elements, in one pass.
    pub fn sample(&self, k: usize) -> Sequence<'a, T> {
        self.sampled(k, None)
    }

    /// [`sample`](Self::sample) with a fixed seed.
    pub fn sample_with_seed(&self, k: usize, seed: u64) -> Sequence<'a, T> {
        self.sampled(k, Some(seed))
    }

    // ========================================================================
    // Set operators
    // ========================================================================

    /// Keeps the first element for each distinct `project(item)`.
    fn retain_first<K, P, M, N>(&self, op: &'static str, project: P, fresh: N) -> Sequence<'a, T>
    where
        K: 'a,
        P: Fn(&T) -> K + 'a,
        M: Membership<K> + 'a,
        N: Fn() -> M + 'a,
    {
        let parent = self.clone();
        let project = Rc::new(project);
        Derivation::new(op, move || {
            let project = Rc::clone(&project);
            let mut seen = fresh();
            Box::new(parent.open().filter(move |item| seen.insert(&project(item))))
        })
        .build()
    }

    /// Tests each element against a set built from `other` on the first pull.
    fn against<M, N>(&self, op: &'static str, other: Sequence<'a, T>, fresh: N, test: SetTest) -> Sequence<'a, T>
    where
        M: Membership<T> + 'a,
        N: Fn() -> M + 'a,
    {
        let parent = self.clone();
        let fresh = Rc::new(fresh);
        Derivation::new(op, move || {
            let (parent, other, fresh) = (parent.clone(), other.clone(), Rc::clone(&fresh));
            cursor::deferred(move || {
                let mut seen = fresh();
                seen.extend(other.open());
                Box::new(parent.open().filter(move |item| match test {
                    SetTest::Present => seen.remove(item),
                    SetTest::Absent => seen.insert(item),
                }))
            })
        })
        .build()
    }

    /// Removes duplicates, keeping first occurrences. Hash-based, O(n).
    ///
    /// ```
    /// use standout_sequence::Sequence;
    ///
    /// assert_eq!(Sequence::from(vec![1, 2, 2, 3]).distinct().to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn distinct(&self) -> Sequence<'a, T>
    where
        T: Hash + Eq,
    {
        self.retain_first("distinct", T::clone, Hashed::<T>::new)
    }

    /// Removes elements whose `key` was already seen. Hash-based, O(n).
    pub fn distinct_by<K, F>(&self, key: F) -> Sequence<'a, T>
    where
        K: Hash + Eq + Clone + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.retain_first("distinct_by", key, Hashed::<K>::new)
    }

    /// Removes duplicates under a custom equality.
    ///
    /// Slow path: each element is compared with every distinct element kept
    /// so far, O(n²). Prefer [`distinct`](Self::distinct) or
    /// [`distinct_by`](Self::distinct_by) when a hashable key exists.
    pub fn distinct_by_eq<E>(&self, eq: E) -> Sequence<'a, T>
    where
        E: Fn(&T, &T) -> bool + 'a,
    {
        let eq: Equality<'a, T> = Rc::new(eq);
        self.retain_first("distinct_by_eq", T::clone, move || Linear::new(Rc::clone(&eq)))
    }

    /// Distinct elements of this sequence followed by new ones from `other`.
    pub fn union(&self, other: impl Into<Sequence<'a, T>>) -> Sequence<'a, T>
    where
        T: Hash + Eq,
    {
        self.concat(other)
            .retain_first("union", T::clone, Hashed::<T>::new)
    }

    /// [`union`](Self::union) under a custom equality. O((n + m)²).
    pub fn union_by_eq<E>(&self, other: impl Into<Sequence<'a, T>>, eq: E) -> Sequence<'a, T>
    where
        E: Fn(&T, &T) -> bool + 'a,
    {
        let eq: Equality<'a, T> = Rc::new(eq);
        self.concat(other)
            .retain_first("union_by_eq", T::clone, move || Linear::new(Rc::clone(&eq)))
    }

    /// Distinct elements of this sequence that also occur in `other`.
    pub fn intersect(&self, other: impl Into<Sequence<'a, T>>) -> Sequence<'a, T>
    where
        T: Hash + Eq,
    {
        self.against("intersect", other.into(), Hashed::<T>::new, SetTest::Present)
    }

    /// [`intersect`](Self::intersect) under a custom equality. O(n·m).
    pub fn intersect_by_eq<E>(&self, other: impl Into<Sequence<'a, T>>, eq: E) -> Sequence<'a, T>
    where
        E: Fn(&T, &T) -> bool + 'a,
    {
        let eq: Equality<'a, T> = Rc::new(eq);
        self.against(
            "intersect_by_eq",
            other.into(),
            move || Linear::new(Rc::clone(&eq)),
            SetTest::Present,
        )
    }

    /// Distinct elements of this sequence that do not occur in `other`.
    pub fn except(&self, other: impl Into<Sequence<'a, T>>) -> Sequence<'a, T>
    where
        T: Hash + Eq,
    {
        self.against("except", other.into(), Hashed::<T>::new, SetTest::Absent)
    }

    /// [`except`](Self::except) under a custom equality. O(n·m).
    pub fn except_by_eq<E>(&self, other: impl Into<Sequence<'a, T>>, eq: E) -> Sequence<'a, T>
    where
        E: Fn(&T, &T) -> bool + 'a,
    {
        let eq: Equality<'a, T> = Rc::new(eq);
        self.against(
            "except_by_eq",
            other.into(),
            move || Linear::new(Rc::clone(&eq)),
            SetTest::Absent,
        )
    }

    // ========================================================================
    // Search
    // ========================================================================

    fn search_by<F>(&self, probe: F) -> Option<usize>
    where
        F: Fn(&T) -> Ordering,
    {
        let access = self.access();
        if !access.can_seek() {
            trace!("binary search materializes an unseekable input");
            return self.to_vec().binary_search_by(|item| probe(item)).ok();
        }
        let (mut lo, mut hi) = (0, self.count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match probe(&access.get(mid)?) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Finds the index of `value` in a sequence sorted by `compare`.
    ///
    /// O(log n) accessor calls on seekable sequences; others are
    /// materialized first. Returns `None` when absent. If several elements
    /// match, any one of their indices may be returned.
    ///
    /// ```
    /// use standout_sequence::Sequence;
    ///
    /// let seq = Sequence::from(vec![1, 3, 5, 7]);
    /// assert_eq!(seq.binary_search(&5, |a, b| a.cmp(b)), Some(2));
    /// assert_eq!(seq.binary_search(&4, |a, b| a.cmp(b)), None);
    /// ```
    pub fn binary_search<F>(&self, value: &T, compare: F) -> Option<usize>
    where
        F: Fn(&T, &T) -> Ordering,
    {
        self.search_by(|item| compare(item, value))
    }

    /// Finds the index of the element whose `key` equals `target`, in a
    /// sequence sorted by that key.
    pub fn binary_search_by_key<K, F>(&self, target: &K, key: F) -> Option<usize>
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        self.search_by(|item| key(item).cmp(target))
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Left fold over a full pass.
    pub fn aggregate<A, F>(&self, seed: A, f: F) -> A
    where
        F: FnMut(A, T) -> A,
    {
        self.open().fold(seed, f)
    }

    /// Left fold seeded with the first element.
    ///
    /// Fails with [`SequenceError::EmptySequence`] on an empty sequence.
    pub fn reduce<F>(&self, f: F) -> Result<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.open().reduce(f).ok_or(SequenceError::EmptySequence)
    }

    /// Returns `true` if there is at least one element.
    pub fn any(&self) -> bool {
        if self.can_seek() {
            self.count() > 0
        } else {
            self.open().next().is_some()
        }
    }

    /// Returns `true` if any element matches `predicate`.
    pub fn any_by<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.open().any(|item| predicate(&item))
    }

    /// Returns `true` if every element matches `predicate`.
    pub fn all<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        self.open().all(|item| predicate(&item))
    }

    /// Returns `true` if an element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.open().any(|item| item == *value)
    }

    /// Returns the only element.
    ///
    /// Fails with [`SequenceError::EmptySequence`] or
    /// [`SequenceError::MultipleElements`]. Stops after the second element.
    pub fn single(&self) -> Result<T> {
        self.single_or_default()?
            .ok_or(SequenceError::EmptySequence)
    }

    /// Returns the only element, or `None` if there is none.
    ///
    /// Still fails with [`SequenceError::MultipleElements`] on more than one.
    pub fn single_or_default(&self) -> Result<Option<T>> {
        let mut cursor = self.open();
        match (cursor.next(), cursor.next()) {
            (None, _) => Ok(None),
            (Some(item), None) => Ok(Some(item)),
            (Some(_), Some(_)) => Err(SequenceError::MultipleElements),
        }
    }

    /// Returns the smallest element.
    pub fn min(&self) -> Result<T>
    where
        T: Ord,
    {
        self.open().min().ok_or(SequenceError::EmptySequence)
    }

    /// Returns the largest element.
    pub fn max(&self) -> Result<T>
    where
        T: Ord,
    {
        self.open().max().ok_or(SequenceError::EmptySequence)
    }

    /// Returns the element with the smallest `key`; the first one on ties.
    pub fn min_by_key<K, F>(&self, key: F) -> Result<T>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.open().min_by_key(key).ok_or(SequenceError::EmptySequence)
    }

    /// Returns the element with the largest `key`; the last one on ties.
    pub fn max_by_key<K, F>(&self, key: F) -> Result<T>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.open().max_by_key(key).ok_or(SequenceError::EmptySequence)
    }

    /// Sums the elements. An empty sequence sums to zero.
    pub fn sum(&self) -> T
    where
        T: iter::Sum<T>,
    {
        self.open().sum()
    }

    /// Arithmetic mean as `f64`.
    ///
    /// Fails with [`SequenceError::EmptySequence`] on an empty sequence.
    pub fn average(&self) -> Result<f64>
    where
        T: Into<f64>,
    {
        let (total, count) = self.open().fold((0.0_f64, 0usize), |(total, count), item| {
            let value: f64 = item.into();
            (total + value, count + 1)
        });
        if count == 0 {
            return Err(SequenceError::EmptySequence);
        }
        Ok(total / count as f64)
    }

    /// Returns `true` if both sequences yield equal elements in order.
    ///
    /// When both sides are seekable, differing counts answer without
    /// iterating.
    pub fn sequence_equal(&self, other: impl Into<Sequence<'a, T>>) -> bool
    where
        T: PartialEq,
    {
        let other = other.into();
        if self.can_seek() && other.can_seek() && self.count() != other.count() {
            return false;
        }
        self.open().eq(other.open())
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Collects into a hash map. Later elements overwrite earlier ones with
    /// the same key.
    pub fn to_hash_map<K, V, FK, FV>(&self, key: FK, value: FV) -> AHashMap<K, V>
    where
        K: Hash + Eq,
        FK: Fn(&T) -> K,
        FV: Fn(T) -> V,
    {
        self.open().map(|item| (key(&item), value(item))).collect()
    }

    /// Runs `f` on each element.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(T),
    {
        self.open().for_each(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn unseekable(items: Vec<i32>) -> Sequence<'static, i32> {
        Sequence::from_fn(move || items.clone())
    }

    #[test]
    fn take_last_and_skip_last() {
        let seekable = Sequence::from(vec![1, 2, 3, 4, 5]);
        let scanned = unseekable(vec![1, 2, 3, 4, 5]);

        for seq in [&seekable, &scanned] {
            assert_eq!(seq.take_last(2).to_vec(), vec![4, 5]);
            assert_eq!(seq.take_last(9).to_vec(), vec![1, 2, 3, 4, 5]);
            assert!(seq.take_last(0).to_vec().is_empty());
            assert_eq!(seq.skip_last(2).to_vec(), vec![1, 2, 3]);
            assert_eq!(seq.skip_last(0).to_vec(), vec![1, 2, 3, 4, 5]);
            assert!(seq.skip_last(9).to_vec().is_empty());
            assert_eq!(seq.take_last(3).count(), 3);
            assert_eq!(seq.skip_last(3).count(), 2);
        }

        let tail = seekable.take_last(2);
        assert!(tail.can_seek());
        assert_eq!(tail.try_get_at(0), Some(4));
        assert_eq!(tail.try_get_at(2), None);
        assert_eq!(seekable.skip_last(2).try_get_at(2), Some(3));
        assert_eq!(seekable.skip_last(2).try_get_at(3), None);
        assert!(!scanned.take_last(2).can_seek());
    }

    #[test]
    fn while_operators() {
        let seq = Sequence::from(vec![1, 2, 5, 1, 7]);
        assert_eq!(seq.take_while(|x| *x < 3).to_vec(), vec![1, 2]);
        assert_eq!(seq.skip_while(|x| *x < 3).to_vec(), vec![5, 1, 7]);
        assert!(!seq.take_while(|_| true).can_seek());
    }

    #[test]
    fn select_many_flattens() {
        let seq = Sequence::from(vec![1, 2, 3]).select_many(|x| vec![x; x as usize]);
        assert_eq!(seq.to_vec(), vec![1, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn append_prepend_keep_seekability() {
        let seq = Sequence::from(vec![2, 3]).append(4).prepend(1);
        assert!(seq.can_seek());
        assert_eq!(seq.count(), 4);
        assert_eq!(seq.element_at(3).unwrap(), 4);
        assert_eq!(seq.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn default_if_empty() {
        assert_eq!(Sequence::<i32>::empty().default_if_empty(7).to_vec(), vec![7]);
        assert_eq!(Sequence::from(vec![1, 2]).default_if_empty(7).to_vec(), vec![1, 2]);

        let empty = Sequence::<i32>::empty().default_if_empty(7);
        assert_eq!(empty.count(), 1);
        assert_eq!(empty.try_get_at(0), Some(7));
        assert_eq!(empty.try_get_at(1), None);
        assert!(empty.can_seek());
        assert_eq!(unseekable(vec![]).default_if_empty(3).to_vec(), vec![3]);
    }

    #[test]
    fn pad_to_length() {
        let seq = Sequence::from(vec![1, 2]).pad(4, 0);
        assert_eq!(seq.to_vec(), vec![1, 2, 0, 0]);
        assert_eq!(seq.count(), 4);
        assert_eq!(seq.try_get_at(3), Some(0));
        assert_eq!(seq.try_get_at(4), None);
        assert_eq!(Sequence::from(vec![1, 2, 3]).pad(2, 0).to_vec(), vec![1, 2, 3]);
        assert_eq!(unseekable(vec![5]).pad(3, 9).to_vec(), vec![5, 9, 9]);
    }

    #[test]
    fn reverse_seekable_reads_by_index() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let source = Sequence::from(vec![1, 2, 3, 4]);
        let seq = source
            .select(move |x, _| {
                counter.set(counter.get() + 1);
                x
            })
            .reverse();

        assert!(seq.can_seek());
        assert_eq!(seq.count(), 4);
        assert_eq!(seq.element_at(0).unwrap(), 4);
        assert_eq!(calls.get(), 1);
        assert_eq!(seq.try_get_at(4), None);
        assert_eq!(seq.to_vec(), vec![4, 3, 2, 1]);
        assert!(!source.was_iterated());
    }

    #[test]
    fn reverse_unseekable_materializes() {
        let seq = unseekable(vec![1, 2, 3]).reverse();
        assert!(!seq.can_seek());
        assert_eq!(seq.to_vec(), vec![3, 2, 1]);
        assert_eq!(seq.iter().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(seq.element_at(2).unwrap(), 1);
    }

    #[test]
    fn zip_stops_at_shorter() {
        let seq = Sequence::from(vec![1, 2, 3]).zip(vec!['a', 'b'], |n, c: char| format!("{c}{n}"));
        assert_eq!(seq.count(), 2);
        assert!(seq.can_seek());
        assert_eq!(seq.element_at(1).unwrap(), "b2");
        assert_eq!(seq.try_get_at(2), None);
        assert_eq!(seq.to_vec(), vec!["a1", "b2"]);

        let mixed = unseekable(vec![1, 2]).zip(vec![10, 20, 30], |a, b: i32| a + b);
        assert!(!mixed.can_seek());
        assert_eq!(mixed.to_vec(), vec![11, 22]);
    }

    #[test]
    fn chunk_batches() {
        let seq = Sequence::from(vec![1, 2, 3, 4, 5]).chunk(2).unwrap();
        assert!(seq.can_seek());
        assert_eq!(seq.count(), 3);
        assert_eq!(seq.element_at(2).unwrap(), vec![5]);
        assert_eq!(seq.try_get_at(3), None);

        let scanned = unseekable(vec![1, 2, 3]).chunk(3).unwrap();
        assert_eq!(scanned.to_vec(), vec![vec![1, 2, 3]]);
        assert_eq!(Sequence::<i32>::empty().chunk(4).unwrap().count(), 0);

        let err = Sequence::from(vec![1]).chunk(0).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidArgument { name: "size", .. }));
    }

    #[test]
    fn lag_and_lead() {
        let seq = Sequence::from(vec![1, 2, 3]);
        let expected_lag = vec![(1, 0), (2, 0), (3, 1)];
        let expected_lead = vec![(1, 3), (2, 0), (3, 0)];

        assert_eq!(seq.lag(2, 0).to_vec(), expected_lag);
        assert_eq!(seq.lead(2, 0).to_vec(), expected_lead);
        assert_eq!(unseekable(vec![1, 2, 3]).lag(2, 0).to_vec(), expected_lag);
        assert_eq!(unseekable(vec![1, 2, 3]).lead(2, 0).to_vec(), expected_lead);

        assert_eq!(seq.lag(0, 0).to_vec(), vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(seq.lead(1, 9).element_at(2).unwrap(), (3, 9));
        assert_eq!(seq.lag(1, 9).element_at(0).unwrap(), (1, 9));
        assert_eq!(seq.lead(1, 0).count(), 3);
    }

    #[test]
    fn seeded_shuffle_is_reproducible_permutation() {
        let seq = Sequence::from((0..50).collect::<Vec<i32>>());
        let shuffled = seq.shuffle_with_seed(1234);

        let first = shuffled.to_vec();
        assert_eq!(first, shuffled.to_vec());
        assert_eq!(shuffled.count(), 50);
        assert!(!shuffled.can_seek());

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, seq.to_vec());

        let mut unseeded = seq.shuffle().to_vec();
        unseeded.sort();
        assert_eq!(unseeded, seq.to_vec());
    }

    #[test]
    fn sample_is_bounded_subset() {
        let seq = Sequence::from((0..100).collect::<Vec<i32>>());
        let picked = seq.sample_with_seed(10, 7).to_vec();
        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|x| (0..100).contains(x)));
        assert_eq!(picked, seq.sample_with_seed(10, 7).to_vec());

        let mut distinct = picked.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 10);

        assert_eq!(seq.sample(500).count(), 100);
        assert!(seq.sample(0).to_vec().is_empty());
        assert_eq!(Sequence::from(vec![1, 2]).sample(5).to_vec().len(), 2);
    }

    #[test]
    fn distinct_family() {
        let seq = Sequence::from(vec![1, 2, 2, 3, 1]);
        assert_eq!(seq.distinct().to_vec(), vec![1, 2, 3]);
        assert_eq!(seq.distinct().to_vec(), vec![1, 2, 3]);
        assert_eq!(seq.distinct_by(|x| x % 2).to_vec(), vec![1, 2]);

        let words = Sequence::from(vec!["a", "B", "A", "b", "c"]);
        let folded = words.distinct_by_eq(|a, b| a.eq_ignore_ascii_case(b));
        assert_eq!(folded.to_vec(), vec!["a", "B", "c"]);
        assert!(!folded.can_seek());
    }

    #[test]
    fn set_operators() {
        let left = Sequence::from(vec![1, 2, 2, 3, 4]);
        assert_eq!(left.union(vec![4, 5, 1, 6]).to_vec(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(left.intersect(vec![4, 2, 9]).to_vec(), vec![2, 4]);
        assert_eq!(left.except(vec![2, 9]).to_vec(), vec![1, 3, 4]);
    }

    #[test]
    fn set_operators_by_eq() {
        let eq = |a: &&str, b: &&str| a.eq_ignore_ascii_case(b);
        let left = Sequence::from(vec!["x", "Y", "z", "X"]);
        assert_eq!(left.union_by_eq(vec!["y", "w"], eq).to_vec(), vec!["x", "Y", "z", "w"]);
        assert_eq!(left.intersect_by_eq(vec!["X", "Z"], eq).to_vec(), vec!["x", "z"]);
        assert_eq!(left.except_by_eq(vec!["y"], eq).to_vec(), vec!["x", "z"]);
    }

    #[test]
    fn set_operators_defer_the_other_side() {
        let other = unseekable(vec![2]);
        let seq = Sequence::from(vec![1, 2]).except(&other);
        let _cursor = seq.iter();
        assert!(!other.was_iterated());
        assert_eq!(seq.to_vec(), vec![1]);
        assert!(other.was_iterated());
    }

    #[test]
    fn binary_search_paths() {
        let sorted = Sequence::from(vec![1, 3, 5, 7, 9, 11]);
        for (index, value) in sorted.to_vec().into_iter().enumerate() {
            assert_eq!(sorted.binary_search(&value, |a, b| a.cmp(b)), Some(index));
        }
        assert_eq!(sorted.binary_search(&0, |a, b| a.cmp(b)), None);
        assert_eq!(sorted.binary_search(&12, |a, b| a.cmp(b)), None);

        let scanned = unseekable(vec![2, 4, 6]);
        assert_eq!(scanned.binary_search(&6, |a, b| a.cmp(b)), Some(2));
        assert_eq!(scanned.binary_search(&5, |a, b| a.cmp(b)), None);

        let people = Sequence::from(vec![("al", 20), ("bo", 30), ("cy", 40)]);
        assert_eq!(people.binary_search_by_key(&30, |p| p.1), Some(1));
        assert_eq!(Sequence::<i32>::empty().binary_search(&1, |a, b| a.cmp(b)), None);
    }

    #[test]
    fn folds() {
        let seq = Sequence::from(vec![1, 2, 3, 4]);
        assert_eq!(seq.aggregate(10, |acc, x| acc + x), 20);
        assert_eq!(seq.reduce(|a, b| a * b).unwrap(), 24);
        assert_eq!(
            Sequence::<i32>::empty().reduce(|a, b| a + b),
            Err(SequenceError::EmptySequence)
        );
        assert_eq!(seq.sum(), 10);
        assert_eq!(seq.average().unwrap(), 2.5);
        assert_eq!(Sequence::<i32>::empty().average(), Err(SequenceError::EmptySequence));
    }

    #[test]
    fn predicates() {
        let seq = Sequence::from(vec![1, 2, 3]);
        assert!(seq.any());
        assert!(!Sequence::<i32>::empty().any());
        assert!(!unseekable(vec![]).any());
        assert!(seq.any_by(|x| *x > 2));
        assert!(seq.all(|x| *x > 0));
        assert!(!seq.all(|x| *x > 1));
        assert!(seq.contains(&2));
        assert!(!seq.contains(&9));
    }

    #[test]
    fn single_variants() {
        assert_eq!(Sequence::from(vec![5]).single().unwrap(), 5);
        assert_eq!(Sequence::<i32>::empty().single(), Err(SequenceError::EmptySequence));
        assert_eq!(
            Sequence::from(vec![1, 2]).single(),
            Err(SequenceError::MultipleElements)
        );
        assert_eq!(Sequence::<i32>::empty().single_or_default(), Ok(None));
        assert_eq!(
            Sequence::from(vec![1, 2]).single_or_default(),
            Err(SequenceError::MultipleElements)
        );
    }

    #[test]
    fn single_stops_after_second_element() {
        let pulled = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pulled);
        let seq = Sequence::from_fn(|| 0..1_000).filter(move |_, _| {
            counter.set(counter.get() + 1);
            true
        });
        assert_eq!(seq.single(), Err(SequenceError::MultipleElements));
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn extremes() {
        let seq = Sequence::from(vec![3, 1, 4, 1, 5]);
        assert_eq!(seq.min().unwrap(), 1);
        assert_eq!(seq.max().unwrap(), 5);
        assert_eq!(Sequence::<i32>::empty().max(), Err(SequenceError::EmptySequence));

        let words = Sequence::from(vec!["pear", "fig", "banana"]);
        assert_eq!(words.min_by_key(|w| w.len()).unwrap(), "fig");
        assert_eq!(words.max_by_key(|w| w.len()).unwrap(), "banana");
    }

    #[test]
    fn sequence_equality() {
        let seq = Sequence::from(vec![1, 2, 3]);
        assert!(seq.sequence_equal(vec![1, 2, 3]));
        assert!(!seq.sequence_equal(vec![1, 2]));
        assert!(seq.sequence_equal(unseekable(vec![1, 2, 3])));
        assert!(!seq.sequence_equal(unseekable(vec![1, 3, 2])));
    }

    #[test]
    fn collection_helpers() {
        let seq = Sequence::from(vec![("a", 1), ("b", 2), ("a", 3)]);
        let map = seq.to_hash_map(|p| p.0, |p| p.1);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&3));

        let mut seen = Vec::new();
        seq.for_each(|p| seen.push(p.1));
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
