//! Ordered sequences: deferred multi-key sorting with slice restrictions.
//!
//! An [`OrderedSequence`] collects sort keys and [`Restriction`]s without
//! doing any work. The first consumption resolves the restrictions into a
//! [`Window`] over the conceptual sorted array and partially sorts only what
//! the window needs.
//!
//! ```
//! use standout_sequence::Sequence;
//!
//! let top = Sequence::from(vec![5, 3, 9, 1, 7])
//!     .order_by_descending(|x| *x)
//!     .take(2);
//!
//! assert_eq!(top.to_vec(), vec![9, 7]);
//! ```
//!
//! The sort is not stable: elements with equal keys come out in no
//! particular order.

use std::cell::{OnceCell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::cursor::{self, BoxedCursor, Cursor};
use crate::error::{Result, SequenceError};
use crate::ordering::{compare_by_keys, Dir, KeySelector};
use crate::restriction::{Restriction, Window};
use crate::sequence::{Derivation, Sequence};
use crate::sort::{partial_sort_with, SortOptions};

/// A sequence ordered by one or more keys, with deferred restrictions.
///
/// Builder methods (`then_by*`, `take`, `skip`, `take_last`, `skip_last`,
/// `with_sort_options`) take the ordered sequence by value and return it
/// with the new key or restriction appended. Clones share the same pending
/// plan.
///
/// The plan is frozen on first consumption. Calling a builder method after
/// that panics.
pub struct OrderedSequence<'a, T> {
    state: Rc<State<'a, T>>,
}

struct State<'a, T> {
    source: Sequence<'a, T>,
    plan: RefCell<Plan<'a, T>>,
    window: OnceCell<Window>,
    // Source materialized while sizing an unseekable input; consumed by the sort.
    raw: RefCell<Option<Vec<T>>>,
    sorted: OnceCell<Rc<Vec<T>>>,
}

struct Plan<'a, T> {
    keys: Vec<KeySelector<'a, T>>,
    restrictions: Vec<Restriction>,
    options: SortOptions,
}

impl<T> Clone for OrderedSequence<'_, T> {
    fn clone(&self) -> Self {
        OrderedSequence {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for OrderedSequence<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.state.plan.borrow();
        f.debug_struct("OrderedSequence")
            .field("keys", &plan.keys.iter().map(|k| k.dir()).collect::<Vec<_>>())
            .field("restrictions", &plan.restrictions)
            .field("window", &self.state.window.get())
            .finish_non_exhaustive()
    }
}

impl<'a, T: Clone + 'a> State<'a, T> {
    fn window(&self) -> Window {
        *self.window.get_or_init(|| {
            let n = if self.source.can_seek() {
                self.source.count()
            } else {
                let items = self.source.to_vec();
                let n = items.len();
                *self.raw.borrow_mut() = Some(items);
                n
            };
            let plan = self.plan.borrow();
            let window = Window::fold(n, &plan.restrictions);
            debug!(
                n,
                start = window.start(),
                end = window.end(),
                restrictions = plan.restrictions.len(),
                "ordered sequence window resolved"
            );
            window
        })
    }

    fn sorted(&self) -> Rc<Vec<T>> {
        let sorted = self.sorted.get_or_init(|| {
            let window = self.window();
            if window.is_empty() {
                self.raw.borrow_mut().take();
                debug!("empty window, sort skipped");
                return Rc::new(Vec::new());
            }
            let mut items = self
                .raw
                .borrow_mut()
                .take()
                .unwrap_or_else(|| self.source.to_vec());
            let plan = self.plan.borrow();
            partial_sort_with(
                &mut items,
                |a, b| compare_by_keys(a, b, &plan.keys),
                window.range(),
                &plan.options,
            );
            Rc::new(items)
        });
        Rc::clone(sorted)
    }

    /// The window clamped to what was actually materialized.
    fn slice_bounds(&self, sorted: &[T]) -> (usize, usize) {
        let window = self.window();
        let end = window.end().min(sorted.len());
        (window.start().min(end), end)
    }
}

impl<'a, T: Clone + 'a> OrderedSequence<'a, T> {
    fn new(source: Sequence<'a, T>, key: KeySelector<'a, T>) -> Self {
        OrderedSequence {
            state: Rc::new(State {
                source,
                plan: RefCell::new(Plan {
                    keys: vec![key],
                    restrictions: Vec::new(),
                    options: SortOptions::default(),
                }),
                window: OnceCell::new(),
                raw: RefCell::new(None),
                sorted: OnceCell::new(),
            }),
        }
    }

    fn amend(self, op: &str, change: impl FnOnce(&mut Plan<'a, T>)) -> Self {
        assert!(
            !self.is_resolved(),
            "cannot call {op} on an ordered sequence after it has been consumed"
        );
        change(&mut *self.state.plan.borrow_mut());
        self
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Adds an ascending tie-break key.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn then_by<K, F>(self, key: F) -> Self
    where
        K: Ord + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.then_by_with(key, K::cmp, Dir::Asc)
    }

    /// Adds a descending tie-break key.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn then_by_descending<K, F>(self, key: F) -> Self
    where
        K: Ord + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.then_by_with(key, K::cmp, Dir::Desc)
    }

    /// Adds a tie-break key compared with `compare` in direction `dir`.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn then_by_with<K, F, C>(self, key: F, compare: C, dir: Dir) -> Self
    where
        K: 'a,
        F: Fn(&T) -> K + 'a,
        C: Fn(&K, &K) -> Ordering + 'a,
    {
        let key = KeySelector::by_key(key, compare, dir);
        self.amend("then_by", |plan| plan.keys.push(key))
    }

    /// Legacy alias for adding a key to an already ordered sequence.
    ///
    /// Always fails with [`SequenceError::UnsupportedOperation`]; use
    /// [`then_by`](Self::then_by) instead.
    pub fn order_by<K, F>(&self, _key: F) -> Result<Self>
    where
        F: Fn(&T) -> K + 'a,
    {
        Err(SequenceError::UnsupportedOperation(
            "order_by on an ordered sequence, use then_by",
        ))
    }

    // ========================================================================
    // Restrictions
    // ========================================================================

    fn restrict(self, restriction: Restriction) -> Self {
        self.amend(restriction.as_str(), |plan| plan.restrictions.push(restriction))
    }

    /// Keeps at most the first `n` elements of the sorted output.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn take(self, n: usize) -> Self {
        self.restrict(Restriction::Take(n))
    }

    /// Keeps at most the last `n` elements of the sorted output.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn take_last(self, n: usize) -> Self {
        self.restrict(Restriction::TakeLast(n))
    }

    /// Drops the first `n` elements of the sorted output.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn skip(self, n: usize) -> Self {
        self.restrict(Restriction::Skip(n))
    }

    /// Drops the last `n` elements of the sorted output.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn skip_last(self, n: usize) -> Self {
        self.restrict(Restriction::SkipLast(n))
    }

    /// Replaces the sort tuning options.
    ///
    /// # Panics
    ///
    /// Panics if the sequence has already been consumed.
    pub fn with_sort_options(self, options: SortOptions) -> Self {
        self.amend("with_sort_options", |plan| plan.options = options)
    }

    /// Returns the pending restrictions, in declaration order.
    pub fn restrictions(&self) -> Vec<Restriction> {
        self.state.plan.borrow().restrictions.clone()
    }

    /// Returns `true` once the plan has been frozen by a consumption.
    pub fn is_resolved(&self) -> bool {
        self.state.window.get().is_some()
    }

    /// Returns `true` once the underlying source has been opened.
    ///
    /// Counting over a seekable source resolves the plan without opening it.
    pub fn was_iterated(&self) -> bool {
        self.state.source.was_iterated()
    }

    /// Always `false`: the sorted output has no positional access.
    pub fn can_seek(&self) -> bool {
        false
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    fn cursor(&self) -> BoxedCursor<'a, T> {
        let state = Rc::clone(&self.state);
        cursor::deferred(move || {
            let sorted = state.sorted();
            let (start, end) = state.slice_bounds(&sorted);
            Box::new((start..end).map(move |index| sorted[index].clone()))
        })
    }

    /// Opens a cursor over the sorted output.
    ///
    /// Sorting happens on the first pull, not here.
    pub fn iter(&self) -> Cursor<'a, T> {
        Cursor::new(self.cursor())
    }

    /// Collects the sorted output.
    pub fn to_vec(&self) -> Vec<T> {
        let sorted = self.state.sorted();
        let (start, end) = self.state.slice_bounds(&sorted);
        sorted[start..end].to_vec()
    }

    /// Returns the number of elements the restrictions keep.
    ///
    /// Resolves the window but does not sort.
    pub fn count(&self) -> usize {
        self.state.window().len()
    }

    /// Returns the first element of the sorted output, or `None`.
    pub fn first_or_default(&self) -> Option<T> {
        if self.state.window().is_empty() {
            return None;
        }
        let sorted = self.state.sorted();
        let (start, end) = self.state.slice_bounds(&sorted);
        (start < end).then(|| sorted[start].clone())
    }

    /// Returns the first element of the sorted output.
    pub fn first(&self) -> Result<T> {
        self.first_or_default().ok_or(SequenceError::EmptySequence)
    }

    /// Returns the last element of the sorted output, or `None`.
    pub fn last_or_default(&self) -> Option<T> {
        if self.state.window().is_empty() {
            return None;
        }
        let sorted = self.state.sorted();
        let (start, end) = self.state.slice_bounds(&sorted);
        (start < end).then(|| sorted[end - 1].clone())
    }

    /// Returns the last element of the sorted output.
    pub fn last(&self) -> Result<T> {
        self.last_or_default().ok_or(SequenceError::EmptySequence)
    }

    /// Positional access is not available on ordered sequences.
    ///
    /// Always fails with [`SequenceError::UnsupportedOperation`]. Convert
    /// with [`as_sequence`](Self::as_sequence) to index the sorted output.
    pub fn element_at(&self, _index: usize) -> Result<T> {
        Err(SequenceError::UnsupportedOperation(
            "element_at on an ordered sequence",
        ))
    }

    /// Positional access is not available on ordered sequences.
    ///
    /// Always fails with [`SequenceError::UnsupportedOperation`].
    pub fn element_at_or_default(&self, _index: usize) -> Result<Option<T>> {
        Err(SequenceError::UnsupportedOperation(
            "element_at_or_default on an ordered sequence",
        ))
    }

    /// Views the sorted output as a plain [`Sequence`].
    ///
    /// The count comes from the window. Positional access walks the sorted
    /// output, so the view is not seekable.
    pub fn as_sequence(&self) -> Sequence<'a, T> {
        let (ordered, counted) = (self.clone(), Rc::clone(&self.state));
        Derivation::new("order_by", move || ordered.cursor())
            .count(move || {
                let state = Rc::clone(&counted);
                Rc::new(move || state.window().len())
            })
            .build()
    }
}

impl<'a, T: Clone + 'a> From<OrderedSequence<'a, T>> for Sequence<'a, T> {
    fn from(ordered: OrderedSequence<'a, T>) -> Self {
        ordered.as_sequence()
    }
}

impl<'a, T: Clone + 'a> From<&OrderedSequence<'a, T>> for Sequence<'a, T> {
    fn from(ordered: &OrderedSequence<'a, T>) -> Self {
        ordered.as_sequence()
    }
}

impl<'s, 'a, T: Clone + 'a> IntoIterator for &'s OrderedSequence<'a, T> {
    type Item = T;
    type IntoIter = Cursor<'a, T>;

    fn into_iter(self) -> Cursor<'a, T> {
        self.iter()
    }
}

impl<'a, T: Clone + 'a> Sequence<'a, T> {
    /// Orders the sequence by `key`, ascending.
    pub fn order_by<K, F>(&self, key: F) -> OrderedSequence<'a, T>
    where
        K: Ord + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.order_by_with(key, K::cmp, Dir::Asc)
    }

    /// Orders the sequence by `key`, descending.
    pub fn order_by_descending<K, F>(&self, key: F) -> OrderedSequence<'a, T>
    where
        K: Ord + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.order_by_with(key, K::cmp, Dir::Desc)
    }

    /// Orders the sequence by `key` compared with `compare`.
    ///
    /// Use this for keys without a total order:
    ///
    /// ```
    /// use standout_sequence::{Dir, Sequence};
    ///
    /// let seq = Sequence::from(vec![2.5_f64, -1.0, 0.5]);
    /// let sorted = seq.order_by_with(|x| *x, |a: &f64, b: &f64| a.total_cmp(b), Dir::Asc);
    /// assert_eq!(sorted.to_vec(), vec![-1.0, 0.5, 2.5]);
    /// ```
    pub fn order_by_with<K, F, C>(&self, key: F, compare: C, dir: Dir) -> OrderedSequence<'a, T>
    where
        K: 'a,
        F: Fn(&T) -> K + 'a,
        C: Fn(&K, &K) -> Ordering + 'a,
    {
        OrderedSequence::new(self.clone(), KeySelector::by_key(key, compare, dir))
    }

    /// Orders the sequence with a comparator over whole elements.
    pub fn order_by_comparer<C>(&self, compare: C, dir: Dir) -> OrderedSequence<'a, T>
    where
        C: Fn(&T, &T) -> Ordering + 'a,
    {
        OrderedSequence::new(self.clone(), KeySelector::by_comparer(compare, dir))
    }
}

impl<'a, T: Clone + Ord + 'a> Sequence<'a, T> {
    /// Orders the elements themselves in direction `dir`.
    pub fn order(&self, dir: Dir) -> OrderedSequence<'a, T> {
        self.order_by_comparer(T::cmp, dir)
    }
}
