//! The lazy [`Sequence`] wrapper and its core operators.
//!
//! Operators return new sequences that close over their parent. Building a
//! chain never touches the source; work happens only when the result is
//! iterated, counted, or indexed.
//!
//! # Capability propagation
//!
//! | Operator | Count | Positional access | Seekable |
//! |----------|-------|-------------------|----------|
//! | `select` | parent's count function | parent accessor composed with `f` | inherited |
//! | `filter` | full pass | scan | no |
//! | `skip(n)` | `count - n` (saturating) | parent at `i + n` | inherited |
//! | `take(n)` | `min(n, count)` | parent, `None` from `n` on | inherited |
//! | `concat` | sum | this, then other at `i - this_count` | both |

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::capability::{self, accessor, Access, CountFn};
use crate::cursor::{self, BoxedCursor, Cursor, CursorFactory};
use crate::error::{Result, SequenceError};
use crate::source::{AccessResolver, CountResolver, Source, SourceKind};

/// A lazy, restartable view over a source of values.
///
/// Cloning a sequence is cheap and shares its memoized capabilities. A
/// sequence holds no iteration state: each call to [`iter`](Self::iter)
/// opens an independent cursor.
///
/// # Example
///
/// ```
/// use standout_sequence::Sequence;
///
/// let seq = Sequence::from(vec![1, 2, 3, 4, 5])
///     .skip(1)
///     .select(|x, _| x * 10)
///     .take(3);
///
/// assert!(seq.can_seek());
/// assert_eq!(seq.count(), 3);
/// assert_eq!(seq.element_at(2).unwrap(), 40);
/// assert_eq!(seq.to_vec(), vec![20, 30, 40]);
/// ```
pub struct Sequence<'a, T> {
    inner: Rc<Inner<'a, T>>,
}

struct Inner<'a, T> {
    source: Source<'a, T>,
    cursor: CursorFactory<'a, T>,
    iterated: Rc<Cell<bool>>,
    count: OnceCell<CountFn<'a>>,
    access: OnceCell<Access<'a, T>>,
}

impl<T> Clone for Sequence<'_, T> {
    fn clone(&self) -> Self {
        Sequence {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Sequence<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("source", &self.inner.source.kind())
            .field("was_iterated", &self.inner.iterated.get())
            .finish_non_exhaustive()
    }
}

impl<'a, T: Clone + 'a> Default for Sequence<'a, T> {
    fn default() -> Self {
        Sequence::empty()
    }
}

impl<'a, T: Clone + 'a> Inner<'a, T> {
    fn infer_count(&self) -> CountFn<'a> {
        let kind = self.source.kind();
        match &self.source {
            Source::Array { items, .. } => {
                trace!(%kind, "count from known length");
                capability::fixed(items.len())
            }
            Source::Generated { len, .. } | Source::Collection { len } => {
                trace!(%kind, "count from known length");
                capability::fixed(*len)
            }
            Source::Sequence(inner) => {
                trace!(%kind, "count delegated to inner sequence");
                inner.count_fn()
            }
            Source::Derived {
                count: Some(resolve),
                ..
            } => {
                trace!(%kind, "count propagated from operator input");
                resolve()
            }
            Source::Factory | Source::Generator | Source::Derived { count: None, .. } => {
                trace!(%kind, "count falls back to a full pass");
                capability::counting(Rc::clone(&self.cursor))
            }
        }
    }

    fn infer_access(&self) -> Access<'a, T> {
        let kind = self.source.kind();
        match &self.source {
            Source::Array { items, .. } => {
                trace!(%kind, "direct positional access");
                let items = items.clone();
                Access::seek(accessor(move |index| items.get(index).cloned()))
            }
            Source::Generated { len, at, .. } => {
                trace!(%kind, "direct positional access");
                let (len, at) = (*len, Rc::clone(at));
                Access::seek(accessor(move |index| (index < len).then(|| at(index))))
            }
            Source::Sequence(inner) => {
                trace!(%kind, "positional access delegated to inner sequence");
                inner.access()
            }
            Source::Derived {
                access: Some(resolve),
                ..
            } => match resolve() {
                Some(access) => {
                    trace!(%kind, seek = access.can_seek(), "positional access propagated from operator input");
                    access
                }
                None => {
                    trace!(%kind, "positional access falls back to scanning");
                    Access::scanning(Rc::clone(&self.cursor))
                }
            },
            Source::Collection { .. }
            | Source::Factory
            | Source::Generator
            | Source::Derived { access: None, .. } => {
                trace!(%kind, "positional access falls back to scanning");
                Access::scanning(Rc::clone(&self.cursor))
            }
        }
    }
}

impl<'a, T: Clone + 'a> Sequence<'a, T> {
    /// Assembles a sequence. The cursor factory is wrapped so that the
    /// first invocation flips `was_iterated`.
    pub(crate) fn from_parts(source: Source<'a, T>, cursor: CursorFactory<'a, T>) -> Self {
        let iterated = Rc::new(Cell::new(false));
        let flag = Rc::clone(&iterated);
        let tracked = cursor::factory(move || {
            flag.set(true);
            cursor()
        });
        Sequence {
            inner: Rc::new(Inner {
                source,
                cursor: tracked,
                iterated,
                count: OnceCell::new(),
                access: OnceCell::new(),
            }),
        }
    }

    // ========================================================================
    // Capabilities
    // ========================================================================

    pub(crate) fn count_fn(&self) -> CountFn<'a> {
        Rc::clone(self.inner.count.get_or_init(|| self.inner.infer_count()))
    }

    pub(crate) fn access(&self) -> Access<'a, T> {
        self.inner
            .access
            .get_or_init(|| self.inner.infer_access())
            .clone()
    }

    pub(crate) fn cursor_factory(&self) -> CursorFactory<'a, T> {
        Rc::clone(&self.inner.cursor)
    }

    /// Opens a fresh cursor.
    pub(crate) fn open(&self) -> BoxedCursor<'a, T> {
        (self.inner.cursor)()
    }

    /// Returns the kind of source this sequence wraps.
    pub fn source_kind(&self) -> SourceKind {
        self.inner.source.kind()
    }

    /// Returns `true` once any cursor has been opened on this sequence.
    ///
    /// Observational only. Capability inference and O(1) counts do not
    /// open cursors, so they leave this `false`.
    pub fn was_iterated(&self) -> bool {
        self.inner.iterated.get()
    }

    /// Returns `true` if positional access is true random access.
    ///
    /// Resolves capabilities on first call but never iterates.
    pub fn can_seek(&self) -> bool {
        self.access().can_seek()
    }

    /// Returns the number of elements.
    ///
    /// O(1) when the count is known or propagated; otherwise a full pass.
    pub fn count(&self) -> usize {
        (self.count_fn())()
    }

    /// Returns the element at `index`, or `None` past the end.
    ///
    /// Direct on seekable sequences; otherwise walks a fresh cursor.
    pub fn try_get_at(&self, index: usize) -> Option<T> {
        self.access().get(index)
    }

    // ========================================================================
    // Core operators
    // ========================================================================

    /// Projects each element; `f` receives the element and its index.
    ///
    /// Count and positional access are propagated, so the projection only
    /// runs for elements that are actually requested.
    pub fn select<U, F>(&self, f: F) -> Sequence<'a, U>
    where
        U: Clone + 'a,
        F: Fn(T, usize) -> U + 'a,
    {
        let f = Rc::new(f);
        let (parent, project) = (self.clone(), Rc::clone(&f));
        let counted = self.clone();
        let indexed = self.clone();
        Derivation::new("select", move || {
            let project = Rc::clone(&project);
            Box::new(
                parent
                    .open()
                    .enumerate()
                    .map(move |(index, item)| project(item, index)),
            )
        })
        .count(move || counted.count_fn())
        .access(move || Some(indexed.access().map(Rc::clone(&f))))
        .build()
    }

    /// Projects each element without its index.
    pub fn map<U, F>(&self, f: F) -> Sequence<'a, U>
    where
        U: Clone + 'a,
        F: Fn(T) -> U + 'a,
    {
        self.select(move |item, _| f(item))
    }

    /// Keeps elements matching `predicate`.
    ///
    /// The predicate receives the element and its index in the input. The
    /// result is not seekable and counting it takes a full pass.
    pub fn filter<F>(&self, predicate: F) -> Sequence<'a, T>
    where
        F: Fn(&T, usize) -> bool + 'a,
    {
        let parent = self.clone();
        let predicate = Rc::new(predicate);
        Derivation::new("filter", move || {
            let predicate = Rc::clone(&predicate);
            Box::new(
                parent
                    .open()
                    .enumerate()
                    .filter(move |(index, item)| predicate(item, *index))
                    .map(|(_, item)| item),
            )
        })
        .build()
    }

    /// Bypasses the first `n` elements.
    pub fn skip(&self, n: usize) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Derivation::new("skip", move || Box::new(parent.open().skip(n)))
            .count(move || {
                let count = counted.count_fn();
                Rc::new(move || count().saturating_sub(n))
            })
            .access(move || {
                let access = indexed.access();
                let get = access.getter();
                Some(access.rebind(accessor(move |index| {
                    index.checked_add(n).and_then(|shifted| get(shifted))
                })))
            })
            .build()
    }

    /// Keeps at most the first `n` elements.
    pub fn take(&self, n: usize) -> Sequence<'a, T> {
        let (parent, counted, indexed) = (self.clone(), self.clone(), self.clone());
        Derivation::new("take", move || Box::new(parent.open().take(n)))
            .count(move || {
                let count = counted.count_fn();
                Rc::new(move || count().min(n))
            })
            .access(move || {
                let access = indexed.access();
                let get = access.getter();
                Some(access.rebind(accessor(move |index| if index < n { get(index) } else { None })))
            })
            .build()
    }

    /// Appends the elements of `other`.
    ///
    /// Seekable only if both sides are. Positional access resolves an index
    /// past this sequence against `other` without walking this one when it
    /// is seekable.
    pub fn concat(&self, other: impl Into<Sequence<'a, T>>) -> Sequence<'a, T> {
        let other = other.into();
        let (first, second) = (self.clone(), other.clone());
        let (first_count, second_count) = (self.clone(), other.clone());
        let (first_access, second_access) = (self.clone(), other);
        Derivation::new("concat", move || Box::new(first.open().chain(second.open())))
            .count(move || {
                let (a, b) = (first_count.count_fn(), second_count.count_fn());
                Rc::new(move || a().saturating_add(b()))
            })
            .access(move || {
                let (head, tail) = (first_access.access(), second_access.access());
                let head_count = first_access.count_fn();
                let (head_get, tail_get) = (head.getter(), tail.getter());
                let get = accessor(move |index| {
                    head_get(index).or_else(|| {
                        index
                            .checked_sub(head_count())
                            .and_then(|rest| tail_get(rest))
                    })
                });
                Some(if head.can_seek() && tail.can_seek() {
                    Access::seek(get)
                } else {
                    Access::scan(get)
                })
            })
            .build()
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    /// Opens a cursor over the elements.
    pub fn iter(&self) -> Cursor<'a, T> {
        Cursor::new(self.open())
    }

    /// Collects the elements into a vector.
    ///
    /// Seekable sequences are filled by index into an exactly-sized vector;
    /// others are collected from a cursor.
    pub fn to_vec(&self) -> Vec<T> {
        let access = self.access();
        if !access.can_seek() {
            return self.open().collect();
        }
        let count = self.count();
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            match access.get(index) {
                Some(item) => items.push(item),
                None => break,
            }
        }
        items
    }

    /// Returns the element at `index`.
    ///
    /// Fails with [`SequenceError::IndexOutOfRange`] past the end.
    pub fn element_at(&self, index: usize) -> Result<T> {
        self.try_get_at(index)
            .ok_or(SequenceError::IndexOutOfRange { index })
    }

    /// Returns the element at `index`, or `None` past the end.
    pub fn element_at_or_default(&self, index: usize) -> Option<T> {
        self.try_get_at(index)
    }

    /// Returns the first element, or `None` if there is none.
    pub fn first_or_default(&self) -> Option<T> {
        let access = self.access();
        if access.can_seek() {
            access.get(0)
        } else {
            self.open().next()
        }
    }

    /// Returns the first element.
    ///
    /// Fails with [`SequenceError::EmptySequence`] if there is none.
    pub fn first(&self) -> Result<T> {
        self.first_or_default().ok_or(SequenceError::EmptySequence)
    }

    /// Returns the last element, or `None` if there is none.
    ///
    /// Seekable sequences jump to `count - 1`; others take a full pass.
    pub fn last_or_default(&self) -> Option<T> {
        let access = self.access();
        if access.can_seek() {
            self.count().checked_sub(1).and_then(|index| access.get(index))
        } else {
            self.open().last()
        }
    }

    /// Returns the last element.
    ///
    /// Fails with [`SequenceError::EmptySequence`] if there is none.
    pub fn last(&self) -> Result<T> {
        self.last_or_default().ok_or(SequenceError::EmptySequence)
    }
}

impl<'s, 'a, T: Clone + 'a> IntoIterator for &'s Sequence<'a, T> {
    type Item = T;
    type IntoIter = Cursor<'a, T>;

    fn into_iter(self) -> Cursor<'a, T> {
        self.iter()
    }
}

impl<'a, T: Clone + 'a> IntoIterator for Sequence<'a, T> {
    type Item = T;
    type IntoIter = Cursor<'a, T>;

    fn into_iter(self) -> Cursor<'a, T> {
        self.iter()
    }
}

/// Builder for operator outputs.
///
/// The operator supplies its cursor and, where it can propagate them,
/// resolvers for count and positional access. Resolvers run at most once,
/// on first need.
pub(crate) struct Derivation<'a, T> {
    op: &'static str,
    cursor: CursorFactory<'a, T>,
    count: Option<CountResolver<'a>>,
    access: Option<AccessResolver<'a, T>>,
}

impl<'a, T: Clone + 'a> Derivation<'a, T> {
    pub(crate) fn new<F>(op: &'static str, cursor: F) -> Self
    where
        F: Fn() -> BoxedCursor<'a, T> + 'a,
    {
        Derivation {
            op,
            cursor: cursor::factory(cursor),
            count: None,
            access: None,
        }
    }

    pub(crate) fn count<F>(mut self, resolve: F) -> Self
    where
        F: Fn() -> CountFn<'a> + 'a,
    {
        self.count = Some(Box::new(resolve));
        self
    }

    pub(crate) fn access<F>(mut self, resolve: F) -> Self
    where
        F: Fn() -> Option<Access<'a, T>> + 'a,
    {
        self.access = Some(Box::new(resolve));
        self
    }

    pub(crate) fn build(self) -> Sequence<'a, T> {
        Sequence::from_parts(
            Source::Derived {
                op: self.op,
                count: self.count,
                access: self.access,
            },
            self.cursor,
        )
    }
}
