//! Source kinds and the constructors that wrap them.
//!
//! The set of sources is closed: every constructor picks its [`SourceKind`]
//! once, at wrap time, and capability inference matches on it. Nothing is
//! probed at runtime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;

use crate::capability::{Access, CountFn};
use crate::cursor::{self, BoxedCursor, CursorFactory};
use crate::error::{Result, SequenceError};
use crate::sequence::Sequence;

/// The kind of producer a sequence wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Contiguous elements, owned or borrowed. Seekable.
    Array,
    /// Characters of a string. Seekable.
    Text,
    /// Consecutive integers. Seekable.
    Range,
    /// One value repeated a fixed number of times. Seekable.
    Repeat,
    /// A container with a known size but no positional access (sets, maps).
    Collection,
    /// Another sequence; capabilities are inherited unchanged.
    Sequence,
    /// A restartable closure producing fresh iterators.
    Factory,
    /// A single-use iterator. A second pass yields nothing.
    Generator,
    /// The output of an operator.
    Derived(&'static str),
}

impl SourceKind {
    /// Returns the display name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Array => "array",
            SourceKind::Text => "text",
            SourceKind::Range => "range",
            SourceKind::Repeat => "repeat",
            SourceKind::Collection => "collection",
            SourceKind::Sequence => "sequence",
            SourceKind::Factory => "factory",
            SourceKind::Generator => "generator",
            SourceKind::Derived(op) => op,
        }
    }

    /// Returns `true` if this source is iterated afresh on every pass.
    ///
    /// Derived sequences are as restartable as the sources underneath them.
    pub fn is_restartable(self) -> bool {
        !matches!(self, SourceKind::Generator)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contiguous storage, owned or borrowed.
pub(crate) enum Elements<'a, T> {
    Owned(Rc<[T]>),
    Borrowed(&'a [T]),
}

impl<T> Clone for Elements<'_, T> {
    fn clone(&self) -> Self {
        match self {
            Elements::Owned(items) => Elements::Owned(Rc::clone(items)),
            Elements::Borrowed(items) => Elements::Borrowed(items),
        }
    }
}

impl<T> Elements<'_, T> {
    pub(crate) fn as_slice(&self) -> &[T] {
        match self {
            Elements::Owned(items) => items,
            Elements::Borrowed(items) => items,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }
}

/// Supplies a derived sequence's count on first need.
pub(crate) type CountResolver<'a> = Box<dyn Fn() -> CountFn<'a> + 'a>;

/// Supplies a derived sequence's access on first need. `None` falls back to
/// scanning the derived sequence's own cursor.
pub(crate) type AccessResolver<'a, T> = Box<dyn Fn() -> Option<Access<'a, T>> + 'a>;

/// What a sequence wraps.
pub(crate) enum Source<'a, T> {
    Array {
        kind: SourceKind,
        items: Elements<'a, T>,
    },
    Generated {
        kind: SourceKind,
        len: usize,
        at: Rc<dyn Fn(usize) -> T + 'a>,
    },
    Collection {
        len: usize,
    },
    Sequence(Sequence<'a, T>),
    Factory,
    Generator,
    Derived {
        op: &'static str,
        count: Option<CountResolver<'a>>,
        access: Option<AccessResolver<'a, T>>,
    },
}

impl<T> Source<'_, T> {
    pub(crate) fn kind(&self) -> SourceKind {
        match self {
            Source::Array { kind, .. } | Source::Generated { kind, .. } => *kind,
            Source::Collection { .. } => SourceKind::Collection,
            Source::Sequence(_) => SourceKind::Sequence,
            Source::Factory => SourceKind::Factory,
            Source::Generator => SourceKind::Generator,
            Source::Derived { op, .. } => SourceKind::Derived(*op),
        }
    }
}

fn elements_cursor<'a, T: Clone + 'a>(items: Elements<'a, T>) -> CursorFactory<'a, T> {
    match items {
        Elements::Borrowed(slice) => cursor::factory(move || Box::new(slice.iter().cloned())),
        Elements::Owned(items) => cursor::factory(move || {
            let items = Rc::clone(&items);
            Box::new((0..items.len()).map(move |index| items[index].clone()))
        }),
    }
}

fn generated_cursor<'a, T: 'a>(len: usize, at: Rc<dyn Fn(usize) -> T + 'a>) -> CursorFactory<'a, T> {
    cursor::factory(move || {
        let at = Rc::clone(&at);
        Box::new((0..len).map(move |index| at(index)))
    })
}

impl<'a, T: Clone + 'a> Sequence<'a, T> {
    fn array(kind: SourceKind, items: Elements<'a, T>) -> Self {
        let cursor = elements_cursor(items.clone());
        Sequence::from_parts(Source::Array { kind, items }, cursor)
    }

    fn generated(kind: SourceKind, len: usize, at: Rc<dyn Fn(usize) -> T + 'a>) -> Self {
        let cursor = generated_cursor(len, Rc::clone(&at));
        Sequence::from_parts(Source::Generated { kind, len, at }, cursor)
    }

    /// Wraps an owned vector. Seekable and restartable.
    pub fn from_vec(items: Vec<T>) -> Self {
        Sequence::array(SourceKind::Array, Elements::Owned(items.into()))
    }

    /// Wraps a borrowed slice without copying it. Seekable and restartable.
    pub fn from_slice(items: &'a [T]) -> Self {
        Sequence::array(SourceKind::Array, Elements::Borrowed(items))
    }

    /// A sequence with no elements.
    pub fn empty() -> Self {
        Sequence::from_vec(Vec::new())
    }

    /// `value` repeated `count` times. Seekable.
    pub fn repeat(value: T, count: usize) -> Self {
        Sequence::generated(SourceKind::Repeat, count, Rc::new(move |_: usize| value.clone()))
    }

    /// Wraps a borrowed container whose iterator knows its length.
    ///
    /// Sets, B-tree sets and deques fit here: the count is O(1), the
    /// sequence is restartable, but positional access has to scan.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    /// use standout_sequence::Sequence;
    ///
    /// let set: BTreeSet<i32> = [3, 1, 2].into_iter().collect();
    /// let seq = Sequence::from_collection(&set);
    /// assert_eq!(seq.count(), 3);
    /// assert!(!seq.can_seek());
    /// assert_eq!(seq.to_vec(), vec![1, 2, 3]);
    /// ```
    pub fn from_collection<C>(collection: &'a C) -> Self
    where
        C: ?Sized,
        &'a C: IntoIterator<Item = &'a T>,
        <&'a C as IntoIterator>::IntoIter: ExactSizeIterator + 'a,
    {
        let len = collection.into_iter().len();
        let cursor = cursor::factory(move || Box::new(collection.into_iter().cloned()));
        Sequence::from_parts(Source::Collection { len }, cursor)
    }

    /// Wraps a restartable factory of iterators.
    ///
    /// The factory is called once per pass, so every pass sees the values it
    /// produces at that time. Count and positional access fall back to full
    /// passes.
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'a,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        let cursor = cursor::factory(move || Box::new(factory().into_iter()));
        Sequence::from_parts(Source::Factory, cursor)
    }

    /// Wraps a single-use iterator.
    ///
    /// The first pass consumes it; later passes (including the ones `count`
    /// or `element_at` run internally) yield nothing. Restartability is a
    /// property of the source, not of the wrapper.
    ///
    /// ```
    /// use standout_sequence::Sequence;
    ///
    /// let seq = Sequence::from_generator(1..=3);
    /// assert_eq!(seq.to_vec(), vec![1, 2, 3]);
    /// assert!(seq.to_vec().is_empty());
    /// ```
    pub fn from_generator<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        let slot: RefCell<Option<BoxedCursor<'a, T>>> = RefCell::new(Some(Box::new(iter.into_iter())));
        let cursor = cursor::factory(move || {
            slot.borrow_mut()
                .take()
                .unwrap_or_else(|| Box::new(std::iter::empty()))
        });
        Sequence::from_parts(Source::Generator, cursor)
    }

    /// Wraps another sequence, inheriting its capabilities unchanged.
    pub fn from_sequence(inner: &Sequence<'a, T>) -> Self {
        let cursor = inner.cursor_factory();
        Sequence::from_parts(Source::Sequence(inner.clone()), cursor)
    }
}

impl<'a, K, V> Sequence<'a, (K, V)>
where
    K: Clone + 'a,
    V: Clone + 'a,
{
    /// Wraps a borrowed hash map as a sequence of cloned entries.
    ///
    /// Entry order is the map's iteration order.
    pub fn from_map<S: BuildHasher>(map: &'a HashMap<K, V, S>) -> Self {
        let len = map.len();
        let cursor = cursor::factory(move || Box::new(map.iter().map(|(k, v)| (k.clone(), v.clone()))));
        Sequence::from_parts(Source::Collection { len }, cursor)
    }
}

impl<'a> Sequence<'a, char> {
    /// Wraps the characters of a string. Seekable by character index.
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Sequence::array(SourceKind::Text, Elements::Owned(chars.into()))
    }
}

impl<'a> Sequence<'a, i64> {
    /// `count` consecutive integers starting at `start`. Seekable.
    ///
    /// Fails with [`SequenceError::InvalidArgument`] when the last value
    /// would overflow `i64`.
    pub fn range(start: i64, count: usize) -> Result<Self> {
        let fits = i64::try_from(count)
            .ok()
            .and_then(|count| start.checked_add(count))
            .is_some();
        if !fits {
            return Err(SequenceError::invalid_argument(
                "count",
                format!("range starting at {start} with {count} values overflows i64"),
            ));
        }
        Ok(Sequence::generated(
            SourceKind::Range,
            count,
            Rc::new(move |index: usize| start + index as i64),
        ))
    }
}

impl<'a, T: Clone + 'a> From<Vec<T>> for Sequence<'a, T> {
    fn from(items: Vec<T>) -> Self {
        Sequence::from_vec(items)
    }
}

impl<'a, T: Clone + 'a> From<&'a [T]> for Sequence<'a, T> {
    fn from(items: &'a [T]) -> Self {
        Sequence::from_slice(items)
    }
}

impl<'a, T: Clone + 'a> From<&'a Vec<T>> for Sequence<'a, T> {
    fn from(items: &'a Vec<T>) -> Self {
        Sequence::from_slice(items.as_slice())
    }
}

impl<'a, T: Clone + 'a, const N: usize> From<[T; N]> for Sequence<'a, T> {
    fn from(items: [T; N]) -> Self {
        Sequence::from_vec(items.into())
    }
}

impl<'a> From<&str> for Sequence<'a, char> {
    fn from(text: &str) -> Self {
        Sequence::from_text(text)
    }
}

impl<'a, T: Clone + 'a> From<&Sequence<'a, T>> for Sequence<'a, T> {
    fn from(inner: &Sequence<'a, T>) -> Self {
        Sequence::from_sequence(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet, VecDeque};

    #[test]
    fn kinds() {
        assert_eq!(Sequence::from_vec(vec![1]).source_kind(), SourceKind::Array);
        assert_eq!(Sequence::from_text("ab").source_kind(), SourceKind::Text);
        assert_eq!(Sequence::range(0, 3).unwrap().source_kind(), SourceKind::Range);
        assert_eq!(Sequence::repeat('x', 2).source_kind(), SourceKind::Repeat);
        assert_eq!(Sequence::from_fn(|| 0..3).source_kind(), SourceKind::Factory);
        assert_eq!(Sequence::from_generator(0..3).source_kind(), SourceKind::Generator);

        let set: HashSet<i32> = [1, 2].into_iter().collect();
        assert_eq!(Sequence::from_collection(&set).source_kind(), SourceKind::Collection);
    }

    #[test]
    fn kind_display() {
        assert_eq!(SourceKind::Array.to_string(), "array");
        assert_eq!(SourceKind::Derived("select").to_string(), "select");
        assert!(SourceKind::Factory.is_restartable());
        assert!(!SourceKind::Generator.is_restartable());
    }

    #[test]
    fn seekable_sources() {
        assert!(Sequence::from_vec(vec![1, 2]).can_seek());
        assert!(Sequence::from_slice(&[1, 2][..]).can_seek());
        assert!(Sequence::from_text("héllo").can_seek());
        assert!(Sequence::range(5, 3).unwrap().can_seek());
        assert!(Sequence::repeat(1, 3).can_seek());
    }

    #[test]
    fn unseekable_sources() {
        let set: BTreeSet<i32> = [1, 2].into_iter().collect();
        assert!(!Sequence::from_collection(&set).can_seek());
        assert!(!Sequence::from_fn(|| vec![1, 2]).can_seek());
        assert!(!Sequence::from_generator(vec![1, 2]).can_seek());
    }

    #[test]
    fn text_indexes_by_char() {
        let seq = Sequence::from_text("héllo");
        assert_eq!(seq.count(), 5);
        assert_eq!(seq.try_get_at(1), Some('é'));
        assert_eq!(seq.try_get_at(5), None);
    }

    #[test]
    fn range_values_and_overflow() {
        let seq = Sequence::range(-2, 4).unwrap();
        assert_eq!(seq.to_vec(), vec![-2, -1, 0, 1]);
        assert_eq!(seq.try_get_at(3), Some(1));
        assert_eq!(seq.try_get_at(4), None);

        let err = Sequence::range(i64::MAX, 2).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidArgument { name: "count", .. }));
    }

    #[test]
    fn repeat_values() {
        let seq = Sequence::repeat("a", 3);
        assert_eq!(seq.to_vec(), vec!["a", "a", "a"]);
        assert_eq!(seq.count(), 3);
    }

    #[test]
    fn collection_counts_without_iterating() {
        let deque: VecDeque<i32> = (1..=4).collect();
        let seq = Sequence::from_collection(&deque);
        assert_eq!(seq.count(), 4);
        assert!(!seq.was_iterated());
        assert_eq!(seq.element_at(2).unwrap(), 3);
        assert!(seq.was_iterated());
    }

    #[test]
    fn map_entries() {
        let mut map = HashMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        let seq = Sequence::from_map(&map);
        assert_eq!(seq.count(), 2);

        let mut entries = seq.to_vec();
        entries.sort();
        assert_eq!(entries, vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn factory_is_restartable() {
        let seq = Sequence::from_fn(|| vec![1, 2, 3]);
        assert_eq!(seq.to_vec(), vec![1, 2, 3]);
        assert_eq!(seq.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn generator_is_single_use() {
        let seq = Sequence::from_generator(vec![1, 2, 3]);
        assert_eq!(seq.to_vec(), vec![1, 2, 3]);
        assert_eq!(seq.to_vec(), Vec::<i32>::new());
        assert_eq!(seq.count(), 0);
    }

    #[test]
    fn wrapped_sequence_inherits_capabilities() {
        let inner = Sequence::from_vec(vec![1, 2, 3]);
        let outer = Sequence::from_sequence(&inner);
        assert_eq!(outer.source_kind(), SourceKind::Sequence);
        assert!(outer.can_seek());
        assert_eq!(outer.count(), 3);

        let unseekable = Sequence::from_fn(|| vec![1, 2]);
        assert!(!Sequence::from(&unseekable).can_seek());
    }

    #[test]
    fn conversions() {
        let v = vec![1, 2];
        assert_eq!(Sequence::from(&v).to_vec(), vec![1, 2]);
        assert_eq!(Sequence::from([1, 2, 3]).count(), 3);
        assert_eq!(Sequence::from("ab").to_vec(), vec!['a', 'b']);
        assert!(Sequence::<i32>::empty().to_vec().is_empty());
    }
}
