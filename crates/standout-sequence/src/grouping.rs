//! Grouping and hash joins.
//!
//! `group_by` and the join family share one structure: a [`Lookup`], an
//! insertion-ordered map from key to the values that produced it. Building a
//! lookup is a single full pass; the operators that need one build it on the
//! first pull of each cursor.

use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::rc::Rc;

use ahash::AHashMap;

use crate::cursor;
use crate::sequence::{Derivation, Sequence};

// ============================================================================
// Grouping
// ============================================================================

/// A group of elements sharing a key.
///
/// Derefs to the group's items, so every [`Sequence`] operator applies
/// directly. The items are array-backed and seekable.
///
/// # Example
///
/// ```
/// use standout_sequence::Sequence;
///
/// let groups = Sequence::from(vec![1, 2, 2, 3]).group_by(|x| x % 2 == 0).to_vec();
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(*groups[0].key(), false);
/// assert_eq!(groups[0].to_vec(), vec![1, 3]);
/// assert_eq!(*groups[1].key(), true);
/// assert_eq!(groups[1].count(), 2);
/// ```
pub struct Grouping<'a, K, T> {
    key: K,
    items: Sequence<'a, T>,
}

impl<'a, K, T: Clone + 'a> Grouping<'a, K, T> {
    pub(crate) fn new(key: K, items: Vec<T>) -> Self {
        Grouping {
            key,
            items: Sequence::from_vec(items),
        }
    }

    /// Returns the group's key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the group's items.
    pub fn items(&self) -> &Sequence<'a, T> {
        &self.items
    }

    /// Splits the group into its key and items.
    pub fn into_parts(self) -> (K, Sequence<'a, T>) {
        (self.key, self.items)
    }
}

impl<K: Clone, T> Clone for Grouping<'_, K, T> {
    fn clone(&self) -> Self {
        Grouping {
            key: self.key.clone(),
            items: self.items.clone(),
        }
    }
}

impl<K: fmt::Debug, T> fmt::Debug for Grouping<'_, K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping")
            .field("key", &self.key)
            .field("items", &self.items)
            .finish()
    }
}

impl<'a, K, T> Deref for Grouping<'a, K, T> {
    type Target = Sequence<'a, T>;

    fn deref(&self) -> &Sequence<'a, T> {
        &self.items
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// Values grouped by key, in first-occurrence key order.
#[derive(Debug, Clone)]
pub struct Lookup<K, V> {
    index: AHashMap<K, usize>,
    groups: Vec<(K, Vec<V>)>,
}

impl<K, V> Default for Lookup<K, V> {
    fn default() -> Self {
        Lookup {
            index: AHashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, V> Lookup<K, V> {
    /// Groups `items` by `key`, storing `value(item)` for each.
    pub(crate) fn collect<T, F, G>(items: impl Iterator<Item = T>, key: F, value: G) -> Self
    where
        F: Fn(&T) -> K,
        G: Fn(T) -> V,
    {
        let mut lookup = Lookup::default();
        for item in items {
            let key = key(&item);
            lookup.push(key, value(item));
        }
        lookup
    }

    fn push(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(value),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![value]));
            }
        }
    }

    /// Returns the values stored under `key`.
    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Returns `true` if any value was stored under `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the keys in first-occurrence order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|(key, _)| key)
    }

    /// Iterates over keys and their values in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups
            .iter()
            .map(|(key, values)| (key, values.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub(crate) fn into_groups(self) -> std::vec::IntoIter<(K, Vec<V>)> {
        self.groups.into_iter()
    }
}

// ============================================================================
// Operators
// ============================================================================

impl<'a, T: Clone + 'a> Sequence<'a, T> {
    /// Groups elements by `key`.
    ///
    /// One full pass on the first pull; groups come out in the order their
    /// keys first occur.
    pub fn group_by<K, F>(&self, key: F) -> Sequence<'a, Grouping<'a, K, T>>
    where
        K: Hash + Eq + Clone + 'a,
        F: Fn(&T) -> K + 'a,
    {
        self.group_by_select(key, |item| item)
    }

    /// Groups `value(item)` by `key(item)`.
    pub fn group_by_select<K, V, F, G>(&self, key: F, value: G) -> Sequence<'a, Grouping<'a, K, V>>
    where
        K: Hash + Eq + Clone + 'a,
        V: Clone + 'a,
        F: Fn(&T) -> K + 'a,
        G: Fn(T) -> V + 'a,
    {
        let parent = self.clone();
        let (key, value) = (Rc::new(key), Rc::new(value));
        Derivation::new("group_by", move || {
            let (parent, key, value) = (parent.clone(), Rc::clone(&key), Rc::clone(&value));
            cursor::deferred(move || {
                let lookup = Lookup::collect(parent.open(), |item| key(item), |item| value(item));
                Box::new(
                    lookup
                        .into_groups()
                        .map(|(key, items)| Grouping::new(key, items)),
                )
            })
        })
        .build()
    }

    /// Collects the elements into a [`Lookup`] keyed by `key`.
    pub fn to_lookup<K, F>(&self, key: F) -> Lookup<K, T>
    where
        K: Hash + Eq + Clone,
        F: Fn(&T) -> K,
    {
        Lookup::collect(self.open(), key, |item| item)
    }

    /// Inner hash join.
    ///
    /// `inner` is grouped by `inner_key` once per pass, then each element of
    /// this sequence is paired with every inner element whose key is equal.
    /// Output follows this sequence's order, then `inner`'s. O(n + m).
    ///
    /// ```
    /// use standout_sequence::Sequence;
    ///
    /// let owners = Sequence::from(vec![(1, "ann"), (2, "bob")]);
    /// let pets = vec![("rex", 1), ("tom", 2), ("fido", 1)];
    ///
    /// let pairs = owners.join(pets, |o| o.0, |p| p.1, |o, p| (o.1, p.0));
    /// assert_eq!(pairs.to_vec(), vec![("ann", "rex"), ("ann", "fido"), ("bob", "tom")]);
    /// ```
    pub fn join<I, K, R, FO, FI, FR>(
        &self,
        inner: impl Into<Sequence<'a, I>>,
        outer_key: FO,
        inner_key: FI,
        result: FR,
    ) -> Sequence<'a, R>
    where
        I: Clone + 'a,
        K: Hash + Eq + Clone + 'a,
        R: Clone + 'a,
        FO: Fn(&T) -> K + 'a,
        FI: Fn(&I) -> K + 'a,
        FR: Fn(T, I) -> R + 'a,
    {
        let (outer, inner) = (self.clone(), inner.into());
        let (outer_key, inner_key, result) = (Rc::new(outer_key), Rc::new(inner_key), Rc::new(result));
        Derivation::new("join", move || {
            let (outer, inner) = (outer.clone(), inner.clone());
            let (outer_key, inner_key, result) =
                (Rc::clone(&outer_key), Rc::clone(&inner_key), Rc::clone(&result));
            cursor::deferred(move || {
                let lookup = Lookup::collect(inner.open(), |item| inner_key(item), |item| item);
                Box::new(outer.open().flat_map(move |item| {
                    let matches = lookup
                        .get(&outer_key(&item))
                        .map(<[I]>::to_vec)
                        .unwrap_or_default();
                    let result = Rc::clone(&result);
                    matches
                        .into_iter()
                        .map(move |other| result(item.clone(), other))
                }))
            })
        })
        .build()
    }

    /// Inner join under a custom key equality.
    ///
    /// Nested loop: every outer element is tested against every inner
    /// element, O(n·m). Prefer [`join`](Self::join) when keys are hashable.
    pub fn join_by_eq<I, K, R, FO, FI, E, FR>(
        &self,
        inner: impl Into<Sequence<'a, I>>,
        outer_key: FO,
        inner_key: FI,
        eq: E,
        result: FR,
    ) -> Sequence<'a, R>
    where
        I: Clone + 'a,
        K: 'a,
        R: Clone + 'a,
        FO: Fn(&T) -> K + 'a,
        FI: Fn(&I) -> K + 'a,
        E: Fn(&K, &K) -> bool + 'a,
        FR: Fn(T, I) -> R + 'a,
    {
        let matcher = Matcher::new(inner.into(), outer_key, inner_key, eq);
        let (outer, result) = (self.clone(), Rc::new(result));
        Derivation::new("join_by_eq", move || {
            let (outer, matcher, result) = (outer.clone(), matcher.clone(), Rc::clone(&result));
            cursor::deferred(move || {
                let matches = matcher.prepare();
                Box::new(outer.open().flat_map(move |item| {
                    let result = Rc::clone(&result);
                    matches(&item)
                        .into_iter()
                        .map(move |other| result(item.clone(), other))
                }))
            })
        })
        .build()
    }

    /// Groups `inner` by key and pairs each element of this sequence with
    /// its matches.
    ///
    /// Elements with no match receive an empty sequence. Hash-based,
    /// O(n + m).
    pub fn group_join<I, K, R, FO, FI, FR>(
        &self,
        inner: impl Into<Sequence<'a, I>>,
        outer_key: FO,
        inner_key: FI,
        result: FR,
    ) -> Sequence<'a, R>
    where
        I: Clone + 'a,
        K: Hash + Eq + Clone + 'a,
        R: Clone + 'a,
        FO: Fn(&T) -> K + 'a,
        FI: Fn(&I) -> K + 'a,
        FR: Fn(T, Sequence<'a, I>) -> R + 'a,
    {
        let (outer, inner) = (self.clone(), inner.into());
        let (outer_key, inner_key, result) = (Rc::new(outer_key), Rc::new(inner_key), Rc::new(result));
        Derivation::new("group_join", move || {
            let (outer, inner) = (outer.clone(), inner.clone());
            let (outer_key, inner_key, result) =
                (Rc::clone(&outer_key), Rc::clone(&inner_key), Rc::clone(&result));
            cursor::deferred(move || {
                let lookup = Lookup::collect(inner.open(), |item| inner_key(item), |item| item);
                Box::new(outer.open().map(move |item| {
                    let matches = lookup
                        .get(&outer_key(&item))
                        .map(<[I]>::to_vec)
                        .unwrap_or_default();
                    result(item, Sequence::from_vec(matches))
                }))
            })
        })
        .build()
    }

    /// [`group_join`](Self::group_join) under a custom key equality.
    ///
    /// Nested loop, O(n·m).
    pub fn group_join_by_eq<I, K, R, FO, FI, E, FR>(
        &self,
        inner: impl Into<Sequence<'a, I>>,
        outer_key: FO,
        inner_key: FI,
        eq: E,
        result: FR,
    ) -> Sequence<'a, R>
    where
        I: Clone + 'a,
        K: 'a,
        R: Clone + 'a,
        FO: Fn(&T) -> K + 'a,
        FI: Fn(&I) -> K + 'a,
        E: Fn(&K, &K) -> bool + 'a,
        FR: Fn(T, Sequence<'a, I>) -> R + 'a,
    {
        let matcher = Matcher::new(inner.into(), outer_key, inner_key, eq);
        let (outer, result) = (self.clone(), Rc::new(result));
        Derivation::new("group_join_by_eq", move || {
            let (outer, matcher, result) = (outer.clone(), matcher.clone(), Rc::clone(&result));
            cursor::deferred(move || {
                let matches = matcher.prepare();
                Box::new(
                    outer
                        .open()
                        .map(move |item| {
                            let found = matches(&item);
                            result(item, Sequence::from_vec(found))
                        }),
                )
            })
        })
        .build()
    }
}

/// Nested-loop matching for the custom-equality joins.
struct Matcher<'a, T, I, K> {
    inner: Sequence<'a, I>,
    outer_key: Rc<dyn Fn(&T) -> K + 'a>,
    inner_key: Rc<dyn Fn(&I) -> K + 'a>,
    eq: Rc<dyn Fn(&K, &K) -> bool + 'a>,
}

impl<T, I, K> Clone for Matcher<'_, T, I, K> {
    fn clone(&self) -> Self {
        Matcher {
            inner: self.inner.clone(),
            outer_key: Rc::clone(&self.outer_key),
            inner_key: Rc::clone(&self.inner_key),
            eq: Rc::clone(&self.eq),
        }
    }
}

impl<'a, T: 'a, I: Clone + 'a, K: 'a> Matcher<'a, T, I, K> {
    fn new<FO, FI, E>(inner: Sequence<'a, I>, outer_key: FO, inner_key: FI, eq: E) -> Self
    where
        FO: Fn(&T) -> K + 'a,
        FI: Fn(&I) -> K + 'a,
        E: Fn(&K, &K) -> bool + 'a,
    {
        Matcher {
            inner,
            outer_key: Rc::new(outer_key),
            inner_key: Rc::new(inner_key),
            eq: Rc::new(eq),
        }
    }

    /// Materializes the keyed inner side and returns a function finding
    /// the matches of one outer element.
    fn prepare(self) -> impl Fn(&T) -> Vec<I> + 'a {
        let keyed: Vec<(K, I)> = self
            .inner
            .open()
            .map(|item| ((self.inner_key)(&item), item))
            .collect();
        let (outer_key, eq) = (self.outer_key, self.eq);
        move |item: &T| {
            let key = outer_key(item);
            keyed
                .iter()
                .filter(|(other, _)| eq(&key, other))
                .map(|(_, other)| other.clone())
                .collect()
        }
    }
}
