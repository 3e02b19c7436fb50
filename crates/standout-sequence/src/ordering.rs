//! Sort direction and key comparators for ordered sequences.
//!
//! Provides [`Dir`] for sort direction and the composite comparison used by
//! [`OrderedSequence`](crate::OrderedSequence).

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Returns `true` if this is descending order.
    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type Compare<'a, T> = Rc<dyn Fn(&T, &T) -> Ordering + 'a>;

/// One sort key: a comparison of two elements plus its direction.
pub(crate) struct KeySelector<'a, T> {
    compare: Compare<'a, T>,
    dir: Dir,
}

impl<T> Clone for KeySelector<'_, T> {
    fn clone(&self) -> Self {
        KeySelector {
            compare: Rc::clone(&self.compare),
            dir: self.dir,
        }
    }
}

impl<T> KeySelector<'_, T> {
    pub(crate) fn dir(&self) -> Dir {
        self.dir
    }

    /// Compares two elements according to this key and its direction.
    pub(crate) fn compare(&self, a: &T, b: &T) -> Ordering {
        self.dir.apply((self.compare)(a, b))
    }
}

impl<'a, T: 'a> KeySelector<'a, T> {
    /// Compares elements by a projected key using `compare`.
    pub(crate) fn by_key<K, F, C>(key: F, compare: C, dir: Dir) -> Self
    where
        F: Fn(&T) -> K + 'a,
        C: Fn(&K, &K) -> Ordering + 'a,
    {
        KeySelector {
            compare: Rc::new(move |a: &T, b: &T| compare(&key(a), &key(b))),
            dir,
        }
    }

    /// Compares elements directly.
    pub(crate) fn by_comparer<C>(compare: C, dir: Dir) -> Self
    where
        C: Fn(&T, &T) -> Ordering + 'a,
    {
        KeySelector {
            compare: Rc::new(compare),
            dir,
        }
    }
}

/// Compares two elements using a list of keys.
///
/// Uses the first key as the primary sort key, the second to break ties, etc.
/// If all keys compare equal, returns `Equal`.
pub(crate) fn compare_by_keys<T>(a: &T, b: &T, keys: &[KeySelector<'_, T>]) -> Ordering {
    for key in keys {
        let ordering = key.compare(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Asc.apply(Ordering::Greater), Ordering::Greater);
        assert_eq!(Dir::Asc.apply(Ordering::Equal), Ordering::Equal);

        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Greater), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn dir_display() {
        assert_eq!(Dir::Asc.to_string(), "asc");
        assert_eq!(Dir::Desc.to_string(), "desc");
        assert!(Dir::default().is_asc());
        assert!(Dir::Desc.is_desc());
    }

    #[test]
    fn key_selector_directions() {
        let asc = KeySelector::by_key(|x: &i32| *x, i32::cmp, Dir::Asc);
        let desc = KeySelector::by_key(|x: &i32| *x, i32::cmp, Dir::Desc);

        assert_eq!(asc.compare(&1, &2), Ordering::Less);
        assert_eq!(desc.compare(&1, &2), Ordering::Greater);
        assert_eq!(desc.dir(), Dir::Desc);
    }

    #[test]
    fn compare_by_multiple_keys() {
        #[derive(Debug)]
        struct Item {
            name: &'static str,
            priority: i64,
        }

        let keys = vec![
            KeySelector::by_key(|item: &Item| item.priority, i64::cmp, Dir::Asc),
            KeySelector::by_key(|item: &Item| item.name, |a: &&str, b: &&str| a.cmp(b), Dir::Asc),
        ];

        let items = [
            Item { name: "a", priority: 1 },
            Item { name: "b", priority: 1 },
            Item { name: "a", priority: 2 },
        ];

        // Same priority, compare by name
        assert_eq!(
            compare_by_keys(&items[0], &items[1], &keys),
            Ordering::Less
        );

        // Different priority
        assert_eq!(
            compare_by_keys(&items[0], &items[2], &keys),
            Ordering::Less
        );

        assert_eq!(
            compare_by_keys(&items[0], &items[0], &keys),
            Ordering::Equal
        );
    }

    #[test]
    fn comparer_keys() {
        let key = KeySelector::by_comparer(|a: &f64, b: &f64| a.total_cmp(b), Dir::Desc);
        assert_eq!(key.compare(&1.5, &2.5), Ordering::Greater);
    }
}
