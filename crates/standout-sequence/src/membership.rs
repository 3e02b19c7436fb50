//! Membership sets behind the set-like operators.
//!
//! Two strategies, picked by which operator the caller uses:
//!
//! - [`Hashed`]: `Hash + Eq` values in an `AHashSet`. O(1) per test.
//! - [`Linear`]: a caller-supplied equality. Every test scans the values
//!   seen so far, so a full pass is O(n²). This is the slow path.

use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashSet;

/// A set of values seen during one pass.
pub(crate) trait Membership<T> {
    /// Records `item`. Returns `true` if it was not already present.
    fn insert(&mut self, item: &T) -> bool;

    /// Forgets `item`. Returns `true` if it was present.
    fn remove(&mut self, item: &T) -> bool;

    fn extend(&mut self, items: impl IntoIterator<Item = T>)
    where
        Self: Sized,
    {
        for item in items {
            self.insert(&item);
        }
    }
}

/// Hash-based membership.
pub(crate) struct Hashed<T> {
    seen: AHashSet<T>,
}

impl<T: Hash + Eq + Clone> Hashed<T> {
    pub(crate) fn new() -> Self {
        Hashed {
            seen: AHashSet::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> Membership<T> for Hashed<T> {
    fn insert(&mut self, item: &T) -> bool {
        if self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.clone())
    }

    fn remove(&mut self, item: &T) -> bool {
        self.seen.remove(item)
    }
}

pub(crate) type Equality<'a, T> = Rc<dyn Fn(&T, &T) -> bool + 'a>;

/// Membership under a custom equality, by pairwise scan.
pub(crate) struct Linear<'a, T> {
    seen: Vec<T>,
    eq: Equality<'a, T>,
}

impl<'a, T: Clone> Linear<'a, T> {
    pub(crate) fn new(eq: Equality<'a, T>) -> Self {
        Linear {
            seen: Vec::new(),
            eq,
        }
    }

    fn position(&self, item: &T) -> Option<usize> {
        self.seen.iter().position(|seen| (self.eq)(seen, item))
    }
}

impl<T: Clone> Membership<T> for Linear<'_, T> {
    fn insert(&mut self, item: &T) -> bool {
        if self.position(item).is_some() {
            return false;
        }
        self.seen.push(item.clone());
        true
    }

    fn remove(&mut self, item: &T) -> bool {
        match self.position(item) {
            Some(index) => {
                self.seen.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<M: Membership<i32>>(mut set: M) {
        assert!(set.insert(&1));
        assert!(!set.insert(&1));
        assert!(set.insert(&2));
        assert!(set.remove(&1));
        assert!(!set.remove(&1));
        assert!(set.insert(&1));

        set.extend([7, 8]);
        assert!(!set.insert(&8));
    }

    #[test]
    fn hashed() {
        exercise(Hashed::new());
    }

    #[test]
    fn linear() {
        exercise(Linear::new(Rc::new(|a: &i32, b: &i32| a == b)));
    }

    #[test]
    fn linear_uses_the_given_equality() {
        let mut set = Linear::new(Rc::new(|a: &String, b: &String| a.eq_ignore_ascii_case(b)));
        assert!(set.insert(&"Apple".to_string()));
        assert!(!set.insert(&"APPLE".to_string()));
        assert!(set.remove(&"apple".to_string()));
    }
}
