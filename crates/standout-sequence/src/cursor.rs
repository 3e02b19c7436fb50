//! Cursors: the iteration state of a single pass over a sequence.
//!
//! A [`Sequence`](crate::Sequence) never holds an iteration position. Every
//! pass asks the sequence's cursor factory for a fresh cursor, so nested and
//! repeated passes over restartable sources are independent.

use std::fmt;
use std::rc::Rc;

/// Type-erased cursor over `T`.
pub(crate) type BoxedCursor<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// Zero-argument function producing a fresh cursor.
pub(crate) type CursorFactory<'a, T> = Rc<dyn Fn() -> BoxedCursor<'a, T> + 'a>;

/// Builds a [`CursorFactory`] from a closure returning any boxed cursor.
pub(crate) fn factory<'a, T, F>(f: F) -> CursorFactory<'a, T>
where
    F: Fn() -> BoxedCursor<'a, T> + 'a,
{
    Rc::new(f)
}

type Setup<'a, T> = Box<dyn FnOnce() -> BoxedCursor<'a, T> + 'a>;

/// A single pass over a [`Sequence`](crate::Sequence).
///
/// Created by [`Sequence::iter`](crate::Sequence::iter). Dropping a cursor
/// part way through is always safe; cursors hold no external resources.
pub struct Cursor<'a, T> {
    inner: BoxedCursor<'a, T>,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(inner: BoxedCursor<'a, T>) -> Self {
        Cursor { inner }
    }
}

impl<T> Iterator for Cursor<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").finish_non_exhaustive()
    }
}

/// Cursor that builds its real state on the first pull.
///
/// Operators that must buffer (reverse, group_by, shuffle, ...) wrap their
/// setup in a `Deferred` so that creating the cursor does no work.
pub(crate) struct Deferred<'a, T> {
    setup: Option<Setup<'a, T>>,
    active: Option<BoxedCursor<'a, T>>,
}

impl<T> Iterator for Deferred<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(setup) = self.setup.take() {
            self.active = Some(setup());
        }
        self.active.as_mut()?.next()
    }
}

/// Wraps `setup` in a cursor that runs it on the first call to `next`.
pub(crate) fn deferred<'a, T, F>(setup: F) -> BoxedCursor<'a, T>
where
    T: 'a,
    F: FnOnce() -> BoxedCursor<'a, T> + 'a,
{
    Box::new(Deferred {
        setup: Some(Box::new(setup)),
        active: None,
    })
}
