//! Count and positional-access capabilities.
//!
//! Each sequence resolves these at most once, on first need, and memoizes
//! the result. Operators propagate capabilities by composing their parent's
//! resolved functions instead of materializing anything.

use std::rc::Rc;

use crate::cursor::CursorFactory;

/// Returns the element count of a sequence.
pub(crate) type CountFn<'a> = Rc<dyn Fn() -> usize + 'a>;

/// Returns the element at an index, or `None` past the end.
pub(crate) type TryGetAt<'a, T> = Rc<dyn Fn(usize) -> Option<T> + 'a>;

/// Builds a [`TryGetAt`] from a closure.
pub(crate) fn accessor<'a, T, F>(f: F) -> TryGetAt<'a, T>
where
    F: Fn(usize) -> Option<T> + 'a,
{
    Rc::new(f)
}

/// Positional access paired with whether it is true random access.
///
/// The accessor and the seek flag are one value so they can only ever be
/// resolved together.
pub(crate) struct Access<'a, T> {
    get: TryGetAt<'a, T>,
    seek: bool,
}

impl<T> Clone for Access<'_, T> {
    fn clone(&self) -> Self {
        Access {
            get: Rc::clone(&self.get),
            seek: self.seek,
        }
    }
}

impl<'a, T: 'a> Access<'a, T> {
    /// Random access backed by an index lookup.
    pub(crate) fn seek(get: TryGetAt<'a, T>) -> Self {
        Access { get, seek: true }
    }

    /// Access that has to walk a cursor to reach the index.
    pub(crate) fn scan(get: TryGetAt<'a, T>) -> Self {
        Access { get, seek: false }
    }

    /// Fallback accessor: open a fresh cursor and step to the index.
    pub(crate) fn scanning(cursor: CursorFactory<'a, T>) -> Self {
        Access::scan(accessor(move |index| cursor().nth(index)))
    }

    pub(crate) fn get(&self, index: usize) -> Option<T> {
        (self.get)(index)
    }

    pub(crate) fn getter(&self) -> TryGetAt<'a, T> {
        Rc::clone(&self.get)
    }

    pub(crate) fn can_seek(&self) -> bool {
        self.seek
    }

    /// Replaces the accessor, keeping this access's seekability.
    pub(crate) fn rebind<U: 'a>(&self, get: TryGetAt<'a, U>) -> Access<'a, U> {
        Access {
            get,
            seek: self.seek,
        }
    }

    /// Composes the accessor with `f`, passing the index through.
    pub(crate) fn map<U, F>(&self, f: Rc<F>) -> Access<'a, U>
    where
        U: 'a,
        F: Fn(T, usize) -> U + 'a,
    {
        let get = self.getter();
        self.rebind(accessor(move |index| get(index).map(|item| f(item, index))))
    }
}

/// Count function for a length known up front.
pub(crate) fn fixed<'a>(len: usize) -> CountFn<'a> {
    Rc::new(move || len)
}

/// Count function that runs a full pass on every call.
pub(crate) fn counting<'a, T: 'a>(cursor: CursorFactory<'a, T>) -> CountFn<'a> {
    Rc::new(move || cursor().count())
}
