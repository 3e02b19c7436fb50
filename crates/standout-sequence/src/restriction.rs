//! Deferred slice restrictions on ordered sequences.
//!
//! Restrictions are folded left to right into a [`Window`] over the
//! conceptual sorted array. Order matters: each restriction narrows the
//! window left by the ones before it.

use std::fmt;
use std::ops::Range;

/// A deferred take/skip applied to an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    /// Keep at most the first `n` elements.
    Take(usize),
    /// Keep at most the last `n` elements.
    TakeLast(usize),
    /// Drop the first `n` elements.
    Skip(usize),
    /// Drop the last `n` elements.
    SkipLast(usize),
}

impl Restriction {
    /// Narrows `window` by this restriction.
    pub fn apply(self, window: Window) -> Window {
        let Window { start, end } = window;
        match self {
            Restriction::Take(n) => Window {
                start,
                end: end.min(start.saturating_add(n)),
            },
            Restriction::Skip(n) => Window {
                start: end.min(start.saturating_add(n)),
                end,
            },
            Restriction::TakeLast(n) => Window {
                start: start.max(end.saturating_sub(n)),
                end,
            },
            Restriction::SkipLast(n) => Window {
                start,
                end: start.max(end.saturating_sub(n)),
            },
        }
    }

    /// Returns the operator name of this restriction.
    pub fn as_str(self) -> &'static str {
        match self {
            Restriction::Take(_) => "take",
            Restriction::TakeLast(_) => "take_last",
            Restriction::Skip(_) => "skip",
            Restriction::SkipLast(_) => "skip_last",
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Take(n)
            | Restriction::TakeLast(n)
            | Restriction::Skip(n)
            | Restriction::SkipLast(n) => write!(f, "{}({})", self.as_str(), n),
        }
    }
}

/// A contiguous `[start, end)` interval of the sorted array.
///
/// Always satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Window {
    /// The interval `[start, end)`. A `start` past `end` is clamped to `end`.
    pub fn new(start: usize, end: usize) -> Self {
        Window {
            start: start.min(end),
            end,
        }
    }

    /// The whole array of `len` elements.
    pub fn full(len: usize) -> Self {
        Window { start: 0, end: len }
    }

    /// Folds `restrictions`, in order, over the whole array of `len` elements.
    ///
    /// ```
    /// use standout_sequence::{Restriction, Window};
    ///
    /// let window = Window::fold(10, &[Restriction::Skip(2), Restriction::Take(3)]);
    /// assert_eq!(window, Window::new(2, 5));
    ///
    /// let window = Window::fold(10, &[Restriction::Take(3), Restriction::Skip(2)]);
    /// assert_eq!((window.start(), window.end()), (2, 3));
    /// ```
    pub fn fold(len: usize, restrictions: &[Restriction]) -> Self {
        restrictions
            .iter()
            .fold(Window::full(len), |window, restriction| restriction.apply(window))
    }

    /// First index kept.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last index kept.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of elements in the window.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the window keeps nothing.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The window as an index range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
