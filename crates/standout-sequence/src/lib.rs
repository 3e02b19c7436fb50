//! Sequence - Lazy, composable queries over in-memory sources.
//!
//! A [`Sequence`] wraps a source (vector, slice, string, set, map, range,
//! repeated value, restartable closure, single-use iterator, or another
//! sequence) and exposes chainable operators that do no work until the
//! result is consumed. It supports:
//!
//! - Capability propagation: O(1) counts and random access flow through
//!   operator chains without materializing anything
//! - Ordered sequences with deferred `skip`/`take`/`skip_last`/`take_last`
//!   that sort only the slice they keep
//! - A range-bounded quicksort usable on its own
//! - Grouping, joins, set operators and aggregates
//!
//! # Quick Start
//!
//! ```rust
//! use standout_sequence::Sequence;
//!
//! #[derive(Clone)]
//! struct Task {
//!     name: &'static str,
//!     priority: i32,
//!     archived: bool,
//! }
//!
//! let tasks = vec![
//!     Task { name: "Write docs", priority: 3, archived: false },
//!     Task { name: "Fix bug", priority: 5, archived: false },
//!     Task { name: "Old task", priority: 1, archived: true },
//! ];
//!
//! let top = Sequence::from_slice(&tasks)
//!     .filter(|task, _| !task.archived)
//!     .order_by_descending(|task| task.priority)
//!     .take(1);
//!
//! assert_eq!(top.count(), 1);
//! assert_eq!(top.first().unwrap().name, "Fix bug");
//! ```
//!
//! # Laziness and Capabilities
//!
//! Building a chain never touches the source. Each sequence resolves two
//! capabilities on first need and memoizes them:
//!
//! - **count**: O(1) for sources with a known length and for operators that
//!   can compute theirs from their input (`select`, `skip`, `take`,
//!   `concat`, `reverse`, ...); a full pass otherwise.
//! - **positional access**: true random access (seekable) for arrays,
//!   strings, ranges and repeats and for operators that preserve it;
//!   otherwise a scan from the start.
//!
//! ```rust
//! use standout_sequence::Sequence;
//!
//! let seq = Sequence::from(vec![1, 2, 3]).concat(vec![4, 5]);
//! assert!(seq.can_seek());
//! assert_eq!(seq.element_at(3).unwrap(), 4);
//! assert!(!seq.was_iterated());
//!
//! let evens = seq.filter(|x, _| x % 2 == 0);
//! assert!(!evens.can_seek());
//! assert_eq!(evens.count(), 2);
//! ```
//!
//! # Ordering
//!
//! | Method | Effect |
//! |--------|--------|
//! | `order_by`, `order_by_descending` | Start an [`OrderedSequence`] on an `Ord` key |
//! | `order_by_with`, `order_by_comparer` | Same, with a custom comparator |
//! | `then_by`, `then_by_descending`, `then_by_with` | Add tie-break keys |
//! | `take`, `skip`, `take_last`, `skip_last` | Deferred [`Restriction`]s |
//!
//! Restrictions fold in declaration order into a [`Window`]; only that
//! window of the sorted output is guaranteed sorted, which lets
//! [`partial_sort`] skip the rest. The sort is not stable.
//!
//! # Logging
//!
//! Capability inference and sort resolution emit `tracing` events at
//! `trace` and `debug` level. The crate never installs a subscriber.

mod capability;
mod cursor;
mod error;
mod grouping;
mod membership;
mod operators;
mod ordered;
mod ordering;
mod restriction;
mod sequence;
mod sort;
mod source;

// Re-export public API
pub use cursor::Cursor;
pub use error::{Result, SequenceError};
pub use grouping::{Grouping, Lookup};
pub use ordered::OrderedSequence;
pub use ordering::Dir;
pub use restriction::{Restriction, Window};
pub use sequence::Sequence;
pub use sort::{partial_sort, partial_sort_with, sort, SortOptions, DEFAULT_INSERTION_THRESHOLD};
pub use source::SourceKind;
