//! Scenario coverage of the public API.

mod common;

use std::collections::{BTreeSet, HashMap};

use common::{counted_source, init_test_tracing};
use standout_sequence::{
    partial_sort, sort, Dir, Restriction, Sequence, SequenceError, SortOptions, SourceKind, Window,
    DEFAULT_INSERTION_THRESHOLD,
};

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn order_then_take() {
    init_test_tracing();
    let result = Sequence::from(vec![3, 1, 2]).order(Dir::Asc).take(2).to_vec();
    assert_eq!(result, vec![1, 2]);
}

#[test]
fn skip_two() {
    assert_eq!(Sequence::from(vec![1, 2, 3, 4, 5]).skip(2).to_vec(), vec![3, 4, 5]);
}

#[test]
fn distinct_keeps_first_occurrences() {
    assert_eq!(Sequence::from(vec![1, 2, 2, 3]).distinct().to_vec(), vec![1, 2, 3]);
}

#[test]
fn first_or_default_on_empty_is_none() {
    assert_eq!(Sequence::<i32>::from(vec![]).first_or_default(), None);
}

#[test]
fn concat_element_at_skips_the_head() {
    let (head, opened) = counted_source(vec![1, 2, 3]);
    let seekable_head = Sequence::from(vec![1, 2, 3]);

    let seq = seekable_head.concat(vec![4, 5]);
    assert_eq!(seq.element_at(3).unwrap(), 4);
    assert!(!seekable_head.was_iterated());

    let scanned = head.concat(vec![4, 5]);
    assert_eq!(scanned.element_at(3).unwrap(), 4);
    assert!(opened.get() > 0);
}

#[test]
fn group_by_parity() {
    let groups = Sequence::from(vec![1, 2, 2, 3]).group_by(|x| x % 2 == 0).to_vec();
    assert_eq!(groups.len(), 2);
    assert!(!*groups[0].key());
    assert_eq!(groups[0].to_vec(), vec![1, 3]);
    assert!(*groups[1].key());
    assert_eq!(groups[1].to_vec(), vec![2, 2]);
}

// ============================================================================
// Laziness
// ============================================================================

#[test]
fn no_operator_touches_the_source_while_building() {
    let (source, opened) = counted_source(vec![5, 3, 8, 1]);

    let chains = vec![
        source.select(|x, _| x + 1),
        source.filter(|x, _| *x > 2),
        source.skip(1).take(2),
        source.concat(vec![9]),
        source.reverse(),
        source.distinct(),
        source.shuffle(),
        source.take_last(2),
        source.skip_last(1),
        source.union(vec![1, 2]),
        source.except(vec![3]),
        source.zip(vec![1, 2], |a, b: i32| a * b),
        source.lag(1, 0).select(|p, _| p.0),
        source.order_by(|x| *x).take(2).as_sequence(),
    ];

    for chain in &chains {
        assert!(!chain.was_iterated(), "{:?}", chain);
    }
    assert_eq!(opened.get(), 0);
    assert!(!source.was_iterated());

    for chain in &chains {
        let _ = chain.to_vec();
    }
    assert!(source.was_iterated());
}

#[test]
fn repeated_to_vec_is_identical() {
    let seq = Sequence::from(vec![4, 1, 3])
        .select(|x, i| x * 10 + i as i32)
        .filter(|x, _| *x > 10);
    assert_eq!(seq.to_vec(), seq.to_vec());
}

#[test]
fn generator_sources_are_single_use() {
    let seq = Sequence::from_generator(vec![1, 2, 3].into_iter().map(|x| x * 2));
    assert_eq!(seq.source_kind(), SourceKind::Generator);
    assert!(!seq.source_kind().is_restartable());
    assert_eq!(seq.to_vec(), vec![2, 4, 6]);
    assert!(seq.to_vec().is_empty());
}

#[test]
fn cursor_resumes_where_it_left_off() {
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let counter = std::rc::Rc::clone(&calls);
    let seq = Sequence::from(vec![1, 2, 3]).select(move |x, _| {
        counter.set(counter.get() + 1);
        x
    });

    let mut cursor = seq.iter();
    assert_eq!(cursor.next(), Some(1));
    assert_eq!(calls.get(), 1);
    assert_eq!(cursor.next(), Some(2));
    assert_eq!(calls.get(), 2);
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn source_conversions() {
    let set: BTreeSet<&str> = ["b", "a"].into_iter().collect();
    let seq = Sequence::from_collection(&set);
    assert_eq!(seq.count(), 2);
    assert_eq!(seq.to_vec(), vec!["a", "b"]);

    let mut map = HashMap::new();
    map.insert(1, "one");
    assert_eq!(Sequence::from_map(&map).to_vec(), vec![(1, "one")]);

    assert_eq!(Sequence::from_text("hey").reverse().to_vec(), vec!['y', 'e', 'h']);
    assert_eq!(Sequence::range(3, 3).unwrap().to_vec(), vec![3, 4, 5]);
    assert_eq!(Sequence::repeat(0u8, 2).to_vec(), vec![0, 0]);
}

#[test]
fn range_overflow_is_rejected_eagerly() {
    let err = Sequence::range(i64::MAX - 1, 5).unwrap_err();
    assert!(matches!(err, SequenceError::InvalidArgument { name: "count", .. }));
    assert!(err.to_string().contains("overflows"));
}

// ============================================================================
// Ordered sequences
// ============================================================================

#[test]
fn ordered_multi_key_with_restrictions() {
    let people = vec![
        ("ann", 31, "ops"),
        ("bob", 25, "dev"),
        ("cat", 31, "dev"),
        ("dan", 40, "ops"),
        ("eve", 25, "ops"),
    ];

    let ordered = Sequence::from(people)
        .order_by(|p| p.2)
        .then_by_descending(|p| p.1)
        .then_by(|p| p.0)
        .skip(1)
        .take(3);

    assert_eq!(ordered.count(), 3);
    let names: Vec<&str> = ordered.iter().map(|p| p.0).collect();
    assert_eq!(names, vec!["bob", "dan", "ann"]);
}

#[test]
fn ordered_take_last_and_skip_last() {
    let seq = Sequence::from((1..=10).collect::<Vec<i32>>()).shuffle_with_seed(3);
    assert_eq!(seq.order_by(|x| *x).take_last(3).to_vec(), vec![8, 9, 10]);
    assert_eq!(seq.order_by(|x| *x).skip_last(8).to_vec(), vec![1, 2]);
    assert_eq!(
        seq.order_by(|x| *x).skip(2).take_last(3).skip_last(1).to_vec(),
        vec![8, 9]
    );
}

#[test]
fn ordered_rejects_positional_access() {
    let ordered = Sequence::from(vec![2, 1]).order_by(|x| *x);
    assert!(matches!(
        ordered.element_at(0),
        Err(SequenceError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        ordered.order_by(|x| -x),
        Err(SequenceError::UnsupportedOperation(_))
    ));
    assert_eq!(ordered.as_sequence().element_at(0).unwrap(), 1);
}

#[test]
fn ordered_with_float_keys() {
    let seq = Sequence::from(vec![0.5_f64, -2.0, 3.25]);
    let sorted = seq
        .order_by_with(|x| *x, |a: &f64, b: &f64| a.total_cmp(b), Dir::Desc)
        .to_vec();
    assert_eq!(sorted, vec![3.25, 0.5, -2.0]);
}

#[test]
fn restriction_window_is_public() {
    let window = Window::fold(8, &[Restriction::TakeLast(5), Restriction::Take(2)]);
    assert_eq!(window.range(), 3..5);
}

// ============================================================================
// Standalone sort
// ============================================================================

#[test]
fn standalone_sorts() {
    let mut items = vec![5, 2, 9, 1, 7, 3];
    sort(&mut items, |a, b| b.cmp(a));
    assert_eq!(items, vec![9, 7, 5, 3, 2, 1]);

    let mut items: Vec<i32> = (0..200).rev().collect();
    partial_sort(&mut items, |a, b| a.cmp(b), 190..200);
    assert_eq!(&items[190..], &(190..200).collect::<Vec<_>>()[..]);

    assert_eq!(
        SortOptions::default().get_insertion_threshold(),
        DEFAULT_INSERTION_THRESHOLD
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn error_taxonomy() {
    let empty = Sequence::<i32>::empty();
    assert_eq!(empty.first(), Err(SequenceError::EmptySequence));
    assert_eq!(empty.last(), Err(SequenceError::EmptySequence));
    assert_eq!(empty.single(), Err(SequenceError::EmptySequence));
    assert_eq!(
        Sequence::from(vec![1, 1]).single(),
        Err(SequenceError::MultipleElements)
    );
    assert_eq!(
        Sequence::from(vec![1]).element_at(4),
        Err(SequenceError::IndexOutOfRange { index: 4 })
    );
    assert!(matches!(
        Sequence::from(vec![1]).chunk(0),
        Err(SequenceError::InvalidArgument { name: "size", .. })
    ));
}

#[test]
fn no_value_sentinel_is_distinct_from_none_elements() {
    let seq = Sequence::from(vec![None, Some(1)]);
    assert_eq!(seq.element_at_or_default(0), Some(None));
    assert_eq!(seq.element_at_or_default(2), None);
    assert_eq!(Sequence::from(vec![None::<i32>]).single_or_default(), Ok(Some(None)));
}

// ============================================================================
// Joins and lookups
// ============================================================================

#[test]
fn join_and_group_join() {
    let departments = Sequence::from(vec![(1, "eng"), (2, "ops"), (3, "hr")]);
    let staff = vec![("ann", 1), ("bob", 2), ("cat", 1)];

    let pairs = departments.join(staff.clone(), |d| d.0, |s| s.1, |d, s| (d.1, s.0));
    assert_eq!(pairs.to_vec(), vec![("eng", "ann"), ("eng", "cat"), ("ops", "bob")]);

    let sizes = departments.group_join(staff, |d| d.0, |s| s.1, |d, members| (d.1, members.count()));
    assert_eq!(sizes.to_vec(), vec![("eng", 2), ("ops", 1), ("hr", 0)]);
}

#[test]
fn lookup_keeps_first_occurrence_order() {
    let lookup = Sequence::from(vec!["bb", "a", "cc", "d"]).to_lookup(|s| s.len());
    assert_eq!(lookup.keys().copied().collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(lookup.get(&1), Some(&["a", "d"][..]));
}
