//! Capture and compare through the public API.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use immcheck::core::Inspect;
use immcheck::{
    capture_snapshot, capture_snapshot_with_options, compare, ensure_immutability_with_options,
    release, CheckError, MutationDetector, Options, Outcome, Snapshot, Unsupported,
};
use immcheck_testkit::{init_tracing, Person, Profile, Ring, SharedLog, TestFixture};

fn mutated(before: &Snapshot, after: &Snapshot) -> bool {
    match compare(before, after).unwrap() {
        Outcome::Unchanged => false,
        Outcome::Mutated(_) => true,
    }
}

#[test]
fn test_cell_counter() {
    let counter = Cell::new(10u32);
    let before = capture_snapshot(&counter).unwrap();
    let same = capture_snapshot(&counter).unwrap();
    assert!(!mutated(&before, &same));

    counter.set(11);
    let after = capture_snapshot(&counter).unwrap();
    assert!(mutated(&before, &after));

    release(before);
    release(same);
    release(after);
}

#[test]
fn test_sequence_index_mutation_then_stable() {
    let values = RefCell::new(vec![1i32, 2, 3, 4]);
    let before = capture_snapshot(&values).unwrap();

    values.borrow_mut()[0] = 99;
    let after = capture_snapshot(&values).unwrap();
    assert!(mutated(&before, &after));

    let again = capture_snapshot(&values).unwrap();
    assert!(!mutated(&after, &again));
}

#[test]
fn test_profile_unchanged_and_mutated() {
    let mut fixture = TestFixture::with_seed(42);
    let profile = RefCell::new(fixture.profile());

    let before = capture_snapshot(&profile).unwrap();
    assert!(!mutated(&before, &capture_snapshot(&profile).unwrap()));

    profile.borrow_mut().scores.insert("late".into(), 1);
    assert!(mutated(&before, &capture_snapshot(&profile).unwrap()));
}

#[test]
fn test_nested_box_field_mutation() {
    let profile = RefCell::new(Profile {
        name: "ada".into(),
        tags: vec!["x".into()],
        scores: HashMap::new(),
        manager: Some(Box::new(Person { age: 40, height: 170 })),
    });
    let before = capture_snapshot(&profile).unwrap();

    if let Some(manager) = profile.borrow_mut().manager.as_mut() {
        manager.age += 1;
    }
    let after = capture_snapshot(&profile).unwrap();

    let report = match compare(&before, &after).unwrap() {
        Outcome::Mutated(report) => report,
        Outcome::Unchanged => panic!("mutation behind box not detected"),
    };
    assert!(report.diff.changed >= 1);
    assert_eq!(report.before_entries, report.after_entries);
}

#[test]
fn test_text_mutation_in_place() {
    let text = RefCell::new(String::from("hello"));
    let before = capture_snapshot(&text).unwrap();
    text.borrow_mut().make_ascii_uppercase();
    assert!(mutated(&before, &capture_snapshot(&text).unwrap()));
}

#[test]
fn test_map_fingerprint_is_order_free() {
    let mut map = HashMap::new();
    map.insert(String::from("a"), 1u32);
    map.insert(String::from("b"), 2u32);

    for _ in 0..8 {
        let before = capture_snapshot(&map).unwrap();
        let after = capture_snapshot(&map).unwrap();
        assert_eq!(before.fingerprint(), after.fingerprint());
    }
}

#[test]
fn test_set_growth_detected() {
    let set = RefCell::new(BTreeSet::from([1u8, 2, 3]));
    let before = capture_snapshot(&set).unwrap();
    set.borrow_mut().insert(4);
    let after = capture_snapshot(&set).unwrap();

    let err = compare(&before, &after).unwrap().into_result().unwrap_err();
    let report = err.report().unwrap();
    assert!(report.after_entries > report.before_entries);
}

#[test]
fn test_cycle_capture_and_mutation() {
    let ring = Ring::new(4);
    let before = capture_snapshot(ring.head()).unwrap();
    assert!(!mutated(&before, &capture_snapshot(ring.head()).unwrap()));

    ring.nodes()[3].value.set(100);
    assert!(mutated(&before, &capture_snapshot(ring.head()).unwrap()));
}

#[test]
fn test_relinking_detected() {
    let ring = Ring::new(3);
    let before = capture_snapshot(ring.head()).unwrap();
    ring.nodes()[2].link(&ring.nodes()[1]);
    assert!(mutated(&before, &capture_snapshot(ring.head()).unwrap()));
}

#[test]
fn test_polymorphic_holder() {
    let cell = Rc::new(Cell::new(1u8));
    let holders: Vec<Rc<dyn Inspect>> = vec![cell.clone(), Rc::new(5u64)];

    let before = capture_snapshot(&holders).unwrap();
    cell.set(2);
    assert!(mutated(&before, &capture_snapshot(&holders).unwrap()));
}

#[test]
fn test_shared_alias_recorded_once() {
    let shared = Rc::new(RefCell::new(vec![1u32; 16]));
    let aliases = vec![shared.clone(), shared.clone(), shared.clone()];
    let single = vec![shared.clone()];

    let many = capture_snapshot(&aliases).unwrap();
    let one = capture_snapshot(&single).unwrap();
    // One extra entry per additional alias, no re-descent.
    assert_eq!(many.len(), one.len() + 2);

    shared.borrow_mut()[15] = 0;
    assert!(mutated(&many, &capture_snapshot(&aliases).unwrap()));
}

#[test]
fn test_nil_roots_rejected() {
    let none: Option<Rc<u8>> = None;
    let err = capture_snapshot(&none).unwrap_err();
    assert!(matches!(
        err,
        CheckError::UnsupportedType {
            reason: Unsupported::NilRoot,
            ..
        }
    ));

    let dead = Rc::downgrade(&Rc::new(3u8));
    assert!(capture_snapshot(&dead).is_err());
}

#[test]
fn test_compare_never_captured() {
    let err = compare(&Snapshot::new(), &Snapshot::new()).unwrap_err();
    assert!(matches!(err, CheckError::InvalidSnapshotState(_)));
}

#[test]
fn test_origins_in_report() {
    let value = Cell::new(1i64);
    let detector = MutationDetector::default();
    let before = detector.capture_snapshot(&value).unwrap();
    value.set(2);
    let after = detector.capture_snapshot(&value).unwrap();

    let err = detector.compare(&before, &after).unwrap().into_result().unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("mutation of immutable value detected\n"));
    assert!(text.contains("immutable snapshot was captured here"));
    assert!(text.contains("tests/detector.rs"));
    assert!(text.contains("value type: `core::cell::Cell<i64>`"));
}

#[test]
fn test_no_origin_when_skipped() {
    let options = Options::new().skip_origin_capture(true);
    let value = Cell::new(1u8);
    let before = capture_snapshot_with_options(&value, options.clone()).unwrap();
    value.set(3);
    let after = capture_snapshot_with_options(&value, options).unwrap();

    let err = compare(&before, &after).unwrap().into_result().unwrap_err();
    assert!(!err.to_string().contains("captured here"));
}

#[test]
fn test_check_logs_to_writer() {
    init_tracing();
    let log = SharedLog::new();
    let options = Options::new()
        .skip_fatal_on_mismatch(true)
        .log_writer(log.clone());

    let values = RefCell::new(vec![1u8, 2, 3, 4]);
    let check = ensure_immutability_with_options(&values, options).unwrap();
    check.check();
    assert!(log.is_empty());

    values.borrow_mut()[0] = 99;
    check.check();
    assert!(log.contains("runtime mutation detected"));
    assert!(log.contains("value type: `core::cell::RefCell<alloc::vec::Vec<u8>>`"));

    // Callable more than once.
    check.check();
    assert_eq!(log.contents().matches("[ERROR]").count(), 2);
}

#[test]
fn test_callback_reports_where_it_was_created() {
    let log = SharedLog::new();
    let options = Options::new()
        .skip_fatal_on_mismatch(true)
        .log_writer(log.clone());

    let value = Cell::new(5u32);
    let check = ensure_immutability_with_options(&value, options).unwrap();
    let line = line!() + 1;
    let callback = check.into_callback();

    value.set(6);
    callback();
    assert!(log.contains(&format!("mutation was detected here {}:{}", file!(), line)));
}

#[test]
#[should_panic(expected = "mutation of immutable value detected")]
fn test_check_is_fatal_by_default() {
    let options = Options::new().skip_logging_on_mismatch(true);
    let value = Cell::new(0u16);
    let check = ensure_immutability_with_options(&value, options).unwrap();
    value.set(1);
    check.check();
}
