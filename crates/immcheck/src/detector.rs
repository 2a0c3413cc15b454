//! Capture, compare, and the two immutability-check forms.

use std::any::type_name;
use std::fmt;
use std::mem::{self, ManuallyDrop};
use std::ops::Deref;

use immcheck_core::{
    Inspect, Origin, Outcome, PooledSnapshot, Result, Snapshot, SnapshotPool,
};

use crate::options::Options;
use crate::reclaim;
use crate::report::report;

#[track_caller]
fn origin(options: &Options) -> Option<Origin> {
    if options.skip_origin_capture {
        None
    } else {
        Some(Origin::caller())
    }
}

/// Entry point for snapshot-based mutation checks.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use immcheck::MutationDetector;
///
/// let counter = Cell::new(1u32);
/// let detector = MutationDetector::default();
///
/// let before = detector.capture_snapshot(&counter).unwrap();
/// counter.set(2);
/// let after = detector.capture_snapshot(&counter).unwrap();
///
/// assert!(!detector.compare(&before, &after).unwrap().is_unchanged());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MutationDetector {
    options: Options,
}

impl MutationDetector {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Fingerprint everything reachable from `root`.
    #[track_caller]
    pub fn capture_snapshot(&self, root: &dyn Inspect) -> Result<Snapshot> {
        let mut snapshot = SnapshotPool::global().acquire_guard();
        self.capture_snapshot_into(root, &mut snapshot)?;
        Ok(snapshot.into_inner())
    }

    /// Like [`capture_snapshot`](Self::capture_snapshot), reusing `dst`.
    #[track_caller]
    pub fn capture_snapshot_into(&self, root: &dyn Inspect, dst: &mut Snapshot) -> Result<()> {
        dst.reset();
        dst.capture(root, &self.options.walk_config())?;
        dst.set_origin(origin(&self.options));
        Ok(())
    }

    /// Capture and keep a `Debug` rendering of `root` for mismatch reports.
    #[track_caller]
    pub fn capture_snapshot_with_dump<T>(&self, root: &T) -> Result<Snapshot>
    where
        T: Inspect + fmt::Debug,
    {
        let mut snapshot = self.capture_snapshot(root)?;
        snapshot.set_dump(Some(format!("{:?}", root)));
        Ok(snapshot)
    }

    pub fn compare(&self, before: &Snapshot, after: &Snapshot) -> Result<Outcome> {
        before.compare(after)
    }

    /// Capture `root` now and return a check that re-captures and compares
    /// each time it is invoked.
    #[track_caller]
    pub fn ensure_immutability<'a>(&self, root: &'a dyn Inspect) -> Result<ImmutabilityCheck<'a>> {
        let mut original = SnapshotPool::global().acquire_guard();
        self.capture_snapshot_into(root, &mut original)?;
        Ok(ImmutabilityCheck {
            root,
            original: Some(original),
            options: self.options.clone(),
        })
    }

    /// Take ownership of `value`; when the returned wrapper is dropped the
    /// value is re-checked on a reclamation worker.
    #[track_caller]
    pub fn check_on_finalization<T>(&self, value: T) -> Result<Finalized<T>>
    where
        T: Inspect + Send + 'static,
    {
        // Boxed first so the captured addresses survive moves of the wrapper.
        let value = Box::new(value);
        let original = self.capture_snapshot(&*value)?;
        Ok(Finalized {
            value: ManuallyDrop::new(value),
            original: Some(original),
            options: self.options.clone(),
        })
    }
}

/// A pending comparison against a snapshot taken by
/// [`MutationDetector::ensure_immutability`].
///
/// The original snapshot returns to the pool when this is dropped.
pub struct ImmutabilityCheck<'a> {
    root: &'a dyn Inspect,
    original: Option<PooledSnapshot<'static>>,
    options: Options,
}

impl<'a> ImmutabilityCheck<'a> {
    /// A check that never reports anything.
    pub fn disabled(root: &'a dyn Inspect) -> Self {
        Self {
            root,
            original: None,
            options: Options::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.original.is_some()
    }

    /// Re-capture and compare, applying the logging and fatal policy of
    /// the options on any failure.
    #[track_caller]
    pub fn check(&self) {
        self.check_at(origin(&self.options));
    }

    /// Re-capture and compare without applying any policy.
    #[track_caller]
    pub fn verify(&self) -> Result<()> {
        self.verify_at(origin(&self.options))
    }

    /// The check as a plain closure.
    ///
    /// Mismatches found by the closure name the place where the callback was
    /// created as their detection site.
    #[track_caller]
    pub fn into_callback(self) -> impl Fn() + 'a {
        let detected_at = origin(&self.options);
        move || self.check_at(detected_at)
    }

    #[track_caller]
    fn check_at(&self, detected_at: Option<Origin>) {
        if let Err(err) = self.verify_at(detected_at) {
            report(&self.options, self.root.type_info().name(), &err);
        }
    }

    fn verify_at(&self, detected_at: Option<Origin>) -> Result<()> {
        let Some(original) = &self.original else {
            return Ok(());
        };
        let mut current = SnapshotPool::global().acquire_guard();
        current.capture(self.root, &self.options.walk_config())?;
        current.set_origin(detected_at);
        original.compare(&current)?.into_result()
    }
}

impl fmt::Debug for ImmutabilityCheck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutabilityCheck")
            .field("value_type", &self.root.type_info().name())
            .field("original", &self.original.as_deref().map(ToString::to_string))
            .finish()
    }
}

/// Read-only owner of a value that is checked for mutation when dropped.
///
/// A mismatch found at that point is reported on a background thread; with
/// the default options it panics that thread, not the one that dropped the
/// wrapper.
pub struct Finalized<T: Inspect + Send + 'static> {
    value: ManuallyDrop<Box<T>>,
    original: Option<Snapshot>,
    options: Options,
}

impl<T: Inspect + Send + 'static> Finalized<T> {
    /// Wrap `value` without any check.
    pub fn unchecked(value: T) -> Self {
        Self {
            value: ManuallyDrop::new(Box::new(value)),
            original: None,
            options: Options::default(),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.original.is_some()
    }
}

impl<T: Inspect + Send + 'static> Deref for Finalized<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Inspect + Send + fmt::Debug + 'static> fmt::Debug for Finalized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Finalized").field(&**self.value).finish()
    }
}

impl<T: Inspect + Send + 'static> Drop for Finalized<T> {
    fn drop(&mut self) {
        // SAFETY: `value` is not touched again after this.
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        let Some(original) = self.original.take() else {
            return;
        };
        let options = mem::take(&mut self.options);
        reclaim::submit(Box::new(move || recheck(&*value, original, &options)));
    }
}

fn recheck<T: Inspect>(value: &T, original: Snapshot, options: &Options) {
    let pool = SnapshotPool::global();
    let result = {
        let mut current = pool.acquire_guard();
        current
            .capture(value, &options.walk_config())
            .and_then(|()| original.compare(&current))
            .and_then(Outcome::into_result)
    };
    pool.release(original);
    if let Err(err) = result {
        report(options, type_name::<T>(), &err);
    }
}

/// [`MutationDetector::capture_snapshot`] with default options.
#[track_caller]
pub fn capture_snapshot(root: &dyn Inspect) -> Result<Snapshot> {
    MutationDetector::default().capture_snapshot(root)
}

#[track_caller]
pub fn capture_snapshot_with_options(root: &dyn Inspect, options: Options) -> Result<Snapshot> {
    MutationDetector::new(options).capture_snapshot(root)
}

#[track_caller]
pub fn capture_snapshot_into(root: &dyn Inspect, dst: &mut Snapshot, options: Options) -> Result<()> {
    MutationDetector::new(options).capture_snapshot_into(root, dst)
}

/// Compare two captured snapshots exactly.
pub fn compare(before: &Snapshot, after: &Snapshot) -> Result<Outcome> {
    before.compare(after)
}

#[track_caller]
pub fn ensure_immutability(root: &dyn Inspect) -> Result<ImmutabilityCheck<'_>> {
    MutationDetector::default().ensure_immutability(root)
}

#[track_caller]
pub fn ensure_immutability_with_options(
    root: &dyn Inspect,
    options: Options,
) -> Result<ImmutabilityCheck<'_>> {
    MutationDetector::new(options).ensure_immutability(root)
}

#[track_caller]
pub fn check_on_finalization<T>(value: T) -> Result<Finalized<T>>
where
    T: Inspect + Send + 'static,
{
    MutationDetector::default().check_on_finalization(value)
}

#[track_caller]
pub fn check_on_finalization_with_options<T>(value: T, options: Options) -> Result<Finalized<T>>
where
    T: Inspect + Send + 'static,
{
    MutationDetector::new(options).check_on_finalization(value)
}

/// Return a snapshot to the global pool.
pub fn release(snapshot: Snapshot) {
    SnapshotPool::global().release(snapshot);
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use immcheck_core::CheckError;

    use super::*;

    fn quiet() -> Options {
        Options::new()
            .skip_fatal_on_mismatch(true)
            .skip_logging_on_mismatch(true)
    }

    #[test]
    fn test_origin_points_at_caller() {
        let snapshot = capture_snapshot(&5u8).unwrap();
        let origin = snapshot.origin().unwrap();
        assert!(origin.file().ends_with("detector.rs"));
        assert_eq!(snapshot.to_string(), format!("Snapshot{{origin: {}; entries: 1}}", origin));
        release(snapshot);
    }

    #[test]
    fn test_skip_origin_capture() {
        let options = Options::new().skip_origin_capture(true);
        let snapshot = capture_snapshot_with_options(&5u8, options).unwrap();
        assert!(snapshot.origin().is_none());
    }

    #[test]
    fn test_capture_into_reuses_snapshot() {
        let mut dst = Snapshot::new();
        capture_snapshot_into(&vec![1u8, 2], &mut dst, Options::default()).unwrap();
        let first = dst.len();
        capture_snapshot_into(&7u64, &mut dst, Options::default()).unwrap();
        assert_eq!(dst.len(), 1);
        assert!(first >= 1);
        assert_eq!(dst.value_type(), Some("u64"));
    }

    #[test]
    fn test_dump_in_report() {
        let value = Cell::new(3i32);
        let detector = MutationDetector::default();
        let before = detector.capture_snapshot_with_dump(&value).unwrap();
        value.set(4);
        let after = detector.capture_snapshot_with_dump(&value).unwrap();

        let err = detector
            .compare(&before, &after)
            .unwrap()
            .into_result()
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("value before: Cell { value: 3 }"));
        assert!(text.contains("value after: Cell { value: 4 }"));
    }

    #[test]
    fn test_check_verify_detects_mutation() {
        let cell = RefCell::new(vec![1u8, 2, 3]);
        let check = ensure_immutability_with_options(&cell, quiet()).unwrap();
        assert!(check.is_enabled());
        assert!(check.verify().is_ok());

        cell.borrow_mut().push(4);
        let err = check.verify().unwrap_err();
        assert!(err.is_mutation());
        let report = err.report().unwrap();
        assert!(report.captured_at.is_some());
        assert!(report.detected_at.is_some());

        // Policy is quiet: no panic.
        check.check();
    }

    #[test]
    fn test_check_reports_borrowed_cell() {
        let cell = RefCell::new(1u32);
        let check = ensure_immutability_with_options(&cell, quiet()).unwrap();
        let _guard = cell.borrow_mut();
        assert!(matches!(
            check.verify(),
            Err(CheckError::UnsupportedType { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "mutation of immutable value detected")]
    fn test_callback_panics_by_default() {
        let cell = Cell::new(1u8);
        let options = Options::new().skip_logging_on_mismatch(true);
        let callback = ensure_immutability_with_options(&cell, options)
            .unwrap()
            .into_callback();
        callback();
        cell.set(2);
        callback();
    }

    #[test]
    fn test_disabled_check_is_silent() {
        let cell = Cell::new(1u8);
        let check = ImmutabilityCheck::disabled(&cell);
        cell.set(2);
        assert!(!check.is_enabled());
        assert!(check.verify().is_ok());
        check.check();
    }

    #[test]
    fn test_nil_root_fails_every_entry_point() {
        let none: Option<Box<u8>> = None;
        assert!(capture_snapshot(&none).is_err());
        assert!(ensure_immutability(&none).is_err());

        let err = check_on_finalization(none).unwrap_err();
        assert!(err.to_string().contains("target value can't be nil"));
    }

    #[test]
    fn test_finalized_derefs_to_value() {
        let wrapped = check_on_finalization_with_options(vec![1u16, 2, 3], quiet()).unwrap();
        assert!(wrapped.is_checked());
        assert_eq!(wrapped.len(), 3);
        assert_eq!(format!("{:?}", wrapped), "Finalized([1, 2, 3])");

        let unchecked = Finalized::unchecked(5u8);
        assert!(!unchecked.is_checked());
        assert_eq!(*unchecked, 5);
    }
}
