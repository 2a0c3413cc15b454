//! # immcheck
//!
//! Runtime detection of mutation of values declared immutable.
//!
//! ## Overview
//!
//! A value is fingerprinted by walking everything reachable from it. A
//! later fingerprint of the same value is compared exactly against the
//! first; any changed byte, length, or pointer anywhere in the graph is a
//! mismatch.
//!
//! Three ways to use it:
//!
//! - **Snapshots**: [`capture_snapshot`] twice and [`compare`]
//! - **Checks**: [`ensure_immutability`] captures now and returns an
//!   [`ImmutabilityCheck`] that can be re-run any number of times
//! - **Finalization**: [`check_on_finalization`] owns the value and checks
//!   it on a background thread when the wrapper is dropped
//!
//! ## Key Concepts
//!
//! - **Interior mutability**: `Cell`, `RefCell` and shared owners are what
//!   can change behind `&T`, and what this crate watches.
//! - **Unsafe kinds**: raw pointers, callables and channels are rejected
//!   unless [`Options::allow_unsafe_kinds`] is set. When allowed, only their
//!   address is recorded.
//! - **Policy**: a mismatch found by a check is logged and then panics,
//!   each configurable through [`Options`].
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::RefCell;
//! use immcheck::{ensure_immutability_with_options, inspect_struct, Options};
//!
//! struct Config {
//!     name: String,
//!     limits: RefCell<Vec<u32>>,
//! }
//!
//! inspect_struct!(Config { name: String, limits: RefCell<Vec<u32>> });
//!
//! let config = Config {
//!     name: "main".into(),
//!     limits: RefCell::new(vec![1, 2, 3]),
//! };
//!
//! let options = Options::new().skip_fatal_on_mismatch(true);
//! let check = ensure_immutability_with_options(&config, options).unwrap();
//! assert!(check.verify().is_ok());
//!
//! config.limits.borrow_mut()[0] = 99;
//! assert!(check.verify().unwrap_err().is_mutation());
//! ```
//!
//! ## Debug-only Checks
//!
//! The `debug_*` functions in [`debug`] do nothing unless
//! [`CHECKS_ENABLED`] is set, which it is under `debug_assertions` or the
//! `release-checks` feature.
//!
//! ## Re-exports
//!
//! - `immcheck::core` - Fingerprinting engine (Inspect, Snapshot, walker)

pub mod debug;
pub mod detector;
pub mod options;
pub mod reclaim;
mod report;

pub use immcheck_core as core;

pub use debug::{
    debug_check_on_finalization, debug_check_on_finalization_with_options,
    debug_ensure_immutability, debug_ensure_immutability_with_options, CHECKS_ENABLED,
};
pub use detector::{
    capture_snapshot, capture_snapshot_into, capture_snapshot_with_options,
    check_on_finalization, check_on_finalization_with_options, compare, ensure_immutability,
    ensure_immutability_with_options, release, Finalized, ImmutabilityCheck, MutationDetector,
};
pub use options::{LogWriter, Options};

pub use immcheck_core::{
    inspect_struct, CheckError, Inspect, Kind, MutationReport, Origin, Outcome, Result, Snapshot,
    Unsupported,
};
