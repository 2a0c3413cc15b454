//! # immcheck Testkit
//!
//! Testing utilities for immcheck.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Sample value graphs, a shared log sink and tracing setup
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use immcheck_testkit::generators::{profile_from_params, ProfileParams};
//!
//! proptest! {
//!     #[test]
//!     fn capture_is_idempotent(params: ProfileParams) {
//!         let profile = profile_from_params(&params);
//!         let a = immcheck::capture_snapshot(&profile).unwrap();
//!         let b = immcheck::capture_snapshot(&profile).unwrap();
//!         prop_assert!(a.compare(&b).unwrap().is_unchanged());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use immcheck_testkit::fixtures::{Ring, TestFixture};
//!
//! let mut fixture = TestFixture::with_seed(1);
//! let profile = fixture.profile();
//! let ring = Ring::new(3);
//! assert_eq!(ring.nodes().len(), 3);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, wait_for, Node, Person, Profile, Ring, SharedLog, TestFixture};
pub use generators::{profile_from_params, ProfileParams};
