//! # immcheck core
//!
//! Deep structural fingerprints of in-memory value graphs.
//!
//! This crate captures a [`Fingerprint`] of everything reachable from a root
//! value and compares two fingerprints exactly. It has no policy: logging,
//! panicking and background checks live in the `immcheck` crate.
//!
//! ## Key Types
//!
//! - [`Inspect`] - How a type exposes itself to the walker
//! - [`GraphWalker`] - Iterative traversal filling a fingerprint
//! - [`Snapshot`] - A fingerprint plus capture origin and value dump
//! - [`SnapshotPool`] - Recycled snapshot containers
//! - [`TypeCache`] - Sharded memo of primitive-type verdicts
//!
//! ## Hashing
//!
//! Content digests are 64-bit, keyed with a per-process seed. See [`hash`].

pub mod cache;
pub mod classify;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod inspect;
pub mod kind;
pub mod pool;
pub mod snapshot;
pub mod types;
pub mod walker;

pub use cache::{CacheStats, TypeCache, TypeKey};
pub use classify::TypeClassifier;
pub use error::{CheckError, Result, Unsupported};
pub use fingerprint::{Fingerprint, FingerprintDiff};
pub use hash::{HashAlgorithm, HashSelector};
pub use inspect::{address_of, Inspect, Members, Sequence, Shape, TypeInfo};
pub use kind::{Kind, ReferenceKind, ScalarKind, SequenceKind, UnsafeKind};
pub use pool::{PooledSnapshot, SnapshotPool};
pub use snapshot::{MutationReport, Outcome, Snapshot};
pub use types::{Digest, Locator, Origin};
pub use walker::{GraphWalker, WalkConfig, Workspace};
