//! Strong type definitions for fingerprint entries.
//!
//! A fingerprint maps [`Locator`]s to [`Digest`]s. Both are newtypes so a raw
//! address can never be confused with a content hash at an API boundary.

use std::fmt;
use std::panic::Location;

use crate::hash::HashSelector;
use crate::inspect::TypeInfo;
use crate::kind::Kind;

/// A 64-bit fingerprint value.
///
/// Either the content hash of a byte span, an entry count (for maps), or a raw
/// address recorded as a terminal marker for nil, empty and unsafe values.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub u64);

impl Digest {
    /// Hash a byte span with the size-selected algorithm.
    pub fn content(bytes: &[u8]) -> Self {
        Self(HashSelector::hash(bytes))
    }

    /// Terminal digest derived from an address.
    pub const fn from_address(address: usize) -> Self {
        Self(address as u64)
    }

    /// Entry-count digest for associative containers.
    pub const fn from_count(count: usize) -> Self {
        Self(count as u64)
    }

    /// Fold an element count into a content digest.
    ///
    /// Sequences of zero-sized elements hash an empty span regardless of
    /// length, so the count has to be part of the digest.
    pub const fn with_len(self, len: usize) -> Self {
        Self(self.0 ^ (len as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    /// Get the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<u64> for Digest {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Traversal-local key of a fingerprint entry.
///
/// Combines the observed address with the value's kind and a tag derived
/// from its static type name. Within one traversal two values only share a
/// locator when they are the same value observed twice.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    address: usize,
    kind: Kind,
    type_tag: u64,
}

impl Locator {
    /// Build the locator for a value of type `info` observed at `address`.
    pub fn new(address: usize, info: &TypeInfo) -> Self {
        Self {
            address,
            kind: info.kind(),
            type_tag: info.tag(),
        }
    }

    pub const fn address(&self) -> usize {
        self.address
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Locator({}@{:#x}/{:08x})",
            self.kind,
            self.address,
            self.type_tag as u32
        )
    }
}

/// Source location a snapshot was captured from.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Origin(&'static Location<'static>);

impl Origin {
    /// Capture the location of the caller.
    ///
    /// Propagates through `#[track_caller]` functions, so public entry points
    /// report the user's call site rather than library internals.
    #[track_caller]
    pub fn caller() -> Self {
        Self(Location::caller())
    }

    pub fn file(&self) -> &'static str {
        self.0.file()
    }

    pub fn line(&self) -> u32 {
        self.0.line()
    }
}

impl From<&'static Location<'static>> for Origin {
    fn from(location: &'static Location<'static>) -> Self {
        Self(location)
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin({}:{})", self.file(), self.line())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file(), self.line())
    }
}
