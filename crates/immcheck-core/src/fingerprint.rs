//! Fingerprint: the set of digests from one traversal.

use std::collections::hash_map::{self, HashMap};

use crate::types::{Digest, Locator};

/// Mapping from [`Locator`] to [`Digest`].
///
/// Two fingerprints are equal iff they have the same size and the same
/// digest for every locator. Insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    entries: HashMap<Locator, Digest>,
}

/// Per-entry differences between two fingerprints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintDiff {
    /// Locators present in both with different digests.
    pub changed: usize,
    /// Locators only in the later fingerprint.
    pub added: usize,
    /// Locators only in the earlier fingerprint.
    pub removed: usize,
}

impl FingerprintDiff {
    pub const fn is_empty(&self) -> bool {
        self.changed == 0 && self.added == 0 && self.removed == 0
    }
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `digest` for `locator`, returning the digest it replaced.
    pub fn insert(&mut self, locator: Locator, digest: Digest) -> Option<Digest> {
        self.entries.insert(locator, digest)
    }

    pub fn get(&self, locator: &Locator) -> Option<Digest> {
        self.entries.get(locator).copied()
    }

    pub fn contains(&self, locator: &Locator) -> bool {
        self.entries.contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Locator, Digest> {
        self.entries.iter()
    }

    /// Count the entries that differ from `later`.
    pub fn diff(&self, later: &Fingerprint) -> FingerprintDiff {
        let mut diff = FingerprintDiff::default();
        for (locator, digest) in &self.entries {
            match later.entries.get(locator) {
                Some(other) if other != digest => diff.changed += 1,
                Some(_) => {}
                None => diff.removed += 1,
            }
        }
        diff.added = later
            .entries
            .keys()
            .filter(|locator| !self.entries.contains_key(locator))
            .count();
        diff
    }
}

impl<'a> IntoIterator for &'a Fingerprint {
    type Item = (&'a Locator, &'a Digest);
    type IntoIter = hash_map::Iter<'a, Locator, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::Inspect;

    fn locator(address: usize) -> Locator {
        Locator::new(address, &u32::describe())
    }

    #[test]
    fn test_order_independent_equality() {
        let entries = [(0x10, 1u64), (0x20, 2), (0x30, 3)];

        let mut forward = Fingerprint::new();
        for (address, digest) in entries {
            forward.insert(locator(address), Digest(digest));
        }
        let mut backward = Fingerprint::new();
        for (address, digest) in entries.into_iter().rev() {
            backward.insert(locator(address), Digest(digest));
        }

        assert_eq!(forward, backward);
        assert!(forward.diff(&backward).is_empty());
    }

    #[test]
    fn test_diff_counts() {
        let mut before = Fingerprint::new();
        before.insert(locator(1), Digest(1));
        before.insert(locator(2), Digest(2));
        before.insert(locator(3), Digest(3));

        let mut after = Fingerprint::new();
        after.insert(locator(1), Digest(1));
        after.insert(locator(2), Digest(20));
        after.insert(locator(4), Digest(4));

        assert_ne!(before, after);
        assert_eq!(
            before.diff(&after),
            FingerprintDiff {
                changed: 1,
                added: 1,
                removed: 1
            }
        );
    }

    #[test]
    fn test_size_mismatch_is_unequal() {
        let mut small = Fingerprint::new();
        small.insert(locator(1), Digest(1));
        let mut large = small.clone();
        large.insert(locator(2), Digest(2));
        assert_ne!(small, large);
    }

    #[test]
    fn test_clear() {
        let mut fingerprint = Fingerprint::new();
        fingerprint.insert(locator(1), Digest(1));
        fingerprint.clear();
        assert!(fingerprint.is_empty());
        assert_eq!(fingerprint.get(&locator(1)), None);
    }
}
