//! Snapshots and their comparison.

use std::fmt;

use crate::error::{CheckError, Result};
use crate::fingerprint::{Fingerprint, FingerprintDiff};
use crate::inspect::Inspect;
use crate::types::Origin;
use crate::walker::{GraphWalker, WalkConfig, Workspace};

/// A captured fingerprint plus diagnostic metadata.
///
/// Snapshots are reusable: [`Snapshot::capture`] overwrites the previous
/// content, and [`Snapshot::reset`] clears it while keeping allocations.
#[derive(Debug, Default)]
pub struct Snapshot {
    fingerprint: Fingerprint,
    origin: Option<Origin>,
    value_type: Option<&'static str>,
    dump: Option<String>,
    workspace: Workspace,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all content, keeping allocations.
    pub fn reset(&mut self) {
        self.fingerprint.clear();
        self.origin = None;
        self.value_type = None;
        self.dump = None;
        self.workspace.clear();
    }

    /// Fingerprint everything reachable from `root`.
    ///
    /// On failure the snapshot is left empty, with no value type.
    pub fn capture(&mut self, root: &dyn Inspect, config: &WalkConfig) -> Result<()> {
        self.fingerprint.clear();
        self.value_type = Some(root.type_info().name());

        let result = GraphWalker::new(&mut self.fingerprint, &mut self.workspace, *config)
            .walk(root);
        if result.is_err() {
            self.fingerprint.clear();
            self.value_type = None;
        }
        result
    }

    pub fn set_origin(&mut self, origin: Option<Origin>) {
        self.origin = origin;
    }

    pub fn set_dump(&mut self, dump: Option<String>) {
        self.dump = dump;
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin
    }

    pub fn value_type(&self) -> Option<&'static str> {
        self.value_type
    }

    pub fn dump(&self) -> Option<&str> {
        self.dump.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprint.is_empty()
    }

    /// Compare this snapshot against a later one.
    ///
    /// Fails with [`CheckError::InvalidSnapshotState`] when either side was
    /// never populated.
    pub fn compare(&self, after: &Snapshot) -> Result<Outcome> {
        if self.is_empty() || after.is_empty() {
            return Err(CheckError::InvalidSnapshotState(
                "both snapshots must be captured before comparison",
            ));
        }
        if self.fingerprint == after.fingerprint {
            return Ok(Outcome::Unchanged);
        }
        Ok(Outcome::Mutated(Box::new(MutationReport::between(self, after))))
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Some(origin) => write!(f, "Snapshot{{origin: {}; ", origin)?,
            None => f.write_str("Snapshot{")?,
        }
        write!(f, "entries: {}}}", self.len())
    }
}

/// Result of comparing two snapshots.
#[derive(Debug)]
#[must_use]
pub enum Outcome {
    Unchanged,
    Mutated(Box<MutationReport>),
}

impl Outcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Outcome::Unchanged)
    }

    /// Turn a mismatch into [`CheckError::MutationDetected`].
    pub fn into_result(self) -> Result<()> {
        match self {
            Outcome::Unchanged => Ok(()),
            Outcome::Mutated(report) => Err(CheckError::MutationDetected(report)),
        }
    }
}

/// Context for locating a detected mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub value_type: Option<&'static str>,
    pub captured_at: Option<Origin>,
    pub detected_at: Option<Origin>,
    pub before_entries: usize,
    pub after_entries: usize,
    pub diff: FingerprintDiff,
    pub before_dump: Option<String>,
    pub after_dump: Option<String>,
}

impl MutationReport {
    fn between(before: &Snapshot, after: &Snapshot) -> Self {
        Self {
            value_type: before.value_type.or(after.value_type),
            captured_at: before.origin,
            detected_at: after.origin,
            before_entries: before.len(),
            after_entries: after.len(),
            diff: before.fingerprint.diff(&after.fingerprint),
            before_dump: before.dump.clone(),
            after_dump: after.dump.clone(),
        }
    }
}

impl fmt::Display for MutationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(origin) = self.captured_at {
            writeln!(f, "immutable snapshot was captured here {}", origin)?;
        }
        if let Some(origin) = self.detected_at {
            writeln!(f, "mutation was detected here {}", origin)?;
        }
        if let Some(value_type) = self.value_type {
            writeln!(f, "value type: `{}`", value_type)?;
        }
        write!(
            f,
            "entries: {} before, {} after; {} changed, {} added, {} removed",
            self.before_entries,
            self.after_entries,
            self.diff.changed,
            self.diff.added,
            self.diff.removed
        )?;
        if let Some(dump) = &self.before_dump {
            write!(f, "\nvalue before: {}", dump)?;
        }
        if let Some(dump) = &self.after_dump {
            write!(f, "\nvalue after: {}", dump)?;
        }
        Ok(())
    }
}
