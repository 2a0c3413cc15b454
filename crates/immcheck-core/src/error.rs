//! Error types for immcheck core.

use std::fmt;

use thiserror::Error;

use crate::inspect::TypeInfo;
use crate::kind::Kind;
use crate::snapshot::MutationReport;

/// Errors produced by capture and comparison.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("unsupported type for immutability check: `{type_name}` ({kind}): {reason}")]
    UnsupportedType {
        type_name: &'static str,
        kind: Kind,
        reason: Unsupported,
    },

    #[error("invalid snapshot state: {0}")]
    InvalidSnapshotState(&'static str),

    #[error("mutation of immutable value detected\n{0}")]
    MutationDetected(Box<MutationReport>),
}

impl CheckError {
    pub(crate) fn unsupported(info: &TypeInfo, reason: Unsupported) -> Self {
        CheckError::UnsupportedType {
            type_name: info.name(),
            kind: info.kind(),
            reason,
        }
    }

    /// Returns true for [`CheckError::MutationDetected`].
    pub fn is_mutation(&self) -> bool {
        matches!(self, CheckError::MutationDetected(_))
    }

    /// The report carried by a mutation error.
    pub fn report(&self) -> Option<&MutationReport> {
        match self {
            CheckError::MutationDetected(report) => Some(report),
            _ => None,
        }
    }
}

/// Why a value could not be fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    /// Raw pointer, callable or channel without the unsafe opt-in.
    UnsafeKind,
    /// Type-erased value.
    Untyped,
    /// Root is `None` or a dead weak reference.
    NilRoot,
    /// `RefCell` mutably borrowed during the capture.
    Borrowed,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unsupported::UnsafeKind => {
                "inherently unsafe kind; enable allow_unsafe_kinds to record its handle"
            }
            Unsupported::Untyped => "type-erased value can't be inspected",
            Unsupported::NilRoot => "target value can't be nil",
            Unsupported::Borrowed => "value is mutably borrowed",
        })
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
