//! Check variants that compile to no-ops unless checks are enabled.
//!
//! Checks are enabled in builds with `debug_assertions` or with the
//! `release-checks` feature.

use immcheck_core::{Inspect, Result};

use crate::detector::{Finalized, ImmutabilityCheck, MutationDetector};
use crate::options::Options;

/// Whether the `debug_*` functions perform any work.
pub const CHECKS_ENABLED: bool = cfg!(any(debug_assertions, feature = "release-checks"));

#[track_caller]
pub fn debug_ensure_immutability(root: &dyn Inspect) -> Result<ImmutabilityCheck<'_>> {
    debug_ensure_immutability_with_options(root, Options::default())
}

#[track_caller]
pub fn debug_ensure_immutability_with_options(
    root: &dyn Inspect,
    options: Options,
) -> Result<ImmutabilityCheck<'_>> {
    if !CHECKS_ENABLED {
        return Ok(ImmutabilityCheck::disabled(root));
    }
    MutationDetector::new(options).ensure_immutability(root)
}

#[track_caller]
pub fn debug_check_on_finalization<T>(value: T) -> Result<Finalized<T>>
where
    T: Inspect + Send + 'static,
{
    debug_check_on_finalization_with_options(value, Options::default())
}

#[track_caller]
pub fn debug_check_on_finalization_with_options<T>(value: T, options: Options) -> Result<Finalized<T>>
where
    T: Inspect + Send + 'static,
{
    if !CHECKS_ENABLED {
        return Ok(Finalized::unchecked(value));
    }
    MutationDetector::new(options).check_on_finalization(value)
}
