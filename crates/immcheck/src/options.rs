//! Detector configuration.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use immcheck_core::WalkConfig;
use parking_lot::Mutex;

/// Shared sink for mismatch diagnostics.
pub type LogWriter = Arc<Mutex<dyn Write + Send>>;

/// Configuration for checks.
///
/// All flags are independent and default to `false`; the default
/// configuration captures origins, rejects unsafe kinds, logs mismatches to
/// standard error and then panics.
#[derive(Clone, Default)]
pub struct Options {
    /// Do not record the source location of captures.
    pub skip_origin_capture: bool,
    /// Record raw pointers, callables and channels by their handle. Swapping
    /// the handle is detected, mutation behind it is not.
    pub allow_unsafe_kinds: bool,
    /// Report a mismatch without panicking.
    pub skip_fatal_on_mismatch: bool,
    /// Do not log a mismatch.
    pub skip_logging_on_mismatch: bool,
    /// Where mismatch lines are written. Standard error when `None`.
    pub log_writer: Option<LogWriter>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_origin_capture(mut self, skip: bool) -> Self {
        self.skip_origin_capture = skip;
        self
    }

    pub fn allow_unsafe_kinds(mut self, allow: bool) -> Self {
        self.allow_unsafe_kinds = allow;
        self
    }

    pub fn skip_fatal_on_mismatch(mut self, skip: bool) -> Self {
        self.skip_fatal_on_mismatch = skip;
        self
    }

    pub fn skip_logging_on_mismatch(mut self, skip: bool) -> Self {
        self.skip_logging_on_mismatch = skip;
        self
    }

    /// Send mismatch lines to `writer`.
    pub fn log_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        let writer: LogWriter = Arc::new(Mutex::new(writer));
        self.log_writer = Some(writer);
        self
    }

    /// Traversal settings derived from these options.
    pub fn walk_config(&self) -> WalkConfig {
        WalkConfig {
            allow_unsafe_kinds: self.allow_unsafe_kinds,
            ..WalkConfig::default()
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("skip_origin_capture", &self.skip_origin_capture)
            .field("allow_unsafe_kinds", &self.allow_unsafe_kinds)
            .field("skip_fatal_on_mismatch", &self.skip_fatal_on_mismatch)
            .field("skip_logging_on_mismatch", &self.skip_logging_on_mismatch)
            .field(
                "log_writer",
                &self.log_writer.as_ref().map(|_| "<writer>"),
            )
            .finish()
    }
}
