//! Mismatch reporting policy.

use std::io::Write;

use immcheck_core::CheckError;

use crate::options::Options;

/// Log `err` and panic, each unless disabled in `options`.
#[track_caller]
pub(crate) fn report(options: &Options, value_type: &str, err: &CheckError) {
    if !options.skip_logging_on_mismatch {
        log(options, value_type, err);
    }
    if !options.skip_fatal_on_mismatch {
        panic!("{}", err);
    }
}

fn log(options: &Options, value_type: &str, err: &CheckError) {
    match err.report() {
        Some(report) => tracing::error!(
            value_type,
            captured_at = ?report.captured_at,
            detected_at = ?report.detected_at,
            before_entries = report.before_entries,
            after_entries = report.after_entries,
            changed = report.diff.changed,
            added = report.diff.added,
            removed = report.diff.removed,
            "runtime mutation detected"
        ),
        None => tracing::error!(value_type, error = %err, "immutability check failed"),
    }

    let headline = if err.is_mutation() {
        "runtime mutation detected"
    } else {
        "immutability check failed"
    };
    let line = format!(
        "[ERROR] {}; value type: `{}`; error: {}\n",
        headline, value_type, err
    );
    // Write failures are ignored: there is nowhere left to report them.
    let _ = match &options.log_writer {
        Some(writer) => writer.lock().write_all(line.as_bytes()),
        None => std::io::stderr().write_all(line.as_bytes()),
    };
}
