//! Minimal call-stack capture/resolution.
//!
//! This is the core's only dependency on the "symbol/stack-walk facility"
//! that the specification treats as an external collaborator: resolving an
//! instruction pointer to a precise `(function, file, line)` is explicitly
//! out of scope. What's implemented here is just enough to attach an opaque,
//! never-failing [`LockDebugInfo`] to every acquisition, built on the
//! standard library's own backtrace support rather than a DWARF/PE reader.

use crate::core::types::{LockDebugInfo, StackFrame};
use std::backtrace::{Backtrace, BacktraceStatus};

/// Maximum number of frames retained per capture. The analyzed stacks here
/// are for diagnostics, not crash reporting, so a shallow cap keeps stored
/// events small.
const MAX_FRAMES: usize = 32;

/// Capture up to [`MAX_FRAMES`] return addresses above the caller.
///
/// `skip_frames` is advisory: because `std::backtrace::Backtrace` does not
/// expose raw instruction pointers without symbol resolution, this
/// implementation resolves eagerly and skips the requested number of
/// leading frames (which normally correspond to the `notify_*` trampoline
/// itself) before truncating to `MAX_FRAMES`.
pub fn capture(skip_frames: usize) -> LockDebugInfo {
    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return LockDebugInfo::empty();
    }

    let rendered = format!("{backtrace:#?}");
    let frames: Vec<StackFrame> = rendered
        .lines()
        .filter(|line| line.trim_start().starts_with(|c: char| c.is_ascii_digit()))
        .skip(skip_frames)
        .take(MAX_FRAMES)
        .enumerate()
        .map(|(ip, line)| StackFrame {
            instruction_pointer: ip,
            function_name: extract_function_name(line),
            module_name: "<unknown>".to_string(),
        })
        .collect();

    LockDebugInfo { frames }
}

fn extract_function_name(line: &str) -> String {
    line.split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "<unresolved>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_never_fails() {
        let info = capture(0);
        // Frames may legitimately be empty depending on build settings
        // (e.g. no debug info); the call itself must never panic.
        let _ = info.frames.len();
    }
}
