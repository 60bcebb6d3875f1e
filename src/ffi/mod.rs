//! C-compatible bindings over [`crate::core::framework`], for language
//! runtimes that cannot link the safe Rust API directly. Gated behind the
//! `ffi` feature; every entry point takes plain integers or null-terminated
//! C strings and never panics across the boundary.

use crate::core::framework;
use crate::core::types::{LockId, ThreadId};
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};

/// Construct a fresh repository at `path` and make it the active store.
///
/// # Returns
/// * `0` on success
/// * `-1` if `path` is not valid UTF-8
/// * `-2` if the repository could not be created (see `log` output for the
///   underlying I/O or path error)
///
/// # Safety
/// `path` must be a valid pointer to a null-terminated C string, or null
/// behavior is caller UB per the usual `CStr::from_ptr` contract.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn set_log_repository(path: *const c_char) -> c_int {
    let path = match unsafe { CStr::from_ptr(path) }.to_str() {
        Ok(s) => s,
        Err(_) => return -1,
    };
    match framework().set_repository(path) {
        Ok(()) => 0,
        Err(e) => {
            log::warn!("set_log_repository failed: {e}");
            -2
        }
    }
}

/// Drop the active repository, if any.
#[unsafe(no_mangle)]
pub extern "C" fn unset_log_repository() {
    framework().unset_repository();
}

#[unsafe(no_mangle)]
pub extern "C" fn enable_event_logging() {
    framework().enable();
}

#[unsafe(no_mangle)]
pub extern "C" fn disable_event_logging() {
    framework().disable();
}

#[unsafe(no_mangle)]
pub extern "C" fn is_enabled() -> bool {
    framework().is_enabled()
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_acquire(thread: usize, lock: usize) {
    framework().notify_acquire(ThreadId(thread), LockId(lock));
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_release(thread: usize, lock: usize) {
    framework().notify_release(ThreadId(thread), LockId(lock));
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_recursive_acquire(thread: usize, lock: usize) {
    framework().notify_recursive_acquire(ThreadId(thread), LockId(lock));
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_recursive_release(thread: usize, lock: usize) {
    framework().notify_recursive_release(ThreadId(thread), LockId(lock));
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_start(parent: usize, child: usize) {
    framework().notify_start(ThreadId(parent), ThreadId(child));
}

#[unsafe(no_mangle)]
pub extern "C" fn notify_join(parent: usize, child: usize) {
    framework().notify_join(ThreadId(parent), ThreadId(child));
}

/// Mint a new globally unique lock id.
#[unsafe(no_mangle)]
pub extern "C" fn new_lock_id() -> usize {
    crate::core::new_lock_id().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn set_log_repository_rejects_invalid_utf8() {
        let bytes = [0x66, 0xff, 0x00];
        let c_str = unsafe { CStr::from_bytes_with_nul_unchecked(&bytes) };
        let result = unsafe { set_log_repository(c_str.as_ptr()) };
        assert_eq!(result, -1);
    }

    #[test]
    fn set_log_repository_succeeds_on_a_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("repo").to_str().unwrap()).unwrap();
        let result = unsafe { set_log_repository(path.as_ptr()) };
        assert_eq!(result, 0);
        unset_log_repository();
    }

    #[test]
    fn enable_disable_round_trip_through_ffi() {
        enable_event_logging();
        assert!(is_enabled());
        disable_event_logging();
        assert!(!is_enabled());
    }
}
