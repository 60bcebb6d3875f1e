use std::sync::{Mutex, MutexGuard};
use synctrace::{framework, Recorder, Skeleton};
use tempfile::TempDir;

/// The process-wide framework is a singleton; serialize every scenario that
/// shares a test binary so their event streams never interleave.
static FRAMEWORK_LOCK: Mutex<()> = Mutex::new(());

pub struct Scenario {
    dir: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl Scenario {
    /// Start recording into a fresh temporary repository.
    pub fn start() -> Self {
        let guard = FRAMEWORK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().expect("tempdir");
        Recorder::new()
            .with_repository(dir.path())
            .start()
            .expect("failed to start recording");
        Scenario { dir, _guard: guard }
    }

    /// Stop recording and replay everything written so far.
    pub fn finish(self) -> Skeleton {
        framework().disable();
        framework().unset_repository();
        Skeleton::load(self.dir.path()).expect("failed to load recorded repository")
    }
}
