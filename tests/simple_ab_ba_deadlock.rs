mod common;

use common::Scenario;
use synctrace::{framework, LockId, ThreadId};

/// Thread 1 acquires A then B; thread 2 acquires B then A. Classic two-lock
/// cycle, reported as exactly one potential deadlock.
#[test]
fn simple_ab_ba_is_reported_once() {
    let scenario = Scenario::start();
    let f = framework();

    let (t1, t2) = (ThreadId(1), ThreadId(2));
    let (lock_a, lock_b) = (LockId(100), LockId(200));

    f.notify_acquire(t1, lock_a);
    f.notify_acquire(t1, lock_b);
    f.notify_release(t1, lock_b);
    f.notify_release(t1, lock_a);

    f.notify_acquire(t2, lock_b);
    f.notify_acquire(t2, lock_a);
    f.notify_release(t2, lock_a);
    f.notify_release(t2, lock_b);

    let skeleton = scenario.finish();
    assert_eq!(skeleton.number_of_threads(), 2);
    assert_eq!(skeleton.number_of_locks(), 2);

    let deadlocks = skeleton.deadlocks();
    assert_eq!(deadlocks.len(), 1);
    assert_eq!(deadlocks[0].threads.len(), 2);
}
