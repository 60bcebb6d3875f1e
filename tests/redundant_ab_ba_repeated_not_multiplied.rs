mod common;

use common::Scenario;
use synctrace::{framework, LockId, ThreadId};

/// The same AB/BA pattern repeated a hundred times produces identical edge
/// labels each time, so the lock graph collapses them to one edge per
/// direction and the analyzer reports exactly one deadlock, not a hundred.
#[test]
fn redundant_acquisitions_collapse_to_one_diagnostic() {
    let scenario = Scenario::start();
    let f = framework();

    let (t1, t2) = (ThreadId(1), ThreadId(2));
    let (lock_a, lock_b) = (LockId(1), LockId(2));

    for _ in 0..100 {
        f.notify_acquire(t1, lock_a);
        f.notify_acquire(t1, lock_b);
        f.notify_release(t1, lock_b);
        f.notify_release(t1, lock_a);

        f.notify_acquire(t2, lock_b);
        f.notify_acquire(t2, lock_a);
        f.notify_release(t2, lock_a);
        f.notify_release(t2, lock_b);
    }

    let skeleton = scenario.finish();
    let deadlocks = skeleton.deadlocks();
    assert_eq!(deadlocks.len(), 1);
}
