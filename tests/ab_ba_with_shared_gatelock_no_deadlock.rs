mod common;

use common::Scenario;
use synctrace::{framework, LockId, ThreadId};

/// Both threads hold a third lock while racing for A and B: that shared
/// gatelock serializes them, so they can never actually be concurrent and
/// the cycle is not a real deadlock.
#[test]
fn shared_gatelock_prevents_the_deadlock() {
    let scenario = Scenario::start();
    let f = framework();

    let (t1, t2) = (ThreadId(1), ThreadId(2));
    let (lock_a, lock_b, lock_gate) = (LockId(1), LockId(2), LockId(3));

    f.notify_acquire(t1, lock_gate);
    f.notify_acquire(t1, lock_a);
    f.notify_acquire(t1, lock_b);
    f.notify_release(t1, lock_b);
    f.notify_release(t1, lock_a);
    f.notify_release(t1, lock_gate);

    f.notify_acquire(t2, lock_gate);
    f.notify_acquire(t2, lock_b);
    f.notify_acquire(t2, lock_a);
    f.notify_release(t2, lock_a);
    f.notify_release(t2, lock_b);
    f.notify_release(t2, lock_gate);

    let skeleton = scenario.finish();
    assert!(skeleton.deadlocks().is_empty());
}
