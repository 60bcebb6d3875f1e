mod common;

use common::Scenario;
use synctrace::{framework, LockId, ThreadId};

/// Thread 1 does A-then-B and is joined *before* thread 2 starts and does
/// B-then-A: the lock orders look inverted but the threads never actually
/// overlap, so happens-before rules the cycle out.
#[test]
fn sequenced_by_a_join_has_no_deadlock() {
    let scenario = Scenario::start();
    let f = framework();

    let main = ThreadId(0);
    let (t1, t2) = (ThreadId(1), ThreadId(2));
    let (lock_a, lock_b) = (LockId(1), LockId(2));

    f.notify_start(main, t1);
    f.notify_acquire(t1, lock_a);
    f.notify_acquire(t1, lock_b);
    f.notify_release(t1, lock_b);
    f.notify_release(t1, lock_a);
    f.notify_join(main, t1);

    f.notify_start(main, t2);
    f.notify_acquire(t2, lock_b);
    f.notify_acquire(t2, lock_a);
    f.notify_release(t2, lock_a);
    f.notify_release(t2, lock_b);
    f.notify_join(main, t2);

    let skeleton = scenario.finish();
    assert!(skeleton.deadlocks().is_empty());
}
