//! End-to-end thread pool scenarios

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use weft::{ThreadPool, ThreadPoolFixed, Work};

#[test]
fn test_single_worker_runs_jobs_in_fifo_order() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut pool = ThreadPool::new(1, 1, Duration::from_secs(60), true);

    for n in 0..10 {
        let log = Arc::clone(&log);
        assert!(pool.push_fn(move || {
            log.lock().push(n);
        }));
    }

    pool.start();
    while !pool.is_queue_empty() {
        std::thread::sleep(Duration::from_millis(1));
    }
    pool.terminate(true).unwrap();

    assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_all_seasonal_pool_still_executes() {
    // Zero core threads: every worker is seasonal with a short TTL.
    let hits = Arc::new(AtomicUsize::new(0));
    let mut pool = ThreadPool::new(0, 4, Duration::from_millis(50), false);

    {
        let hits = Arc::clone(&hits);
        assert!(pool.push_fn(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    while hits.load(Ordering::SeqCst) == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    pool.terminate(true).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pool_owns_and_drops_jobs() {
    struct CountsDrops {
        dropped: Arc<AtomicUsize>,
        executed: Arc<AtomicUsize>,
    }

    impl Work for CountsDrops {
        fn execute(&mut self) {
            self.executed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Drop for CountsDrops {
        fn drop(&mut self) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(AtomicUsize::new(0));
    let executed = Arc::new(AtomicUsize::new(0));

    let mut pool = ThreadPoolFixed::new(2);
    for _ in 0..5 {
        pool.push(CountsDrops {
            dropped: Arc::clone(&dropped),
            executed: Arc::clone(&executed),
        });
    }
    pool.start();
    pool.wait().unwrap();

    assert_eq!(executed.load(Ordering::SeqCst), 5);
    assert_eq!(dropped.load(Ordering::SeqCst), 5);
}

#[test]
fn test_fixed_pool_drains_and_winds_down() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut pool = ThreadPoolFixed::new(4);

    for _ in 0..32 {
        let hits = Arc::clone(&hits);
        assert!(pool.push_fn(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }));
    }

    pool.start();
    pool.wait().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 32);
    assert!(pool.is_queue_empty());
}
