//! Parallelism and scaling tests

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use weft::Graph;

#[test]
fn test_independent_nodes_overlap() {
    // Two nodes that only finish once both are running: proves the workers
    // actually execute siblings concurrently.
    let in_flight = Arc::new(AtomicUsize::new(0));
    let mut graph = Graph::new(2, true);

    for _ in 0..2 {
        let in_flight = Arc::clone(&in_flight);
        graph
            .push_fn(move || {
                in_flight.fetch_add(1, Ordering::SeqCst);
                let deadline = std::time::Instant::now() + Duration::from_secs(2);
                while in_flight.load(Ordering::SeqCst) < 2 {
                    assert!(
                        std::time::Instant::now() < deadline,
                        "sibling never started running concurrently"
                    );
                    std::thread::yield_now();
                }
            })
            .unwrap();
    }

    graph.start().unwrap();
    graph.wait().unwrap();
}

#[test]
fn test_long_chain_runs_sequentially() {
    const CHAIN: usize = 1000;

    let counter = Arc::new(AtomicUsize::new(0));
    let running = Arc::new(AtomicIsize::new(0));
    let peak = Arc::new(AtomicIsize::new(0));
    let mut graph = Graph::new(4, true);

    let mut previous: Option<weft::Task> = None;
    for _ in 0..CHAIN {
        let counter = Arc::clone(&counter);
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        let task = graph
            .push_fn(move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                counter.fetch_add(1, Ordering::SeqCst);
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .unwrap();
        if let Some(previous) = &previous {
            task.depend(previous).unwrap();
        }
        previous = Some(task);
    }

    graph.start().unwrap();
    graph.wait().unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), CHAIN);
    // A linear chain can never have two payloads in flight.
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn test_wide_fanout_runs_every_node_once() {
    const WIDTH: usize = 64;

    let hits = Arc::new(AtomicUsize::new(0));
    let mut graph = Graph::new(8, true);

    let root = graph.push_fn(|| ()).unwrap();
    for _ in 0..WIDTH {
        let hits = Arc::clone(&hits);
        graph
            .push_fn(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
            .depend(&root)
            .unwrap();
    }

    graph.start().unwrap();
    graph.wait().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), WIDTH);
}

#[test]
fn test_optimized_threads_handles_more_workers_than_nodes() {
    // 16 configured workers, 1 node: the optimized cap must not leave
    // spare workers deadlocked.
    let hits = Arc::new(AtomicUsize::new(0));
    let mut graph = Graph::new(16, true);
    let counter = Arc::clone(&hits);
    graph
        .push_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    graph.start().unwrap();
    graph.wait().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unoptimized_threads_tolerate_empty_graph() {
    let mut graph = Graph::new(4, false);
    graph.start().unwrap();
    graph.wait().unwrap();
}
