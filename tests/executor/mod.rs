//! Executor façade scenarios

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft::{Executor, Graph};

#[test]
fn test_executor_runs_dependencies_in_order() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut graph = Graph::new(4, true);

    let stages: Vec<_> = ["fetch", "parse", "store"]
        .into_iter()
        .map(|stage| {
            let log = Arc::clone(&log);
            graph.push_fn(move || log.lock().push(stage)).unwrap()
        })
        .collect();
    stages[1].depend(&stages[0]).unwrap();
    stages[2].depend(&stages[1]).unwrap();

    let (_graph, outcome) = Executor::start(graph).join();
    outcome.unwrap();
    assert_eq!(*log.lock(), ["fetch", "parse", "store"]);
}

#[test]
fn test_graph_is_reusable_after_join() {
    let hits = Arc::new(AtomicUsize::new(0));
    let mut graph = Graph::default();
    let counter = Arc::clone(&hits);
    graph
        .push_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let (graph, outcome) = Executor::start(graph).join();
    outcome.unwrap();

    // The handle returns the graph; run it again on another thread.
    let (_graph, outcome) = Executor::start(graph).join();
    outcome.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_main_thread_stays_free_while_running() {
    let mut graph = Graph::default();
    graph
        .push_fn(|| std::thread::sleep(std::time::Duration::from_millis(100)))
        .unwrap();

    let started = std::time::Instant::now();
    let handle = Executor::start(graph);
    // Launch returns immediately, well before the payload finishes.
    assert!(started.elapsed() < std::time::Duration::from_millis(50));

    let (_graph, outcome) = handle.join();
    outcome.unwrap();
    assert!(started.elapsed() >= std::time::Duration::from_millis(100));
}
