//! The payload capability executed by graph nodes and pool jobs.
//!
//! A [`Work`] value is an opaque effect invoked exactly once per run. Implement
//! the trait directly for stateful payloads, or wrap a closure with
//! [`work_fn`].

/// A unit of work executed by a graph worker or thread-pool worker.
///
/// The engine guarantees `execute` is called at most once per run, from a
/// single worker thread, after every predecessor has completed. A panic
/// escaping `execute` aborts the run and is re-surfaced by
/// [`crate::Graph::wait`].
///
/// # Examples
///
/// ```
/// use weft::{Graph, Work};
///
/// struct Download {
///     url: String,
/// }
///
/// impl Work for Download {
///     fn execute(&mut self) {
///         println!("fetching {}", self.url);
///     }
/// }
///
/// let mut graph = Graph::default();
/// graph.push(Download { url: "https://example.com".into() }).unwrap();
/// ```
pub trait Work: Send + 'static {
    /// Run the payload. Called with exclusive access.
    fn execute(&mut self);
}

/// Wrap a closure as a [`Work`] payload.
///
/// Arguments are captured by the closure, which covers what a
/// "callable + argument pack" constructor would.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use weft::{work_fn, Graph};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let c = Arc::clone(&counter);
///
/// let mut graph = Graph::default();
/// graph.push(work_fn(move || {
///     c.fetch_add(1, Ordering::SeqCst);
/// })).unwrap();
/// ```
pub fn work_fn<F>(f: F) -> impl Work
where
    F: FnMut() + Send + 'static,
{
    WorkFn(f)
}

struct WorkFn<F>(F);

impl<F> Work for WorkFn<F>
where
    F: FnMut() + Send + 'static,
{
    fn execute(&mut self) {
        (self.0)()
    }
}
