//! Request-coalescing primitive ("singleflight"): N concurrent callers for
//! the same key trigger exactly one execution of the underlying async
//! function and share its result or error (spec section 4.3).
//!
//! Grounded on `original_source/src/internal/singleflight.py`, which wraps
//! the call in an `asyncio.Task` keyed by a dict guarded by a lock, and
//! deregisters only if the table still points at *its own* task. The Rust
//! port keeps that exact shape but swaps the lock+dict for `DashMap`'s
//! per-shard locking (atomic at the single-key granularity we need) and
//! spawns the call as a real `tokio` task so `forget` can abort it even
//! while waiters are still polling.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

/// Mirrors Python's `asyncio.CancelledError` propagation: a waiter that
/// observes the owning call get cancelled (via `forget`) sees this instead
/// of a value.
#[derive(Debug, Clone)]
pub enum SingleflightError<E> {
    Cancelled,
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for SingleflightError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleflightError::Cancelled => write!(f, "call was cancelled"),
            SingleflightError::Inner(e) => write!(f, "{e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for SingleflightError<E> {}

enum Outcome<R, E> {
    Done(Result<R, E>),
    Cancelled,
}

impl<R: Clone, E: Clone> Outcome<R, E> {
    fn into_result(self) -> Result<R, SingleflightError<E>> {
        match self {
            Outcome::Done(Ok(r)) => Ok(r),
            Outcome::Done(Err(e)) => Err(SingleflightError::Inner(e)),
            Outcome::Cancelled => Err(SingleflightError::Cancelled),
        }
    }
}

struct Call<R, E> {
    id: u64,
    abort: tokio::task::AbortHandle,
    fut: Shared<BoxFuture<'static, Arc<Outcome<R, E>>>>,
}

impl<R, E> Clone for Call<R, E> {
    fn clone(&self) -> Self {
        Call {
            id: self.id,
            abort: self.abort.clone(),
            fut: self.fut.clone(),
        }
    }
}

/// Generic over a key type `K` and a fallible result type `Result<R, E>`.
pub struct Singleflight<K, R, E> {
    calls: DashMap<K, Call<R, E>>,
    next_id: AtomicU64,
}

impl<K, R, E> Default for Singleflight<K, R, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Singleflight {
            calls: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<K, R, E> Singleflight<K, R, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f()` under the given `key`, coalescing concurrent callers.
    ///
    /// Callers that register strictly after a call has started observe
    /// that call's result; callers that register strictly after it ends
    /// start a new call (spec section 4.3, "Ordering guarantee").
    pub async fn run<F, Fut>(&self, key: K, f: F) -> Result<R, SingleflightError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        // Fast path: someone else's call is already registered.
        if let Some(existing) = self.calls.get(&key) {
            let fut = existing.fut.clone();
            drop(existing);
            return (*fut.await).clone().into_result();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // `entry()` locks the key's shard for the whole match, so the
        // occupied/vacant check and the spawn in the vacant arm are atomic
        // with respect to any other caller racing this same key — only
        // the caller that actually wins the race ever spawns `f()`.
        // Spawning outside this lock (as a prior version of this function
        // did) let two callers who both missed the fast-path check above
        // both spawn, running the underlying call twice for one key.
        let (is_owner, shared) = match self.calls.entry(key.clone()) {
            Entry::Occupied(o) => (false, o.get().fut.clone()),
            Entry::Vacant(v) => {
                let handle = tokio::spawn(f());
                let abort = handle.abort_handle();
                let fut = async move {
                    match handle.await {
                        Ok(Ok(r)) => Outcome::Done(Ok(r)),
                        Ok(Err(e)) => Outcome::Done(Err(e)),
                        Err(_join_error) => Outcome::Cancelled,
                    }
                }
                .boxed()
                .shared();
                v.insert(Call { id, abort, fut: fut.clone() });
                (true, fut)
            }
        };

        let outcome = (*shared.await).clone();

        if is_owner {
            // Deregister only if the table still points at *this* call —
            // protects against a race with `forget` immediately followed
            // by a new call for the same key (spec section 4.3 /
            // "Singleflight cleanup race" design note).
            if let Entry::Occupied(o) = self.calls.entry(key) {
                if o.get().id == id {
                    o.remove();
                }
            }
        }

        outcome.into_result()
    }

    /// Remove and cancel the in-flight call for `key`, if any. Waits up to
    /// 1s for the cancelled task to actually finish unwinding.
    pub async fn forget(&self, key: &K) -> bool {
        let Some((_, call)) = self.calls.remove(key) else {
            return false;
        };
        call.abort.abort();
        let _ = tokio::time::timeout(Duration::from_secs(1), call.fut).await;
        true
    }

    pub fn in_flight_count(&self) -> usize {
        self.calls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    // Needs the multi-threaded runtime: a single-threaded one can never
    // actually interleave the fast-path check and the entry-lock check
    // across two callers, so it can't catch a double-spawn regression.
    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn coalesces_concurrent_callers() {
        let sf: Arc<Singleflight<String, u32, String>> = Arc::new(Singleflight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let sf = sf.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                sf.run("k".to_string(), move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<u32, String>(42)
                    }
                })
                .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sf.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn sequential_calls_run_again() {
        let sf: Singleflight<String, u32, String> = Singleflight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let r = sf
                .run("k".to_string(), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, String>(1)
                })
                .await;
            assert_eq!(r.unwrap(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn forget_cancels_in_flight_call() {
        let sf: Arc<Singleflight<String, u32, String>> = Arc::new(Singleflight::new());

        let sf2 = sf.clone();
        let waiter = tokio::spawn(async move {
            sf2.run("k".to_string(), || async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<u32, String>(1)
            })
            .await
        });

        // Give the call a moment to register.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sf.forget(&"k".to_string()).await);

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(SingleflightError::Cancelled)));

        // A subsequent call for the same key must run fresh.
        let r = sf
            .run("k".to_string(), || async move { Ok::<u32, String>(99) })
            .await;
        assert_eq!(r.unwrap(), 99);
    }

    #[tokio::test]
    async fn shares_errors_across_waiters() {
        let sf: Arc<Singleflight<String, u32, String>> = Arc::new(Singleflight::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let sf = sf.clone();
            handles.push(tokio::spawn(async move {
                sf.run("k".to_string(), || async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<u32, String>("boom".to_string())
                })
                .await
            }));
        }
        for h in handles {
            let r = h.await.unwrap();
            match r {
                Err(SingleflightError::Inner(msg)) => assert_eq!(msg, "boom"),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }
}

impl<R, E> fmt::Debug for Outcome<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done(Ok(_)) => write!(f, "Done(Ok)"),
            Outcome::Done(Err(_)) => write!(f, "Done(Err)"),
            Outcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}
