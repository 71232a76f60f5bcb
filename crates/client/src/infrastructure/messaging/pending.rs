//! Awaitable pending operations over a fire-and-forget send channel.
//!
//! Two concurrency disciplines are provided on top of the same settled-once
//! primitive:
//!
//! - [`UniqueSlot`]: at most one in-flight operation per channel; a second
//!   submission while one is outstanding coalesces onto the in-flight result
//!   instead of issuing a duplicate request.
//! - [`SerialQueue`]: operations run strictly one at a time in submission
//!   order; each starter is only invoked once the previous operation for the
//!   channel has settled. [`SerialGroup`] keys such queues by entity id so
//!   one hero's actions serialize while different heroes proceed in parallel.
//!
//! A timeout is purely a client-side liveness guard: expiry rejects the
//! operation but does not cancel the request on the wire.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::error::ClientError;

type Settled<T> = Result<T, ClientError>;
type BoxedStarter = Box<dyn FnOnce() -> Result<(), ClientError> + Send>;

/// One in-flight operation: its waiters, its timer, and an epoch that lets
/// the timer recognize whether it still owns the slot.
struct PendingOp<T> {
    waiters: Vec<oneshot::Sender<Settled<T>>>,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl<T: Clone> PendingOp<T> {
    fn new(epoch: u64) -> Self {
        Self {
            waiters: Vec::new(),
            epoch,
            timer: None,
        }
    }

    fn add_waiter(&mut self) -> oneshot::Receiver<Settled<T>> {
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        rx
    }

    /// Settle exactly once: stop the timer, fan the result out to every
    /// waiter. Consumes the operation so it cannot settle twice.
    fn finish(mut self, result: Settled<T>) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        for waiter in self.waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

// =============================================================================
// Unique slot
// =============================================================================

struct UniqueInner<T> {
    current: Option<PendingOp<T>>,
    next_epoch: u64,
}

/// A channel holding at most one in-flight operation.
pub struct UniqueSlot<T> {
    inner: Arc<Mutex<UniqueInner<T>>>,
}

impl<T> Clone for UniqueSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for UniqueSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> UniqueSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(UniqueInner {
                current: None,
                next_epoch: 0,
            })),
        }
    }

    /// Await the channel's result.
    ///
    /// If an operation is already in flight the starter is NOT invoked and
    /// the caller shares the in-flight result (coalescing dedupe, not a
    /// retry). Otherwise the starter performs the send and, with a nonzero
    /// timeout, a liveness timer is armed.
    pub async fn submit<F>(&self, starter: F, timeout: Duration) -> Result<T, ClientError>
    where
        F: FnOnce() -> Result<(), ClientError>,
    {
        let rx = {
            let mut inner = self.inner.lock().await;
            match inner.current.as_mut() {
                Some(op) => op.add_waiter(),
                None => {
                    inner.next_epoch += 1;
                    let mut op = PendingOp::new(inner.next_epoch);
                    let rx = op.add_waiter();
                    starter()?;
                    if !timeout.is_zero() {
                        op.timer = Some(spawn_unique_timer(
                            Arc::clone(&self.inner),
                            op.epoch,
                            timeout,
                        ));
                    }
                    inner.current = Some(op);
                    rx
                }
            }
        };
        rx.await.map_err(|_| ClientError::Cancelled)?
    }

    pub async fn resolve(&self, value: T) {
        self.settle(Ok(value)).await;
    }

    pub async fn reject(&self, error: ClientError) {
        self.settle(Err(error)).await;
    }

    /// Settle and clear the slot; a late answer after settlement finds the
    /// slot empty and is ignored.
    async fn settle(&self, result: Settled<T>) {
        let op = self.inner.lock().await.current.take();
        if let Some(op) = op {
            op.finish(result);
        }
    }
}

fn spawn_unique_timer<T: Clone + Send + 'static>(
    inner: Arc<Mutex<UniqueInner<T>>>,
    epoch: u64,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let op = {
            let mut guard = inner.lock().await;
            // Only the operation this timer was armed for; a newer occupant
            // of the slot is left alone.
            if guard.current.as_ref().is_some_and(|op| op.epoch == epoch) {
                guard.current.take()
            } else {
                None
            }
        };
        if let Some(op) = op {
            op.finish(Err(ClientError::Timeout));
        }
    })
}

// =============================================================================
// Serialized queue
// =============================================================================

struct QueuedOp<T> {
    starter: BoxedStarter,
    waiter: oneshot::Sender<Settled<T>>,
    timeout: Duration,
}

struct SerialInner<T> {
    current: Option<PendingOp<T>>,
    queue: VecDeque<QueuedOp<T>>,
    next_epoch: u64,
}

/// A channel that runs operations strictly one at a time, in order.
pub struct SerialQueue<T> {
    inner: Arc<Mutex<SerialInner<T>>>,
}

impl<T> Clone for SerialQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for SerialQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> SerialQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SerialInner {
                current: None,
                queue: VecDeque::new(),
                next_epoch: 0,
            })),
        }
    }

    /// Enqueue an operation and await its result.
    ///
    /// The starter runs when the operation reaches the head of the queue and
    /// the previous one has settled; its timeout is armed at that moment,
    /// not at submission.
    pub async fn submit<F>(&self, starter: F, timeout: Duration) -> Result<T, ClientError>
    where
        F: FnOnce() -> Result<(), ClientError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock().await;
            inner.queue.push_back(QueuedOp {
                starter: Box::new(starter),
                waiter: tx,
                timeout,
            });
            Self::drain(&self.inner, &mut inner);
        }
        rx.await.map_err(|_| ClientError::Cancelled)?
    }

    /// Advance the queue: a present `current` is still unsettled (settlement
    /// always removes it), so the head keeps running; otherwise start the
    /// next queued operation. A starter that fails settles its operation
    /// immediately and the queue keeps advancing.
    fn drain(handle: &Arc<Mutex<SerialInner<T>>>, inner: &mut SerialInner<T>) {
        if inner.current.is_some() {
            return;
        }
        while let Some(next) = inner.queue.pop_front() {
            inner.next_epoch += 1;
            let mut op = PendingOp::new(inner.next_epoch);
            op.waiters.push(next.waiter);
            match (next.starter)() {
                Ok(()) => {
                    if !next.timeout.is_zero() {
                        op.timer = Some(spawn_serial_timer(
                            Arc::clone(handle),
                            op.epoch,
                            next.timeout,
                        ));
                    }
                    inner.current = Some(op);
                    return;
                }
                Err(error) => op.finish(Err(error)),
            }
        }
    }

    pub async fn resolve(&self, value: T) {
        self.settle(Ok(value)).await;
    }

    pub async fn reject(&self, error: ClientError) {
        self.settle(Err(error)).await;
    }

    /// Settle the running operation; every settlement re-triggers the drain
    /// so the queue advances itself.
    async fn settle(&self, result: Settled<T>) {
        let op = {
            let mut inner = self.inner.lock().await;
            let op = inner.current.take();
            Self::drain(&self.inner, &mut inner);
            op
        };
        if let Some(op) = op {
            op.finish(result);
        }
    }

    /// Abandon queued-but-unstarted operations, then cancel the running one.
    pub async fn cancel(&self) {
        let op = {
            let mut inner = self.inner.lock().await;
            inner.queue.clear();
            inner.current.take()
        };
        if let Some(op) = op {
            op.finish(Err(ClientError::Cancelled));
        }
    }
}

fn spawn_serial_timer<T: Clone + Send + 'static>(
    inner: Arc<Mutex<SerialInner<T>>>,
    epoch: u64,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let op = {
            let mut guard = inner.lock().await;
            if guard.current.as_ref().is_some_and(|op| op.epoch == epoch) {
                let op = guard.current.take();
                SerialQueue::drain(&inner, &mut guard);
                op
            } else {
                None
            }
        };
        if let Some(op) = op {
            op.finish(Err(ClientError::Timeout));
        }
    })
}

// =============================================================================
// Serialized queues keyed by entity
// =============================================================================

/// Per-entity serialized channels for one operation kind.
pub struct SerialGroup<T> {
    queues: Arc<Mutex<HashMap<u64, SerialQueue<T>>>>,
}

impl<T> Clone for SerialGroup<T> {
    fn clone(&self) -> Self {
        Self {
            queues: Arc::clone(&self.queues),
        }
    }
}

impl<T: Clone + Send + 'static> Default for SerialGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> SerialGroup<T> {
    pub fn new() -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn queue(&self, key: u64) -> SerialQueue<T> {
        self.queues
            .lock()
            .await
            .entry(key)
            .or_insert_with(SerialQueue::new)
            .clone()
    }

    pub async fn submit<F>(&self, key: u64, starter: F, timeout: Duration) -> Result<T, ClientError>
    where
        F: FnOnce() -> Result<(), ClientError> + Send + 'static,
    {
        self.queue(key).await.submit(starter, timeout).await
    }

    /// Resolve the entity's running operation; an answer for an entity with
    /// no queue (late or unmatched) is ignored.
    pub async fn resolve(&self, key: u64, value: T) {
        let queue = self.queues.lock().await.get(&key).cloned();
        if let Some(queue) = queue {
            queue.resolve(value).await;
        }
    }

    pub async fn reject(&self, key: u64, error: ClientError) {
        let queue = self.queues.lock().await.get(&key).cloned();
        if let Some(queue) = queue {
            queue.reject(error).await;
        }
    }

    /// Reject the running operation of every entity's queue.
    ///
    /// Error frames carry only the command tag, so a failure cannot be pinned
    /// to one entity; treating every in-flight action of the kind as failed
    /// is the conservative reading.
    pub async fn reject_all(&self, error: ClientError) {
        let queues: Vec<SerialQueue<T>> = self.queues.lock().await.values().cloned().collect();
        for queue in queues {
            queue.reject(error.clone()).await;
        }
    }

    pub async fn cancel_all(&self) {
        let queues: Vec<SerialQueue<T>> = self.queues.lock().await.values().cloned().collect();
        for queue in queues {
            queue.cancel().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn unique_submissions_coalesce_onto_one_request() {
        let slot = UniqueSlot::<u32>::new();
        let starts = Arc::new(AtomicU32::new(0));

        let spawn_submit = |slot: UniqueSlot<u32>, starts: Arc<AtomicU32>| {
            tokio::spawn(async move {
                slot.submit(
                    move || {
                        starts.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    },
                    Duration::ZERO,
                )
                .await
            })
        };

        let first = spawn_submit(slot.clone(), Arc::clone(&starts));
        let second = spawn_submit(slot.clone(), Arc::clone(&starts));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        slot.resolve(7).await;
        assert_eq!(first.await.expect("task"), Ok(7));
        assert_eq!(second.await.expect("task"), Ok(7));

        // The slot cleared on settlement: a new submission starts fresh.
        let third = spawn_submit(slot.clone(), Arc::clone(&starts));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        slot.reject(ClientError::ConnectionLost).await;
        assert_eq!(third.await.expect("task"), Err(ClientError::ConnectionLost));
    }

    #[tokio::test]
    async fn serialized_starters_run_one_at_a_time_in_order() {
        let queue = SerialQueue::<u32>::new();
        let log = Arc::new(StdMutex::new(Vec::new()));

        let starter = |log: Arc<StdMutex<Vec<u32>>>, n: u32| {
            move || {
                log.lock().expect("not poisoned").push(n);
                Ok(())
            }
        };

        let (r1, r2, r3, ()) = tokio::join!(
            queue.submit(starter(Arc::clone(&log), 1), Duration::ZERO),
            queue.submit(starter(Arc::clone(&log), 2), Duration::ZERO),
            queue.submit(starter(Arc::clone(&log), 3), Duration::ZERO),
            async {
                for (expected, value) in [(vec![1], 101), (vec![1, 2], 102), (vec![1, 2, 3], 103)]
                {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    assert_eq!(*log.lock().expect("not poisoned"), expected);
                    queue.resolve(value).await;
                }
            }
        );

        assert_eq!(r1, Ok(101));
        assert_eq!(r2, Ok(102));
        assert_eq!(r3, Ok(103));
    }

    #[tokio::test]
    async fn serialized_rejection_advances_the_queue() {
        let queue = SerialQueue::<u32>::new();
        let starts = Arc::new(AtomicU32::new(0));

        let starter = |starts: Arc<AtomicU32>| {
            move || {
                starts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        let (r1, r2, ()) = tokio::join!(
            queue.submit(starter(Arc::clone(&starts)), Duration::ZERO),
            queue.submit(starter(Arc::clone(&starts)), Duration::ZERO),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                assert_eq!(starts.load(Ordering::SeqCst), 1);
                queue.reject(ClientError::ConnectionLost).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                assert_eq!(starts.load(Ordering::SeqCst), 2);
                queue.resolve(9).await;
            }
        );

        assert_eq!(r1, Err(ClientError::ConnectionLost));
        assert_eq!(r2, Ok(9));
    }

    #[tokio::test(start_paused = true)]
    async fn unsettled_operation_rejects_at_the_timeout() {
        let slot = UniqueSlot::<u32>::new();
        let result = slot.submit(|| Ok(()), Duration::from_secs(2)).await;
        assert_eq!(result, Err(ClientError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn settlement_cancels_the_timer() {
        let slot = UniqueSlot::<u32>::new();

        let (result, ()) = tokio::join!(slot.submit(|| Ok(()), Duration::from_secs(2)), async {
            slot.resolve(5).await;
        });
        assert_eq!(result, Ok(5));

        // A later operation without a timeout must not inherit a stale
        // rejection from the first operation's timer.
        let follow_up = slot.submit(|| Ok(()), Duration::ZERO);
        tokio::pin!(follow_up);
        let outcome = tokio::select! {
            r = &mut follow_up => Some(r),
            () = tokio::time::sleep(Duration::from_secs(5)) => None,
        };
        assert!(outcome.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn serial_timeout_rejects_and_advances() {
        let queue = SerialQueue::<u32>::new();
        let starts = Arc::new(AtomicU32::new(0));
        let starter = |starts: Arc<AtomicU32>| {
            move || {
                starts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        let (r1, r2) = tokio::join!(
            queue.submit(starter(Arc::clone(&starts)), Duration::from_secs(1)),
            async {
                // The second submission has no timeout; resolve it once the
                // first has timed out and its starter has run.
                let pending = queue.submit(starter(Arc::clone(&starts)), Duration::ZERO);
                tokio::pin!(pending);
                let () = tokio::select! {
                    _ = &mut pending => panic!("second op settled early"),
                    () = tokio::time::sleep(Duration::from_secs(2)) => {},
                };
                assert_eq!(starts.load(Ordering::SeqCst), 2);
                queue.resolve(11).await;
                pending.await
            }
        );

        assert_eq!(r1, Err(ClientError::Timeout));
        assert_eq!(r2, Ok(11));
    }

    #[tokio::test]
    async fn group_runs_entities_in_parallel() {
        let group = SerialGroup::<u32>::new();
        let starts = Arc::new(AtomicU32::new(0));
        let starter = |starts: Arc<AtomicU32>| {
            move || {
                starts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        let g1 = group.clone();
        let s1 = Arc::clone(&starts);
        let first = tokio::spawn(async move { g1.submit(1, starter(s1), Duration::ZERO).await });
        let g2 = group.clone();
        let s2 = Arc::clone(&starts);
        let second = tokio::spawn(async move { g2.submit(2, starter(s2), Duration::ZERO).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        // Both entities' starters ran without either settling first.
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        group.resolve(2, 22).await;
        group.resolve(1, 11).await;
        assert_eq!(first.await.expect("task"), Ok(11));
        assert_eq!(second.await.expect("task"), Ok(22));
    }

    #[tokio::test]
    async fn cancel_rejects_current_and_abandons_queued() {
        let queue = SerialQueue::<u32>::new();
        let queued_started = Arc::new(AtomicU32::new(0));

        let q1 = queue.clone();
        let first = tokio::spawn(async move { q1.submit(|| Ok(()), Duration::ZERO).await });
        let q2 = queue.clone();
        let started = Arc::clone(&queued_started);
        let second = tokio::spawn(async move {
            q2.submit(
                move || {
                    started.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                Duration::ZERO,
            )
            .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.cancel().await;

        assert_eq!(first.await.expect("task"), Err(ClientError::Cancelled));
        assert_eq!(second.await.expect("task"), Err(ClientError::Cancelled));
        // The queued starter was never invoked.
        assert_eq!(queued_started.load(Ordering::SeqCst), 0);
    }
}
