//! Generic pool of OS threads, each running a single-threaded cooperative
//! scheduler hosting up to `parallelism_per_thread` concurrent logical
//! ports. Callers borrow a port with `take_port`, use it, and return it
//! with `give_port`; a crashed worker's ports are marked errored so a
//! delayed `give_port` is absorbed rather than re-offered. `map_async`
//! bypasses the free/taken discipline to broadcast a closure to every
//! worker's private state (used to push a new model onto every game
//! worker without routing it through the port protocol).
//!
//! Grounded in the worker-thread-plus-bounded-channel shape used by
//! `other_examples`'s `alpha-tak` batch player: a fixed number of threads
//! each pull work off a channel and reply on a per-request sender.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Notify};

use crate::error::Error;

pub type PortId = u64;

type LocalBoxFuture = Pin<Box<dyn Future<Output = ()>>>;

struct PortRequest<Req, Resp> {
    req: Req,
    reply: oneshot::Sender<Result<Resp, Error>>,
}

/// A handle to one logical slot on a worker thread.
pub struct WorkerPort<Req, Resp> {
    id: PortId,
    tx: mpsc::Sender<PortRequest<Req, Resp>>,
    errored: Arc<AtomicBool>,
}

impl<Req, Resp> Clone for WorkerPort<Req, Resp> {
    fn clone(&self) -> Self {
        WorkerPort { id: self.id, tx: self.tx.clone(), errored: self.errored.clone() }
    }
}

impl<Req, Resp> WorkerPort<Req, Resp> {
    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn is_errored(&self) -> bool {
        self.errored.load(Ordering::Acquire)
    }

    /// Send a request to this port's worker and await the response.
    pub async fn call(&self, req: Req) -> Result<Resp, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PortRequest { req, reply: reply_tx })
            .await
            .map_err(|_| Error::WorkerCrashed(format!("port {} channel closed", self.id)))?;
        reply_rx
            .await
            .map_err(|_| Error::WorkerCrashed(format!("port {} dropped without reply", self.id)))?
    }
}

struct FreeList<Req, Resp> {
    queue: AsyncMutex<VecDeque<WorkerPort<Req, Resp>>>,
    notify: Notify,
}

/// `N` worker threads, each offering `parallelism_per_thread` logical ports
/// and a private state `S`.
pub struct WorkerPool<Req, Resp, S> {
    free: Arc<FreeList<Req, Resp>>,
    all_ports: Vec<WorkerPort<Req, Resp>>,
    broadcast_txs: Vec<mpsc::UnboundedSender<Box<dyn FnOnce(Rc<RefCell<S>>) -> LocalBoxFuture + Send>>>,
    closed: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    threads: Vec<std::thread::JoinHandle<()>>,
}

impl<Req, Resp, S> WorkerPool<Req, Resp, S>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    S: 'static,
{
    /// `make_state` builds each thread's private state once; `handle` is
    /// called per request with a clone of that thread's `Rc<RefCell<S>>`
    /// and returns a future local to that thread (state is never `Send`
    /// across threads, only ever borrowed by one task at a time since a
    /// `LocalSet` schedules cooperatively).
    pub fn new<F, H, Fut>(n_threads: usize, parallelism_per_thread: usize, make_state: F, handle: H) -> Self
    where
        F: Fn(usize) -> S + Send + Sync + 'static,
        H: Fn(Rc<RefCell<S>>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, Error>> + 'static,
    {
        let make_state = Arc::new(make_state);
        let handle = Arc::new(handle);
        let mut all_ports = Vec::with_capacity(n_threads * parallelism_per_thread);
        let mut threads = Vec::with_capacity(n_threads);
        let mut broadcast_txs = Vec::with_capacity(n_threads);
        let next_id = AtomicU64::new(0);

        for thread_idx in 0..n_threads {
            let mut txs = Vec::with_capacity(parallelism_per_thread);
            let mut rxs = Vec::with_capacity(parallelism_per_thread);
            let mut port_errs = Vec::with_capacity(parallelism_per_thread);
            for _ in 0..parallelism_per_thread {
                let (tx, rx) = mpsc::channel::<PortRequest<Req, Resp>>(32);
                txs.push(tx);
                rxs.push(rx);
                port_errs.push(Arc::new(AtomicBool::new(false)));
            }
            for (tx, errored) in txs.iter().zip(port_errs.iter()) {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                all_ports.push(WorkerPort { id, tx: tx.clone(), errored: errored.clone() });
            }

            let (broadcast_tx, mut broadcast_rx) =
                mpsc::unbounded_channel::<Box<dyn FnOnce(Rc<RefCell<S>>) -> LocalBoxFuture + Send>>();
            broadcast_txs.push(broadcast_tx);

            let make_state = make_state.clone();
            let handle = handle.clone();
            let handle_errs = port_errs.clone();
            threads.push(std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build worker runtime");
                let local = tokio::task::LocalSet::new();
                local.block_on(&runtime, async move {
                    let state = Rc::new(RefCell::new(make_state(thread_idx)));
                    let mut set = tokio::task::JoinSet::new();
                    for (mut rx, errored) in rxs.into_iter().zip(handle_errs.into_iter()) {
                        let handle = handle.clone();
                        let state = state.clone();
                        set.spawn_local(async move {
                            while let Some(PortRequest { req, reply }) = rx.recv().await {
                                let result = handle(state.clone(), req).await;
                                if result.is_err() {
                                    errored.store(true, Ordering::Release);
                                }
                                let _ = reply.send(result);
                            }
                        });
                    }
                    let broadcast_state = state.clone();
                    set.spawn_local(async move {
                        while let Some(job) = broadcast_rx.recv().await {
                            job(broadcast_state.clone()).await;
                        }
                    });
                    while set.join_next().await.is_some() {}
                });
            }));
        }

        WorkerPool {
            free: Arc::new(FreeList { queue: AsyncMutex::new(all_ports.clone().into()), notify: Notify::new() }),
            all_ports,
            broadcast_txs,
            closed: Arc::new(AtomicBool::new(false)),
            terminated: Arc::new(AtomicBool::new(false)),
            threads,
        }
    }

    pub async fn take_port(&self) -> Result<WorkerPort<Req, Resp>, Error> {
        loop {
            if self.terminated.load(Ordering::Acquire) {
                return Err(Error::Terminated);
            }
            {
                let mut q = self.free.queue.lock().await;
                while let Some(port) = q.pop_front() {
                    if !port.is_errored() {
                        return Ok(port);
                    }
                }
                if self.closed.load(Ordering::Acquire) {
                    return Err(Error::Terminated);
                }
            }
            self.free.notify.notified().await;
        }
    }

    pub async fn give_port(&self, port: WorkerPort<Req, Resp>) {
        let mut q = self.free.queue.lock().await;
        q.push_back(port);
        self.free.notify.notify_one();
    }

    pub fn port_count(&self) -> usize {
        self.all_ports.len()
    }

    /// Broadcast `f` to every worker's private state, bypassing the
    /// free/taken port discipline, and await every thread's completion.
    pub async fn map_async<F, Fut>(&self, f: F) -> Result<(), Error>
    where
        F: Fn(Rc<RefCell<S>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let f = Arc::new(f);
        let mut waiters = Vec::with_capacity(self.broadcast_txs.len());
        for tx in &self.broadcast_txs {
            let (done_tx, done_rx) = oneshot::channel::<()>();
            let f = f.clone();
            let job: Box<dyn FnOnce(Rc<RefCell<S>>) -> LocalBoxFuture + Send> = Box::new(move |state| {
                Box::pin(async move {
                    f(state).await;
                    let _ = done_tx.send(());
                })
            });
            tx.send(job).map_err(|_| Error::WorkerCrashed("broadcast channel closed".into()))?;
            waiters.push(done_rx);
        }
        for waiter in waiters {
            waiter.await.map_err(|_| Error::WorkerCrashed("worker dropped broadcast job".into()))?;
        }
        Ok(())
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.free.notify.notify_waiters();
    }

    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        self.free.notify.notify_waiters();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}

impl<Req, Resp, S> Drop for WorkerPool<Req, Resp, S> {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_and_give_port_round_trips() {
        let pool: WorkerPool<u32, u32, u32> = WorkerPool::new(1, 2, |_| 0u32, |state, req| async move {
            let mut s = state.borrow_mut();
            *s += req;
            Ok(*s)
        });
        assert_eq!(pool.port_count(), 2);
        let port = pool.take_port().await.unwrap();
        let resp = port.call(5).await.unwrap();
        assert_eq!(resp, 5);
        pool.give_port(port).await;
    }

    #[tokio::test]
    async fn terminate_fails_pending_take() {
        let pool: WorkerPool<u32, u32, u32> = WorkerPool::new(1, 1, |_| 0u32, |_, req| async move { Ok(req) });
        let port = pool.take_port().await.unwrap();
        pool.terminate();
        let err = pool.take_port().await.unwrap_err();
        assert!(matches!(err, Error::Terminated));
        drop(port);
    }

    #[tokio::test]
    async fn map_async_mutates_every_thread_state() {
        let pool: WorkerPool<u32, u32, u32> =
            WorkerPool::new(2, 1, |_| 0u32, |state, _req| async move { Ok(*state.borrow()) });
        pool.map_async(|state| async move {
            *state.borrow_mut() = 7;
        })
        .await
        .unwrap();
        for _ in 0..2 {
            let port = pool.take_port().await.unwrap();
            let v = port.call(0).await.unwrap();
            assert_eq!(v, 7);
            pool.give_port(port).await;
        }
    }
}
