//! Thread pool of game workers. Built directly on `WorkerPool`: each
//! worker thread's private state is a `GameWorkerContext`, and playing a
//! game is just that pool's request/response contract.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

use crate::error::Error;
use crate::game::experience::TrainingExample;
use crate::game::worker::{play_game, GameConfig, GameResult, GameWorkerContext, Simulator};
use crate::inference::{InferenceClient, ModelHandle};
use crate::worker_pool::WorkerPool;

pub struct GamePool {
    pool: WorkerPool<GameConfig, GameResult, GameWorkerContext>,
    experience_rx: AsyncMutex<mpsc::Receiver<TrainingExample>>,
}

/// A worker thread's simulator and (optional) heuristic ranking closure,
/// built together so a heuristic can share live per-turn state with the
/// simulator that drives it (see `quoridor::QuoridorSimulator::components`).
pub struct GameWorkerComponents {
    pub simulator: Rc<dyn Simulator>,
    pub heuristic: Option<Rc<dyn Fn(&[u8]) -> Vec<u8>>>,
}

impl GamePool {
    /// `components_factory` runs once per worker thread, building that
    /// thread's own `Rc`-based simulator/heuristic pair locally (neither
    /// needs to be `Send`).
    pub fn new<F>(n_threads: usize, parallelism_per_thread: usize, components_factory: F, experience_buffer: usize) -> Self
    where
        F: Fn() -> GameWorkerComponents + Send + Sync + 'static,
    {
        let (experience_tx, experience_rx) = mpsc::channel(experience_buffer);
        let components_factory = std::sync::Arc::new(components_factory);
        let pool = WorkerPool::new(
            n_threads,
            parallelism_per_thread,
            {
                let experience_tx = experience_tx.clone();
                let components_factory = components_factory.clone();
                move |_thread_idx| {
                    let components = components_factory();
                    GameWorkerContext {
                        models: std::collections::HashMap::new(),
                        heuristic: components.heuristic,
                        simulator: components.simulator,
                        experience_tx: experience_tx.clone(),
                    }
                }
            },
            |state, config: GameConfig| play_game(state, config),
        );
        GamePool { pool, experience_rx: AsyncMutex::new(experience_rx) }
    }

    /// Broadcast a remote model client, reachable by `name`, to every worker.
    pub async fn register_model_port(&self, name: String, client: InferenceClient) -> Result<(), Error> {
        self.pool
            .map_async(move |state| {
                let name = name.clone();
                let client = client.clone();
                async move {
                    state.borrow_mut().models.insert(name, client);
                }
            })
            .await
    }

    /// Broadcast a model that lives directly in every worker's process
    /// (no batching engine in front of it).
    pub async fn load_local_model(&self, name: String, handle: ModelHandle) -> Result<(), Error> {
        self.register_model_port(name, InferenceClient::Local(handle)).await
    }

    pub async fn add(&self, config: GameConfig) -> Result<GameResult, Error> {
        let port = self.pool.take_port().await?;
        let result = port.call(config).await;
        self.pool.give_port(port).await;
        result
    }

    /// Pull the next piece of experience, or `None` once the pool is closed
    /// and drained.
    pub async fn collect_experience(&self) -> Option<TrainingExample> {
        let mut rx = self.experience_rx.lock().await;
        rx.recv().await
    }

    /// Non-blocking drain of whatever experience is already buffered.
    pub async fn try_collect_experience(&self) -> Option<TrainingExample> {
        let mut rx = self.experience_rx.lock().await;
        rx.try_recv().ok()
    }

    pub fn close(&self) {
        self.pool.close();
    }

    pub fn terminate(&self) {
        self.pool.terminate();
    }

    pub fn port_count(&self) -> usize {
        self.pool.port_count()
    }
}
