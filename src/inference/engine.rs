//! Per-model batching server.
//!
//! One cooperative task owns the current batch, the wait timer, and the
//! "at most one execution in flight" invariant; `submit` posts requests to
//! it over a bounded channel so a full batch with an execution already
//! running creates real backpressure on callers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::Instant as TokioInstant;

use crate::error::Error;
use crate::inference::model::{validate_batch_shapes, validate_output, EncodedState, Model, Output};
use crate::metrics::Scope;

#[derive(Debug, Clone)]
pub struct BatchPredictProfile {
    pub max_batch_size: usize,
    pub max_wait: Duration,
}

impl BatchPredictProfile {
    pub fn new(max_batch_size: usize, max_wait: Duration) -> Self {
        assert!(max_batch_size > 0, "max_batch_size must be positive");
        BatchPredictProfile { max_batch_size, max_wait }
    }
}

pub type ModelHandle = Arc<RwLock<Box<dyn Model>>>;

struct PendingRequest {
    input: EncodedState,
    reply: oneshot::Sender<Result<Output, Error>>,
}

enum EngineMsg {
    Submit(PendingRequest),
    Shutdown,
}

/// A running batching server for one model. Cloning shares the same
/// background task and queue.
#[derive(Clone)]
pub struct InferenceEngine {
    tx: mpsc::Sender<EngineMsg>,
}

impl InferenceEngine {
    pub fn spawn(model: ModelHandle, profile: BatchPredictProfile, metrics: Scope) -> Self {
        let (tx, rx) = mpsc::channel(profile.max_batch_size.max(1));
        tokio::spawn(run_engine(model, profile, rx, metrics));
        InferenceEngine { tx }
    }

    /// Submit one input for batched prediction. Resolves once this
    /// request's batch has executed, or with an error.
    pub async fn submit(&self, input: EncodedState) -> Result<Output, Error> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineMsg::Submit(PendingRequest { input, reply: reply_tx }))
            .await
            .map_err(|_| Error::Overloaded)?;
        reply_rx.await.map_err(|_| Error::Overloaded)?
    }

    pub async fn close(&self) {
        let _ = self.tx.send(EngineMsg::Shutdown).await;
    }
}

async fn run_engine(
    model: ModelHandle,
    profile: BatchPredictProfile,
    mut rx: mpsc::Receiver<EngineMsg>,
    metrics: Scope,
) {
    let mut current: Vec<PendingRequest> = Vec::with_capacity(profile.max_batch_size);
    let mut in_flight = false;
    let mut timer_armed = false;
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

    let sleep = tokio::time::sleep(Duration::from_secs(3600));
    tokio::pin!(sleep);

    loop {
        let can_accept = current.len() < profile.max_batch_size || !in_flight;

        tokio::select! {
            biased;

            Some(()) = done_rx.recv() => {
                in_flight = false;
                if !current.is_empty() {
                    let batch = std::mem::take(&mut current);
                    timer_armed = false;
                    in_flight = true;
                    execute_batch(model.clone(), batch, done_tx.clone(), metrics.clone());
                }
            }

            () = &mut sleep, if timer_armed && can_accept => {
                timer_armed = false;
                if !current.is_empty() && !in_flight {
                    let batch = std::mem::take(&mut current);
                    in_flight = true;
                    execute_batch(model.clone(), batch, done_tx.clone(), metrics.clone());
                }
            }

            maybe = rx.recv(), if can_accept => {
                match maybe {
                    Some(EngineMsg::Submit(req)) => {
                        metrics.incr("requests_admitted", 1);
                        current.push(req);
                        if current.len() >= profile.max_batch_size {
                            if !in_flight {
                                let batch = std::mem::take(&mut current);
                                timer_armed = false;
                                in_flight = true;
                                execute_batch(model.clone(), batch, done_tx.clone(), metrics.clone());
                            }
                        } else if current.len() == 1 && !timer_armed {
                            sleep.as_mut().reset(TokioInstant::now() + profile.max_wait);
                            timer_armed = true;
                        }
                    }
                    Some(EngineMsg::Shutdown) | None => {
                        for pending in current.drain(..) {
                            let _ = pending.reply.send(Err(Error::Overloaded));
                        }
                        return;
                    }
                }
            }
        }
    }
}

fn execute_batch(
    model: ModelHandle,
    batch: Vec<PendingRequest>,
    done_tx: mpsc::UnboundedSender<()>,
    metrics: Scope,
) {
    tokio::spawn(async move {
        metrics.observe("batch_size", batch.len() as f64);
        let _timer = metrics.timer("batch_latency_ms");
        let inputs: Vec<EncodedState> = batch.iter().map(|p| p.input.clone()).collect();

        let result = {
            let guard = model.read().await;
            let shape = guard.shape().clone();
            if let Err(e) = validate_batch_shapes(&inputs, &shape.input_shape) {
                Err(e)
            } else {
                guard.predict_batch(&inputs).and_then(|outputs| {
                    for out in &outputs {
                        validate_output(out, shape.output_len)?;
                    }
                    Ok(outputs)
                })
            }
        };

        match result {
            Ok(outputs) => {
                for (pending, output) in batch.into_iter().zip(outputs.into_iter()) {
                    let _ = pending.reply.send(Ok(output));
                }
            }
            Err(e) => {
                for pending in batch.into_iter() {
                    let _ = pending.reply.send(Err(e.clone()));
                }
            }
        }
        let _ = done_tx.send(());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::ModelShape;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoModel {
        shape: ModelShape,
        calls: AtomicUsize,
    }

    impl Model for EchoModel {
        fn shape(&self) -> &ModelShape {
            &self.shape
        }

        fn predict_batch(&self, inputs: &[EncodedState]) -> Result<Vec<Output>, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs.iter().map(|i| Output(vec![i.data[0]])).collect())
        }

        fn snapshot(&self) -> Vec<u8> {
            vec![]
        }

        fn load_weights(&mut self, _snapshot: &[u8]) -> Result<(), Error> {
            Ok(())
        }
    }

    fn make_model() -> ModelHandle {
        Arc::new(RwLock::new(Box::new(EchoModel {
            shape: ModelShape { input_shape: vec![1], output_len: 1 },
            calls: AtomicUsize::new(0),
        })))
    }

    #[tokio::test(start_paused = true)]
    async fn batch_forms_by_size() {
        let model = make_model();
        let profile = BatchPredictProfile::new(4, Duration::from_millis(100));
        let engine = InferenceEngine::spawn(model, profile, crate::metrics::Metrics::new().scope("test"));

        let mut handles = Vec::new();
        for i in 0..4 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.submit(EncodedState::new(vec![i as f32], vec![1])).await
            }));
        }
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap().unwrap());
        }
        assert_eq!(results.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_forms_by_timeout() {
        let model = make_model();
        let profile = BatchPredictProfile::new(4, Duration::from_millis(100));
        let engine = InferenceEngine::spawn(model, profile, crate::metrics::Metrics::new().scope("test"));

        let e1 = engine.clone();
        let h1 = tokio::spawn(async move { e1.submit(EncodedState::new(vec![1.0], vec![1])).await });
        tokio::time::advance(Duration::from_millis(10)).await;
        let e2 = engine.clone();
        let h2 = tokio::spawn(async move { e2.submit(EncodedState::new(vec![2.0], vec![1])).await });

        tokio::time::advance(Duration::from_millis(150)).await;

        assert_eq!(h1.await.unwrap().unwrap().0, vec![1.0]);
        assert_eq!(h2.await.unwrap().unwrap().0, vec![2.0]);
    }
}
