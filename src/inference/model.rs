//! Backend-agnostic model contract.
//!
//! Grounded in the teacher's `PolicyValueNet` trait (`nn_bot.rs`): a
//! batched predict entry point plus an optional training step, kept
//! trait-object friendly so the registry can hold heterogeneous models.

use crate::error::Error;

/// A fixed-shape input tensor, flattened row-major. The `shape` records the
/// per-dimension sizes so the engine can validate and re-stack batches.
#[derive(Debug, Clone)]
pub struct EncodedState {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl EncodedState {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        EncodedState { data, shape }
    }

    pub fn shape_matches(&self, expected: &[usize]) -> bool {
        self.shape == expected
    }
}

/// A model's raw output vector for one input (e.g. per-action logits).
#[derive(Debug, Clone)]
pub struct Output(pub Vec<f32>);

impl Output {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> f32 {
        self.0[idx]
    }
}

/// A single `(state, choices, action, reward)` training sample.
#[derive(Debug, Clone)]
pub struct TrainSample {
    pub state: EncodedState,
    pub target: Vec<f32>,
    pub value: f32,
}

/// Declared input/output shapes a model will accept and produce. Immutable
/// for the lifetime of the model; only weights may change via `load_weights`.
#[derive(Debug, Clone)]
pub struct ModelShape {
    pub input_shape: Vec<usize>,
    pub output_len: usize,
}

/// An opaque, swappable model. Implementations own their own weights and
/// device placement; the engine only ever calls `predict_batch`.
pub trait Model: Send + Sync {
    fn shape(&self) -> &ModelShape;

    /// Evaluate a batch. `inputs.len()` is the batch size; the returned
    /// vector has the same length, one `Output` per input, in order.
    fn predict_batch(&self, inputs: &[EncodedState]) -> Result<Vec<Output>, Error>;

    /// Optional training step; default is a no-op returning zero loss,
    /// matching the teacher's default `train_step` body.
    fn train_step(&mut self, _batch: &[TrainSample]) -> Result<f32, Error> {
        Ok(0.0)
    }

    /// Serialize current weights for `ModelRegistry::swap_weights`.
    fn snapshot(&self) -> Vec<u8>;

    /// Replace weights in place from a snapshot produced by `snapshot`.
    fn load_weights(&mut self, snapshot: &[u8]) -> Result<(), Error>;
}

pub fn validate_batch_shapes(inputs: &[EncodedState], expected: &[usize]) -> Result<(), Error> {
    for input in inputs {
        if !input.shape_matches(expected) {
            return Err(Error::Shape { expected: expected.to_vec(), got: input.shape.clone() });
        }
        if input.data.iter().any(|v| v.is_nan()) {
            return Err(Error::Value("input contains NaN".to_string()));
        }
    }
    Ok(())
}

pub fn validate_output(output: &Output, expected_len: usize) -> Result<(), Error> {
    if output.len() != expected_len {
        return Err(Error::Shape { expected: vec![expected_len], got: vec![output.len()] });
    }
    if output.0.iter().any(|v| !v.is_finite()) {
        return Err(Error::Value("output contains non-finite value".to_string()));
    }
    Ok(())
}
