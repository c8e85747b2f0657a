//! `InferenceClient` hides whether a game's predictions are served by a
//! model living in the same process or forwarded to a remote engine.

use crate::error::Error;
use crate::inference::engine::{InferenceEngine, ModelHandle};
use crate::inference::model::{validate_batch_shapes, validate_output, EncodedState, Output};

#[derive(Clone)]
pub enum InferenceClient {
    Local(ModelHandle),
    Remote(InferenceEngine),
}

impl InferenceClient {
    pub async fn predict(&self, state: EncodedState) -> Result<Output, Error> {
        match self {
            InferenceClient::Local(handle) => {
                let guard = handle.read().await;
                let shape = guard.shape().clone();
                validate_batch_shapes(std::slice::from_ref(&state), &shape.input_shape)?;
                let outputs = guard.predict_batch(std::slice::from_ref(&state))?;
                let output = outputs.into_iter().next().ok_or_else(|| {
                    Error::ModelError("model returned no output for single-item batch".to_string())
                })?;
                validate_output(&output, shape.output_len)?;
                Ok(output)
            }
            InferenceClient::Remote(engine) => engine.submit(state).await,
        }
    }
}
