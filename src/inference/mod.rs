pub mod client;
pub mod engine;
pub mod model;
pub mod registry;

pub use client::InferenceClient;
pub use engine::{BatchPredictProfile, InferenceEngine, ModelHandle};
pub use model::{EncodedState, Model, ModelShape, Output, TrainSample};
pub use registry::ModelRegistry;
