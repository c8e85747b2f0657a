//! The learner is external to the orchestration core; this module only
//! fixes its control interface and progress events, per spec.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub algorithm_variant: String,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Start { num_batches: usize },
    Batch { index: usize, loss: f32 },
    Epoch { index: usize, loss: f32 },
}

#[async_trait]
pub trait Trainer: Send + Sync {
    async fn train(
        &self,
        model_name: &str,
        config: TrainingConfig,
        example_paths: &[PathBuf],
        on_progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), Error>;
}
