//! Holds named models, owns per-model inference profiles, and serializes
//! weight swaps against in-flight batches.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Error;
use crate::inference::engine::{BatchPredictProfile, InferenceEngine, ModelHandle};
use crate::inference::model::Model;
use crate::metrics::Scope;

struct ModelEntry {
    handle: ModelHandle,
    profiles: HashMap<String, InferenceEngine>,
}

pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelEntry>>,
    metrics: Scope,
}

impl ModelRegistry {
    pub fn new(metrics: Scope) -> Self {
        ModelRegistry { models: RwLock::new(HashMap::new()), metrics }
    }

    pub async fn load(&self, name: &str, model: Box<dyn Model>) -> Result<(), Error> {
        let mut models = self.models.write().await;
        if models.contains_key(name) {
            return Err(Error::ProtocolError(format!("model {name} already loaded")));
        }
        models.insert(
            name.to_string(),
            ModelEntry { handle: Arc::new(RwLock::new(model)), profiles: HashMap::new() },
        );
        Ok(())
    }

    pub async fn unload(&self, name: &str) -> Result<(), Error> {
        let mut models = self.models.write().await;
        let entry = models
            .remove(name)
            .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))?;
        for (_, engine) in entry.profiles {
            engine.close().await;
        }
        Ok(())
    }

    pub async fn configure(
        &self,
        name: &str,
        profile_name: &str,
        config: BatchPredictProfile,
    ) -> Result<(), Error> {
        let mut models = self.models.write().await;
        let entry = models
            .get_mut(name)
            .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))?;
        if entry.profiles.contains_key(profile_name) {
            return Err(Error::ProtocolError(format!("profile {profile_name} already configured")));
        }
        let scope = self.metrics.child(name).child(profile_name);
        let engine = InferenceEngine::spawn(entry.handle.clone(), config, scope);
        entry.profiles.insert(profile_name.to_string(), engine);
        Ok(())
    }

    pub async fn deconfigure(&self, name: &str, profile_name: &str) -> Result<(), Error> {
        let mut models = self.models.write().await;
        let entry = models
            .get_mut(name)
            .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))?;
        let engine = entry
            .profiles
            .remove(profile_name)
            .ok_or_else(|| Error::ProtocolError(format!("unknown profile {profile_name}")))?;
        engine.close().await;
        Ok(())
    }

    pub async fn subscribe(&self, name: &str, profile_name: &str) -> Result<InferenceEngine, Error> {
        let models = self.models.read().await;
        let entry = models
            .get(name)
            .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))?;
        entry
            .profiles
            .get(profile_name)
            .cloned()
            .ok_or_else(|| Error::ProtocolError(format!("unknown profile {profile_name}")))
    }

    pub async fn local_handle(&self, name: &str) -> Result<ModelHandle, Error> {
        let models = self.models.read().await;
        models
            .get(name)
            .map(|e| e.handle.clone())
            .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))
    }

    /// Blocks until no batch is in flight for `name`, then replaces its
    /// weights. No profile observes a partial swap.
    pub async fn swap_weights(&self, name: &str, snapshot: &[u8]) -> Result<(), Error> {
        let handle = self.local_handle(name).await?;
        let mut guard = handle.write().await;
        guard.load_weights(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::{EncodedState, ModelShape, Output};
    use std::time::Duration;

    struct ConstModel {
        shape: ModelShape,
        value: f32,
    }

    impl Model for ConstModel {
        fn shape(&self) -> &ModelShape {
            &self.shape
        }
        fn predict_batch(&self, inputs: &[EncodedState]) -> Result<Vec<Output>, Error> {
            Ok(inputs.iter().map(|_| Output(vec![self.value])).collect())
        }
        fn snapshot(&self) -> Vec<u8> {
            self.value.to_le_bytes().to_vec()
        }
        fn load_weights(&mut self, snapshot: &[u8]) -> Result<(), Error> {
            self.value = f32::from_le_bytes(snapshot.try_into().unwrap());
            Ok(())
        }
    }

    #[tokio::test]
    async fn swap_weights_is_observed_by_subsequent_batches() {
        let registry = ModelRegistry::new(crate::metrics::Metrics::new().scope("test"));
        let model = ConstModel { shape: ModelShape { input_shape: vec![1], output_len: 1 }, value: 1.0 };
        registry.load("m", Box::new(model)).await.unwrap();
        registry
            .configure("m", "default", BatchPredictProfile::new(1, Duration::from_millis(10)))
            .await
            .unwrap();
        let engine = registry.subscribe("m", "default").await.unwrap();

        let before = engine.submit(EncodedState::new(vec![0.0], vec![1])).await.unwrap();
        assert_eq!(before.0, vec![1.0]);

        registry.swap_weights("m", &2.0f32.to_le_bytes()).await.unwrap();

        let after = engine.submit(EncodedState::new(vec![0.0], vec![1])).await.unwrap();
        assert_eq!(after.0, vec![2.0]);
    }
}
