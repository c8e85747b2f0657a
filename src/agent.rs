//! Converts `(state, legal choices)` into a best-first ranked choice list.
//!
//! Mirrors the teacher's `GameAdapter::get_move` (`nn_bot.rs`), generalized
//! so the ranking policy (model, random, or a domain heuristic) is supplied
//! by whoever wires up the game rather than hardcoded to one game.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Error;
use crate::inference::{EncodedState, InferenceClient};

/// How an agent picks among legal choices before exploration is applied.
pub enum ExploitMode {
    /// Rank choices by the model's per-choice output, best first.
    Model(InferenceClient),
    /// Shuffle choices uniformly at random.
    Random,
    /// Defer to a domain-specific heuristic (e.g. the quoridor alpha-beta
    /// search) that returns choices already ranked best first.
    Heuristic(Rc<dyn Fn(&[u8]) -> Vec<u8>>),
}

pub struct ExploreConfig {
    pub factor: f32,
}

pub struct AgentConfig {
    pub name: String,
    pub exploit: ExploitMode,
    pub explore: Option<ExploreConfig>,
    /// When set, a Random exploit mode partitions choices classified `true`
    /// (e.g. "move" actions) ahead of the rest, preserving relative order
    /// within each group.
    pub move_classifier: Option<Rc<dyn Fn(u8) -> bool>>,
    pub emit_experience: bool,
    pub seed: Option<u64>,
}

pub struct Agent {
    pub name: String,
    exploit: ExploitMode,
    explore: Option<ExploreConfig>,
    move_classifier: Option<Rc<dyn Fn(u8) -> bool>>,
    pub emit_experience: bool,
    rng: StdRng,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Agent {
            name: config.name,
            exploit: config.exploit,
            explore: config.explore,
            move_classifier: config.move_classifier,
            emit_experience: config.emit_experience,
            rng,
        }
    }

    /// Rank `choices` best-first. `state` is only consulted by the `Model`
    /// exploit mode.
    pub async fn rank_choices(&mut self, state: &EncodedState, choices: &[u8]) -> Result<Vec<u8>, Error> {
        let mut ranked = match &self.exploit {
            ExploitMode::Model(client) => {
                let output = client.predict(state.clone()).await?;
                let mut scored: Vec<(u8, f32)> = choices
                    .iter()
                    .map(|&c| (c, output.get(c as usize)))
                    .collect();
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                scored.into_iter().map(|(c, _)| c).collect()
            }
            ExploitMode::Random => self.shuffled(choices),
            ExploitMode::Heuristic(rank_fn) => rank_fn(choices),
        };

        if let Some(explore) = &self.explore {
            if self.rng.random::<f32>() < explore.factor {
                ranked.shuffle(&mut self.rng);
            }
        }
        Ok(ranked)
    }

    fn shuffled(&mut self, choices: &[u8]) -> Vec<u8> {
        if let Some(classifier) = &self.move_classifier {
            let (mut moves, mut switches): (Vec<u8>, Vec<u8>) =
                choices.iter().copied().partition(|c| classifier(*c));
            moves.shuffle(&mut self.rng);
            switches.shuffle(&mut self.rng);
            moves.extend(switches);
            moves
        } else {
            let mut v = choices.to_vec();
            v.shuffle(&mut self.rng);
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn model_mode_ranks_best_choice_first() {
        struct FakeModel;
        impl crate::inference::Model for FakeModel {
            fn shape(&self) -> &crate::inference::ModelShape {
                static SHAPE: std::sync::OnceLock<crate::inference::ModelShape> = std::sync::OnceLock::new();
                SHAPE.get_or_init(|| crate::inference::ModelShape { input_shape: vec![1], output_len: 3 })
            }
            fn predict_batch(&self, inputs: &[EncodedState]) -> Result<Vec<crate::inference::Output>, Error> {
                Ok(inputs.iter().map(|_| crate::inference::Output(vec![0.1, 0.9, 0.5])).collect())
            }
            fn snapshot(&self) -> Vec<u8> {
                vec![]
            }
            fn load_weights(&mut self, _s: &[u8]) -> Result<(), Error> {
                Ok(())
            }
        }
        let handle = std::sync::Arc::new(tokio::sync::RwLock::new(Box::new(FakeModel) as Box<dyn crate::inference::Model>));
        let mut agent = Agent::new(AgentConfig {
            name: "a".into(),
            exploit: ExploitMode::Model(InferenceClient::Local(handle)),
            explore: None,
            move_classifier: None,
            emit_experience: false,
            seed: Some(1),
        });
        let state = EncodedState::new(vec![0.0], vec![1]);
        let ranked = agent.rank_choices(&state, &[0, 1, 2]).await.unwrap();
        assert_eq!(ranked, vec![1, 2, 0]);
    }

    #[tokio::test]
    async fn random_mode_prioritizes_move_choices() {
        let mut agent = Agent::new(AgentConfig {
            name: "r".into(),
            exploit: ExploitMode::Random,
            explore: None,
            move_classifier: Some(Rc::new(|c: u8| c < 10)),
            emit_experience: false,
            seed: Some(42),
        });
        let state = EncodedState::new(vec![], vec![]);
        let ranked = agent.rank_choices(&state, &[20, 1, 21, 2]).await.unwrap();
        let split = ranked.iter().position(|&c| c >= 10).unwrap();
        assert!(ranked[..split].iter().all(|&c| c < 10));
        assert!(ranked[split..].iter().all(|&c| c >= 10));
    }
}
