//! Turns a per-decision trace into finalized `TrainingExample`s via
//! one-step lookback: each `add` reveals the `(action, reward)` that
//! completes the *previous* decision's transition.

use tokio::sync::mpsc;

use crate::error::Error;
use crate::inference::EncodedState;

#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub state: EncodedState,
    pub choices: Vec<u8>,
    pub action: u8,
    pub reward: f32,
    pub next_state: EncodedState,
    pub terminal: bool,
}

fn terminal_sentinel() -> EncodedState {
    EncodedState::new(Vec::new(), Vec::new())
}

pub struct ExperienceContext {
    sink: mpsc::Sender<TrainingExample>,
    pending: Option<(EncodedState, Vec<u8>)>,
}

impl ExperienceContext {
    pub fn new(sink: mpsc::Sender<TrainingExample>) -> Self {
        ExperienceContext { sink, pending: None }
    }

    /// Record a decision point. The first call in a game only seeds
    /// `pending` and emits nothing; `action`/`reward` describe the
    /// transition away from the *previous* pending state.
    pub async fn add(
        &mut self,
        state: EncodedState,
        choices: Vec<u8>,
        action: Option<u8>,
        reward: Option<f32>,
    ) -> Result<(), Error> {
        if let Some((prev_state, prev_choices)) = self.pending.take() {
            let example = TrainingExample {
                state: prev_state,
                choices: prev_choices,
                action: action.ok_or_else(|| Error::ProtocolError("missing action for non-initial add".into()))?,
                reward: reward.ok_or_else(|| Error::ProtocolError("missing reward for non-initial add".into()))?,
                next_state: state.clone(),
                terminal: false,
            };
            self.sink.send(example).await.map_err(|_| Error::Terminated)?;
        }
        self.pending = Some((state, choices));
        Ok(())
    }

    /// Emit the terminal example. Must be called exactly once per game.
    pub async fn finalize(&mut self, last_action: u8, final_reward: f32) -> Result<(), Error> {
        if let Some((prev_state, prev_choices)) = self.pending.take() {
            let example = TrainingExample {
                state: prev_state,
                choices: prev_choices,
                action: last_action,
                reward: final_reward,
                next_state: terminal_sentinel(),
                terminal: true,
            };
            self.sink.send(example).await.map_err(|_| Error::Terminated)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn k_adds_and_a_finalize_emit_k_examples() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut ctx = ExperienceContext::new(tx);
        let s = |v: f32| EncodedState::new(vec![v], vec![1]);

        ctx.add(s(0.0), vec![0, 1], None, None).await.unwrap();
        ctx.add(s(1.0), vec![0, 1], Some(0), Some(0.0)).await.unwrap();
        ctx.add(s(2.0), vec![0, 1], Some(1), Some(0.0)).await.unwrap();
        ctx.finalize(0, 1.0).await.unwrap();

        let mut examples = Vec::new();
        while let Ok(example) = rx.try_recv() {
            examples.push(example);
        }
        assert_eq!(examples.len(), 3);
        assert!(!examples[0].terminal);
        assert!(!examples[1].terminal);
        assert!(examples[2].terminal);
        assert_eq!(examples[2].reward, 1.0);
    }
}
