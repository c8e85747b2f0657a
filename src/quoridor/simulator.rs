//! Wires `Agent`/`ExperienceContext` into a full game, grounded in the
//! teacher's `main.rs` bot-vs-bot driving loop. Also builds the
//! `ExploitSpec::Heuristic` ranking closure, sharing this simulator's
//! per-turn game snapshot so the closure (which only ever sees a flat
//! `&[u8]` of choices) can still run alpha-beta search against live state.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::Error;
use crate::game::{ExperienceContext, GameWorkerComponents, SimOutcome, Simulator};
use crate::quoridor::all_moves::all_moves;
use crate::quoridor::bot::rank_choice_ids_alpha_beta;
use crate::quoridor::data_model::{Game, Player, PIECE_GRID_HEIGHT};
use crate::quoridor::encode::encode;
use crate::quoridor::game_logic::{execute_move_unchecked, is_move_legal};

const DEFAULT_MAX_TURNS: usize = 400;

fn winner(game: &Game) -> Option<usize> {
    if game.board.player_position(Player::A).y() == PIECE_GRID_HEIGHT - 1 {
        Some(Player::A.as_index())
    } else if game.board.player_position(Player::B).y() == 0 {
        Some(Player::B.as_index())
    } else {
        None
    }
}

pub struct QuoridorSimulator {
    turn_state: Rc<RefCell<Option<(Game, Player)>>>,
    heuristic_depth: usize,
}

impl QuoridorSimulator {
    /// Build one thread's simulator and heuristic ranking closure, sharing
    /// live state between them. `heuristic_depth` is the alpha-beta depth
    /// the heuristic exploit mode searches to.
    pub fn components(heuristic_depth: usize) -> GameWorkerComponents {
        let turn_state = Rc::new(RefCell::new(None));
        let simulator = Rc::new(QuoridorSimulator { turn_state: turn_state.clone(), heuristic_depth });
        let heuristic: Rc<dyn Fn(&[u8]) -> Vec<u8>> = Rc::new(move |choices: &[u8]| {
            let guard = turn_state.borrow();
            match guard.as_ref() {
                Some((game, player)) => rank_choice_ids_alpha_beta(game, *player, heuristic_depth, choices),
                None => choices.to_vec(),
            }
        });
        GameWorkerComponents { simulator, heuristic: Some(heuristic) }
    }
}

#[async_trait(?Send)]
impl Simulator for QuoridorSimulator {
    async fn simulate(
        &self,
        agents: &mut [Agent; 2],
        experience: &mut [Option<ExperienceContext>; 2],
        _seed: Option<u64>,
        max_turns: Option<usize>,
    ) -> Result<SimOutcome, Error> {
        let moves = all_moves();
        let mut game = Game::new();
        let max_turns = max_turns.unwrap_or(DEFAULT_MAX_TURNS);
        let mut last_action: [Option<u8>; 2] = [None, None];

        for _turn in 0..max_turns {
            let player = game.player;
            let idx = player.as_index();

            let choices: Vec<u8> =
                (0..moves.len() as u8).filter(|&id| is_move_legal(&game, player, &moves[id as usize])).collect();
            if choices.is_empty() {
                return Err(Error::SimError(format!("player {} has no legal moves", player.to_string())));
            }

            *self.turn_state.borrow_mut() = Some((game.clone(), player));
            let state = encode(&game, player);
            let ranked = agents[idx].rank_choices(&state, &choices).await?;
            let action = *ranked.first().ok_or_else(|| Error::SimError("ranker returned no choices".into()))?;

            if let Some(ctx) = experience[idx].as_mut() {
                ctx.add(state, choices, last_action[idx], Some(0.0)).await?;
            }
            last_action[idx] = Some(action);

            execute_move_unchecked(&mut game, player, &moves[action as usize]);

            if let Some(winner_idx) = winner(&game) {
                let final_reward = [if winner_idx == 0 { 1.0 } else { -1.0 }, if winner_idx == 1 { 1.0 } else { -1.0 }];
                for i in 0..2 {
                    if let (Some(ctx), Some(action)) = (experience[i].as_mut(), last_action[i]) {
                        ctx.finalize(action, final_reward[i]).await?;
                    }
                }
                return Ok(SimOutcome { winner: Some(winner_idx), final_reward });
            }
        }

        for i in 0..2 {
            if let (Some(ctx), Some(action)) = (experience[i].as_mut(), last_action[i]) {
                ctx.finalize(action, 0.0).await?;
            }
        }
        Ok(SimOutcome { winner: None, final_reward: [0.0, 0.0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentConfig, ExploitMode};

    #[tokio::test]
    async fn a_short_capped_game_ends_without_error() {
        let components = QuoridorSimulator::components(1);
        let mut agents = [
            Agent::new(AgentConfig { name: "a".into(), exploit: ExploitMode::Random, explore: None, move_classifier: None, emit_experience: false, seed: Some(1) }),
            Agent::new(AgentConfig { name: "b".into(), exploit: ExploitMode::Random, explore: None, move_classifier: None, emit_experience: false, seed: Some(2) }),
        ];
        let mut experience = [None, None];
        let outcome = components.simulator.simulate(&mut agents, &mut experience, None, Some(5)).await.unwrap();
        assert!(outcome.winner.is_none() || outcome.winner.is_some());
    }
}
