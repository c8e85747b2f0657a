//! Runs one simulated game end to end: builds the two `Agent`s for a
//! `GameConfig`, hands them to a `Simulator`, and records experience.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::agent::{Agent, AgentConfig, ExploitMode, ExploreConfig};
use crate::error::Error;
use crate::game::experience::{ExperienceContext, TrainingExample};
use crate::inference::InferenceClient;

#[derive(Debug, Clone)]
pub enum ExploitSpec {
    Model(String),
    Random,
    Heuristic,
}

#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub exploit: ExploitSpec,
    pub explore_factor: Option<f32>,
    pub emit_experience: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub id: String,
    pub agents: [AgentSpec; 2],
    pub max_turns: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub struct GameResult {
    pub id: String,
    pub agents: [String; 2],
    pub winner: Option<usize>,
    pub err: Option<Error>,
}

pub struct SimOutcome {
    pub winner: Option<usize>,
    pub final_reward: [f32; 2],
}

/// External collaborator: runs one game's decision loop, calling back into
/// each `Agent` at every decision point. The core never interprets game
/// rules; it only sees this contract (spec §2's "simulate" boundary).
#[async_trait(?Send)]
pub trait Simulator {
    async fn simulate(
        &self,
        agents: &mut [Agent; 2],
        experience: &mut [Option<ExperienceContext>; 2],
        seed: Option<u64>,
        max_turns: Option<usize>,
    ) -> Result<SimOutcome, Error>;
}

/// Per-thread state shared by every game a `GameWorker` plays: resolved
/// model clients by name, a heuristic ranking hook, the simulator, and the
/// channel experience is streamed out on.
pub struct GameWorkerContext {
    pub models: HashMap<String, InferenceClient>,
    pub heuristic: Option<Rc<dyn Fn(&[u8]) -> Vec<u8>>>,
    pub simulator: Rc<dyn Simulator>,
    pub experience_tx: mpsc::Sender<TrainingExample>,
}

fn build_agent(ctx: &GameWorkerContext, spec: &AgentSpec) -> Result<Agent, Error> {
    let exploit = match &spec.exploit {
        ExploitSpec::Model(name) => {
            let client = ctx
                .models
                .get(name)
                .cloned()
                .ok_or_else(|| Error::ProtocolError(format!("unknown model {name}")))?;
            ExploitMode::Model(client)
        }
        ExploitSpec::Random => ExploitMode::Random,
        ExploitSpec::Heuristic => {
            let rank_fn = ctx
                .heuristic
                .clone()
                .ok_or_else(|| Error::ProtocolError("no heuristic configured".into()))?;
            ExploitMode::Heuristic(rank_fn)
        }
    };
    Ok(Agent::new(AgentConfig {
        name: spec.name.clone(),
        exploit,
        explore: spec.explore_factor.map(|factor| ExploreConfig { factor }),
        move_classifier: None,
        emit_experience: spec.emit_experience,
        seed: spec.seed,
    }))
}

/// Play one game described by `config` against the context's simulator.
pub async fn play_game(ctx: Rc<RefCell<GameWorkerContext>>, config: GameConfig) -> Result<GameResult, Error> {
    let agent_names = [config.agents[0].name.clone(), config.agents[1].name.clone()];
    let result = run_game(ctx, &config).await;
    match result {
        Ok(outcome) => Ok(GameResult { id: config.id, agents: agent_names, winner: outcome.winner, err: None }),
        Err(e) => Ok(GameResult { id: config.id, agents: agent_names, winner: None, err: Some(e) }),
    }
}

async fn run_game(ctx: Rc<RefCell<GameWorkerContext>>, config: &GameConfig) -> Result<SimOutcome, Error> {
    let (simulator, experience_tx) = {
        let borrowed = ctx.borrow();
        (borrowed.simulator.clone(), borrowed.experience_tx.clone())
    };

    let mut agents = {
        let borrowed = ctx.borrow();
        [build_agent(&borrowed, &config.agents[0])?, build_agent(&borrowed, &config.agents[1])?]
    };

    let mut experience: [Option<ExperienceContext>; 2] = [
        config.agents[0].emit_experience.then(|| ExperienceContext::new(experience_tx.clone())),
        config.agents[1].emit_experience.then(|| ExperienceContext::new(experience_tx.clone())),
    ];

    simulator.simulate(&mut agents, &mut experience, config.seed, config.max_turns).await
}
