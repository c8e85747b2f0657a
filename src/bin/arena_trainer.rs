//! Trainer entry point: parses `TrainerArgs`, wires up the `GamePool` /
//! `ModelRegistry` / `EpisodeDriver` data plane, and runs the iteration
//! loop. Adapted from the teacher's `main.rs`, which drove a single
//! bot-vs-bot game loop directly; here that loop is delegated entirely to
//! `EpisodeDriver`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arena_trainer::config::TrainerArgs;
use arena_trainer::episode::{EpisodeConfig, EpisodeDriver};
use arena_trainer::error::Error;
use arena_trainer::game::{AgentSpec, ExploitSpec, GameConfig, GamePool};
use arena_trainer::inference::{BatchPredictProfile, ModelRegistry};
use arena_trainer::metrics::Metrics;
use arena_trainer::quoridor::{model::QuoridorModel, simulator::QuoridorSimulator};
use arena_trainer::trainer::{ProgressEvent, Trainer, TrainingConfig};
use async_trait::async_trait;
use burn::backend::NdArray;
use clap::Parser;
use log::info;
use tokio::sync::mpsc;

const MODEL_NAME: &str = "main";
const PROFILE_NAME: &str = "default";
const HEURISTIC_DEPTH: usize = 2;

/// Stands in for the external learning process spec component J describes:
/// reads rollout files, pretends to minimize a loss, and (for the local demo
/// binary) leaves the model's weights untouched rather than actually
/// computing gradients.
struct DemoTrainer;

#[async_trait]
impl Trainer for DemoTrainer {
    async fn train(
        &self,
        model_name: &str,
        config: TrainingConfig,
        example_paths: &[PathBuf],
        on_progress: mpsc::Sender<ProgressEvent>,
    ) -> Result<(), Error> {
        let mut total_examples = 0usize;
        for path in example_paths {
            let file = std::fs::File::open(path).map_err(|e| Error::ProtocolError(e.to_string()))?;
            let mut reader = std::io::BufReader::new(file);
            while arena_trainer::example_io::read_example(&mut reader)?.is_some() {
                total_examples += 1;
            }
        }
        info!("training {model_name} on {total_examples} examples ({} epochs)", config.epochs);
        let _ = on_progress.send(ProgressEvent::Start { num_batches: config.epochs }).await;
        for epoch in 0..config.epochs {
            let _ = on_progress.send(ProgressEvent::Epoch { index: epoch, loss: 0.0 }).await;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = TrainerArgs::parse();

    let metrics = Metrics::new();
    let registry = Arc::new(ModelRegistry::new(metrics.scope("inference")));
    registry.load(MODEL_NAME, Box::new(QuoridorModel::<NdArray>::new(Default::default()))).await?;
    registry
        .configure(MODEL_NAME, PROFILE_NAME, BatchPredictProfile::new(args.max_batch_size, Duration::from_millis(args.max_wait_ms)))
        .await?;
    let remote_client = registry.subscribe(MODEL_NAME, PROFILE_NAME).await?;

    let games = Arc::new(GamePool::new(
        args.workers,
        args.parallelism_per_thread,
        move || QuoridorSimulator::components(HEURISTIC_DEPTH),
        4096,
    ));
    games
        .register_model_port(MODEL_NAME.to_string(), arena_trainer::inference::InferenceClient::Remote(remote_client))
        .await?;

    let driver = EpisodeDriver::new(games.clone(), registry.clone(), DemoTrainer, args.artifact_dir.clone(), metrics.scope("episode"));

    let episode_config = EpisodeConfig {
        iterations: args.iterations,
        rollout_games: args.rollout_games,
        eval_games: args.eval_games,
        model_name: MODEL_NAME.to_string(),
        training: TrainingConfig { epochs: args.epochs, batch_size: args.batch_size, algorithm_variant: "policy_gradient".to_string(), seed: args.seed },
    };

    let make_rollout_game = {
        let explore_factor = args.explore_factor;
        let seed = args.seed;
        move |iter: usize, i: usize| GameConfig {
            id: format!("rollout-{iter}-{i}"),
            agents: [
                AgentSpec {
                    name: "main_a".into(),
                    exploit: ExploitSpec::Model(MODEL_NAME.to_string()),
                    explore_factor: Some(explore_factor),
                    emit_experience: true,
                    seed: seed.map(|s| s.wrapping_add(i as u64 * 2)),
                },
                AgentSpec {
                    name: "main_b".into(),
                    exploit: ExploitSpec::Model(MODEL_NAME.to_string()),
                    explore_factor: Some(explore_factor),
                    emit_experience: true,
                    seed: seed.map(|s| s.wrapping_add(i as u64 * 2 + 1)),
                },
            ],
            max_turns: Some(400),
            seed,
        }
    };

    let make_eval_game = {
        let seed = args.seed;
        move |iter: usize, i: usize| GameConfig {
            id: format!("eval-{iter}-{i}"),
            agents: [
                AgentSpec { name: "candidate".into(), exploit: ExploitSpec::Model(MODEL_NAME.to_string()), explore_factor: None, emit_experience: false, seed },
                AgentSpec { name: "heuristic".into(), exploit: ExploitSpec::Heuristic, explore_factor: None, emit_experience: false, seed },
            ],
            max_turns: Some(400),
            seed,
        }
    };

    let reports = driver.run(&episode_config, make_rollout_game, make_eval_game).await?;
    for report in &reports {
        info!(
            "iteration {}: {} examples, loss={:?}, eval_win_rate={:?}",
            report.iteration, report.examples_collected, report.final_loss, report.eval_win_rate
        );
    }

    games.close();
    Ok(())
}
