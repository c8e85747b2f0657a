//! Rollout -> learn -> eval iteration loop tying `GamePool`, `Trainer` and
//! `ModelRegistry` together. Grounded in the teacher's `main.rs` bot-vs-bot
//! loop, generalized from "play one game at depth 1 forever" into a staged
//! training iteration with temp-file-backed experience handoff.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::example_io::write_example;
use crate::game::{GameConfig, GamePool, GameResult};
use crate::inference::ModelRegistry;
use crate::metrics::Scope;
use crate::trainer::{ProgressEvent, Trainer, TrainingConfig};

/// Deletes its backing file on drop unless `keep` was called first, so a
/// rollout file is cleaned up on every exit path -- success, learner error,
/// or panic unwind.
struct TempExamplesFile {
    path: PathBuf,
    kept: bool,
}

impl TempExamplesFile {
    fn new(path: PathBuf) -> Self {
        TempExamplesFile { path, kept: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempExamplesFile {
    fn drop(&mut self) {
        if !self.kept {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to clean up rollout file {:?}: {e}", self.path);
                }
            }
        }
    }
}

pub struct EpisodeConfig {
    pub iterations: usize,
    pub rollout_games: usize,
    pub eval_games: usize,
    pub model_name: String,
    pub training: TrainingConfig,
}

#[derive(Debug, Default)]
pub struct IterationReport {
    pub iteration: usize,
    pub examples_collected: usize,
    pub final_loss: Option<f32>,
    pub eval_win_rate: Option<f32>,
}

pub struct EpisodeDriver<T: Trainer> {
    games: Arc<GamePool>,
    registry: Arc<ModelRegistry>,
    trainer: T,
    artifact_dir: PathBuf,
    metrics: Scope,
}

impl<T: Trainer> EpisodeDriver<T> {
    pub fn new(games: Arc<GamePool>, registry: Arc<ModelRegistry>, trainer: T, artifact_dir: PathBuf, metrics: Scope) -> Self {
        EpisodeDriver { games, registry, trainer, artifact_dir, metrics }
    }

    /// Run `config.iterations` rollout/learn/eval cycles. `make_rollout_game`
    /// and `make_eval_game` build the `idx`-th `GameConfig` for their stage;
    /// the driver owns nothing about what game is actually being played.
    pub async fn run<FR, FE>(
        &self,
        config: &EpisodeConfig,
        make_rollout_game: FR,
        make_eval_game: FE,
    ) -> Result<Vec<IterationReport>, Error>
    where
        FR: Fn(usize, usize) -> GameConfig,
        FE: Fn(usize, usize) -> GameConfig,
    {
        let mut reports = Vec::with_capacity(config.iterations);
        for iter in 0..config.iterations {
            let report = self.run_iteration(iter, config, &make_rollout_game, &make_eval_game).await?;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn run_iteration<FR, FE>(
        &self,
        iter: usize,
        config: &EpisodeConfig,
        make_rollout_game: &FR,
        make_eval_game: &FE,
    ) -> Result<IterationReport, Error>
    where
        FR: Fn(usize, usize) -> GameConfig,
        FE: Fn(usize, usize) -> GameConfig,
    {
        let scope = self.metrics.child(&format!("iteration_{iter}"));
        info!("iteration {iter}: starting rollout of {} games", config.rollout_games);

        let examples_count = self.rollout(iter, config, make_rollout_game, &scope).await?;

        let example_path = self.artifact_dir.join(format!("rollout-{iter}.bin"));
        let mut rollout_file = TempExamplesFile::new(example_path.clone());

        let final_loss = self.learn(config, rollout_file.path(), &scope).await?;
        // The file has been fully consumed by the learner; nothing past this
        // point needs it, so let the guard's `Drop` remove it either way.
        rollout_file.kept = false;

        let eval_win_rate = self.eval(iter, config, make_eval_game, &scope).await?;

        Ok(IterationReport { iteration: iter, examples_collected: examples_count, final_loss: Some(final_loss), eval_win_rate })
    }

    async fn rollout<FR>(&self, iter: usize, config: &EpisodeConfig, make_rollout_game: &FR, scope: &Scope) -> Result<usize, Error>
    where
        FR: Fn(usize, usize) -> GameConfig,
    {
        let example_path = self.artifact_dir.join(format!("rollout-{iter}.bin"));
        tokio::fs::create_dir_all(&self.artifact_dir)
            .await
            .map_err(|e| Error::ProtocolError(format!("failed to create artifact dir: {e}")))?;

        let game_configs: Vec<GameConfig> = (0..config.rollout_games).map(|i| make_rollout_game(iter, i)).collect();

        // The collector runs concurrently with the rollout games so the
        // bounded experience channel never backs up and stalls a worker.
        // Once every game has returned, a `finished` signal switches it from
        // blocking recv to a non-blocking drain, so a game that errored out
        // mid-simulation (and never reached `ExperienceContext::finalize`)
        // can't leave the collector waiting forever.
        let (finished_tx, mut finished_rx) = tokio::sync::oneshot::channel::<()>();
        let collector = {
            let games = self.games.clone();
            let path = example_path.clone();
            tokio::spawn(async move {
                let mut count = 0usize;
                let file = std::fs::File::create(&path)
                    .map_err(|e| Error::ProtocolError(format!("failed to create rollout file: {e}")))?;
                let mut writer = std::io::BufWriter::new(file);
                loop {
                    tokio::select! {
                        biased;
                        example = games.collect_experience() => {
                            match example {
                                Some(example) => {
                                    write_example(&mut writer, &example)?;
                                    count += 1;
                                }
                                None => break,
                            }
                        }
                        _ = &mut finished_rx => {
                            while let Some(example) = games.try_collect_experience().await {
                                write_example(&mut writer, &example)?;
                                count += 1;
                            }
                            break;
                        }
                    }
                }
                Ok::<usize, Error>(count)
            })
        };

        let mut handles = Vec::with_capacity(game_configs.len());
        for game_config in game_configs {
            let games = self.games.clone();
            handles.push(tokio::spawn(async move { games.add(game_config).await }));
        }
        let mut results: Vec<GameResult> = Vec::with_capacity(handles.len());
        for h in handles {
            results.push(h.await.map_err(|e| Error::WorkerCrashed(e.to_string()))??);
        }
        for r in &results {
            if let Some(err) = &r.err {
                warn!("rollout game {} failed: {err}", r.id);
            }
        }
        scope.incr("rollout_games_played", results.len() as u64);

        let _ = finished_tx.send(());
        let count = collector.await.map_err(|e| Error::WorkerCrashed(e.to_string()))??;
        Ok(count)
    }

    async fn learn(&self, config: &EpisodeConfig, example_path: &Path, scope: &Scope) -> Result<f32, Error> {
        let (progress_tx, mut progress_rx) = mpsc::channel(32);
        let paths = [example_path.to_path_buf()];
        let model_name = config.model_name.clone();
        let training = config.training.clone();
        let train_fut = self.trainer.train(&model_name, training, &paths, progress_tx);

        let mut last_loss = 0.0f32;
        let progress_task = async {
            while let Some(event) = progress_rx.recv().await {
                if let ProgressEvent::Epoch { index, loss } = event {
                    info!("epoch {index}: loss={loss}");
                    scope.observe("epoch_loss", loss as f64);
                    last_loss = loss;
                }
            }
        };

        let (train_result, ()) = tokio::join!(train_fut, progress_task);
        train_result?;

        // `Trainer` is external and opaque (spec component J); it hands back
        // its updated weights as a file rather than reaching into the
        // registry itself, so the driver is the one that performs the swap.
        let weights_path = self.artifact_dir.join(format!("{}.weights", config.model_name));
        if let Ok(snapshot) = tokio::fs::read(&weights_path).await {
            self.registry.swap_weights(&config.model_name, &snapshot).await?;
        }

        Ok(last_loss)
    }

    async fn eval<FE>(&self, iter: usize, config: &EpisodeConfig, make_eval_game: &FE, scope: &Scope) -> Result<Option<f32>, Error>
    where
        FE: Fn(usize, usize) -> GameConfig,
    {
        if config.eval_games == 0 {
            return Ok(None);
        }
        let mut handles = Vec::with_capacity(config.eval_games);
        for i in 0..config.eval_games {
            let games = self.games.clone();
            let game_config = make_eval_game(iter, i);
            handles.push(tokio::spawn(async move { games.add(game_config).await }));
        }
        let mut wins = 0usize;
        let mut total = 0usize;
        for h in handles {
            let result = h.await.map_err(|e| Error::WorkerCrashed(e.to_string()))??;
            if result.err.is_none() {
                total += 1;
                if result.winner == Some(0) {
                    wins += 1;
                }
            }
        }
        let rate = if total == 0 { None } else { Some(wins as f32 / total as f32) };
        if let Some(rate) = rate {
            scope.observe("eval_win_rate", rate as f64);
        }
        Ok(rate)
    }
}
