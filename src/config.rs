//! CLI configuration, adapted from the teacher's `main_cli.rs` `Args`
//! struct: a flat `clap::Parser` derive covering pool sizing, inference
//! batching, and the iteration loop.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "arena-trainer", about = "Distributed self-play trainer")]
pub struct TrainerArgs {
    /// OS threads backing the game pool.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    /// Concurrent games per worker thread.
    #[arg(long, default_value_t = 4)]
    pub parallelism_per_thread: usize,

    /// Upper bound on a single inference batch.
    #[arg(long, default_value_t = 32)]
    pub max_batch_size: usize,

    /// Longest a partial batch waits before executing anyway.
    #[arg(long, default_value_t = 20)]
    pub max_wait_ms: u64,

    /// Self-play games per rollout stage.
    #[arg(long, default_value_t = 64)]
    pub rollout_games: usize,

    /// Evaluation games per iteration; 0 skips evaluation.
    #[arg(long, default_value_t = 16)]
    pub eval_games: usize,

    /// Number of rollout/learn/eval iterations to run.
    #[arg(long, default_value_t = 10)]
    pub iterations: usize,

    /// Epochs the trainer runs per learn stage.
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// Minibatch size passed to the trainer.
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    /// Probability an agent ignores its exploit ranking and shuffles instead.
    #[arg(long, default_value_t = 0.1)]
    pub explore_factor: f32,

    /// Directory for rollout files and model weight snapshots.
    #[arg(long, default_value = "./artifacts")]
    pub artifact_dir: PathBuf,

    /// Seed for reproducible game and agent rngs; unset draws from the OS.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_from_program_name_alone() {
        let args = TrainerArgs::parse_from(["arena-trainer"]);
        assert_eq!(args.workers, 4);
        assert_eq!(args.rollout_games, 64);
        assert_eq!(args.artifact_dir, PathBuf::from("./artifacts"));
    }

    #[test]
    fn overrides_are_applied() {
        let args = TrainerArgs::parse_from(["arena-trainer", "--workers", "8", "--seed", "7"]);
        assert_eq!(args.workers, 8);
        assert_eq!(args.seed, Some(7));
    }
}
