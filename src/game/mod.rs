pub mod experience;
pub mod pool;
pub mod worker;

pub use experience::{ExperienceContext, TrainingExample};
pub use pool::{GamePool, GameWorkerComponents};
pub use worker::{AgentSpec, ExploitSpec, GameConfig, GameResult, GameWorkerContext, SimOutcome, Simulator};
