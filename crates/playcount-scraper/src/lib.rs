pub mod chain;
pub mod engine;
pub mod error;
pub mod extract;
pub mod locator;
pub mod normalize;
pub mod pacing;
pub mod page;
pub mod target;

pub use chain::{EngineChain, TargetReport};
pub use engine::{build_engines, ContextOptions, Engine, LaunchOptions};
pub use error::EngineError;
pub use normalize::{normalize_count, normalize_count_str};
pub use pacing::Pacer;
pub use page::{run_attempt, AttemptSettings, ExtractionAttempt};
pub use target::Target;
