pub mod classifier;
pub mod queue;

pub use classifier::UploadOutcome;
pub use queue::{UploadQueue, MAX_ATTEMPTS};
