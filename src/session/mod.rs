pub mod controller;
pub mod state;

pub use controller::{SessionController, StartSessionArgs};
pub use state::SessionPhase;
