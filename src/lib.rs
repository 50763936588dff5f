// Library surface for headless/integration tests and reuse.
// The binary in main.rs only owns terminal setup and the CLI.
pub mod app;
pub mod app_dirs;
pub mod best;
pub mod clock;
pub mod config;
pub mod history;
pub mod input;
pub mod mood;
pub mod round;
pub mod runtime;
pub mod stats;
pub mod store;
pub mod ui;

pub use round::{GameEvent, Notice, RoundMachine, RoundState};
