// gridbase CLI library: CSV loading, replay scripts and the replay driver.
// The binary in main.rs is a thin clap wrapper over these.

pub mod error;
pub mod exit_codes;
pub mod replay;
pub mod script;
pub mod table;

pub use error::CliError;
pub use replay::{run_replay, ReplayOptions, ReplaySummary};
pub use table::OutputFormat;
