pub mod cli;
pub mod config;

pub use cli::{CommandOutput, CommandRunner, OptionCommand};
pub use config::CliConfig;
