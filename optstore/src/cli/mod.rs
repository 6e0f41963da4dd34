pub mod runner;

pub use runner::{parse_value, CommandOutput, CommandRunner, OptionCommand};
