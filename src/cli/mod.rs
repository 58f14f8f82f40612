pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DatabaseArgs};
pub use commands::run;
