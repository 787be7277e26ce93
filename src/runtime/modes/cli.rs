//! CLI mode
//!
//! Delegates report commands to the CLI implementation.

use crate::config::{Command, StaticConfig};
use crate::errors::Result;

pub fn run_cli(command: &Command, config: &StaticConfig) -> Result<()> {
    crate::interfaces::cli::run_cli(command, config)
}
