//! CLI command implementations

mod config_gen;
mod reports;

pub use config_gen::config_gen;
pub use reports::{accounts, ctr, daily, detail, templates};
