//! Command-line argument parsing

use clap::{Parser, Subcommand};

/// Tracked link redirection with click analytics
#[derive(Debug, Parser)]
#[command(name = "smartlinker", version, about)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Clicks per template, most clicked first
    Templates,
    /// Clicks per day
    Daily {
        /// Only count this template
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Every click recorded for one template
    Detail { template_id: String },
    /// Clicks per account
    Accounts {
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Click-through rate for a template
    Ctr {
        template_id: String,
        /// Number of impressions (non-negative integer)
        #[arg(allow_hyphen_values = true)]
        impressions: String,
    },
    /// Write a sample configuration file
    ConfigGen {
        #[arg(default_value = "config.example.toml")]
        path: String,
    },
}

impl Cli {
    /// `None` and `serve` both start the server
    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Command::Serve))
    }
}
