//! Available subcommands.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the gateway (default when no command is given)
    Serve,

    /// Print a signed JWT for SUBJECT (development tooling)
    IssueToken {
        /// User id placed in the `sub` claim
        subject: String,
        /// Token lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },

    /// Validate configuration and print the effective gate table
    CheckConfig {
        /// Also round-trip a PING to the lock store
        #[arg(long)]
        ping: bool,
        /// Print the merged settings as JSON (usable as a settings file)
        #[arg(long)]
        json: bool,
    },
}
