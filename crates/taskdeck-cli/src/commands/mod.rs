//! CLI command definitions and handlers.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod roles;
pub mod serve;

/// Taskdeck - collaborative task boards with live updates
#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API and WebSocket server
    Serve(serve::ServeArgs),

    /// Show which permissions each role grants
    Roles,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::execute(args).await,
            Commands::Roles => {
                roles::execute();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["taskdeck", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, 3030);
                assert_eq!(args.queue_capacity, 256);
                assert_eq!(args.heartbeat_secs, 60);
                assert!(args.redis_url.is_none());
            }
            Commands::Roles => panic!("expected serve"),
        }
    }
}
