//! CLI module for PMP Identity
//!
//! - `serve`: run the HTTP API
//! - `health`: probe a running instance

pub mod health;
pub mod serve;

use clap::{Parser, Subcommand};

/// PMP Identity - users, groups, teams and bearer tokens
#[derive(Parser)]
#[command(name = "pmp-identity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Query the health endpoint of a running server
    Health(health::HealthArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_health_url() {
        let cli = Cli::parse_from(["pmp-identity", "health", "--url", "http://10.0.0.1:9000/health"]);

        match cli.command {
            Command::Health(args) => assert_eq!(args.url, "http://10.0.0.1:9000/health"),
            Command::Serve => panic!("expected health command"),
        }
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["pmp-identity", "serve"]);
        assert!(matches!(cli.command, Command::Serve));
    }
}
