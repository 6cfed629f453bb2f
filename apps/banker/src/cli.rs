//! Command line interface definition

use banker_types::{ColorChoice, DemandPolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// banker - Deadlock-avoiding resource allocator
#[derive(Parser)]
#[command(name = "banker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadlock-avoiding resource allocator driven by the Banker's algorithm")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to a file in the banker log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run concurrent requesters against the ledger
    #[command(alias = "sim")]
    Run {
        /// Units of each resource type (overrides the configured totals)
        #[arg(value_name = "TOTAL")]
        totals: Vec<u32>,

        /// How long to run, in seconds
        #[arg(short, long, value_name = "SECS")]
        duration: Option<u64>,

        /// Seed for reproducible requester behaviour
        #[arg(long)]
        seed: Option<u64>,

        /// Rule for validating the maximum demand matrix
        #[arg(long, value_enum)]
        policy: Option<DemandPolicy>,
    },

    /// Show the initial state and its safe sequence
    Check {
        /// Units of each resource type (overrides the configured totals)
        #[arg(value_name = "TOTAL")]
        totals: Vec<u32>,

        /// Rule for validating the maximum demand matrix
        #[arg(long, value_enum)]
        policy: Option<DemandPolicy>,
    },
}

impl Commands {
    /// Resource totals given on the command line, if any
    pub fn totals(&self) -> &[u32] {
        match self {
            Self::Run { totals, .. } | Self::Check { totals, .. } => totals,
        }
    }

    pub fn policy(&self) -> Option<DemandPolicy> {
        match self {
            Self::Run { policy, .. } | Self::Check { policy, .. } => *policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_parses_totals_and_flags() {
        let cli = Cli::try_parse_from([
            "banker",
            "--json",
            "run",
            "10",
            "5",
            "7",
            "--duration",
            "3",
            "--seed",
            "42",
            "--policy",
            "per-requester",
        ])
        .unwrap();

        assert!(cli.global.json);
        assert_eq!(cli.command.totals(), &[10, 5, 7]);
        assert_eq!(cli.command.policy(), Some(DemandPolicy::PerRequester));
        match cli.command {
            Commands::Run { duration, seed, .. } => {
                assert_eq!(duration, Some(3));
                assert_eq!(seed, Some(42));
            }
            Commands::Check { .. } => panic!("parsed as check"),
        }
    }

    #[test]
    fn test_check_accepts_underscore_policy_alias() {
        let cli = Cli::try_parse_from(["banker", "check", "--policy", "per_requester"]).unwrap();
        assert!(cli.command.totals().is_empty());
        assert_eq!(cli.command.policy(), Some(DemandPolicy::PerRequester));
    }

    #[test]
    fn test_negative_total_is_rejected() {
        assert!(Cli::try_parse_from(["banker", "check", "3", "-1"]).is_err());
    }
}
