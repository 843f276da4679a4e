//! CLI definition using clap derive.

use clap::{Parser, Subcommand};
use sweepsync_client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_MS, DEFAULT_WS_URL};

#[derive(Parser, Debug)]
#[command(
    name = "sweepsync",
    version,
    about = "Follow parameter sweep runs live"
)]
pub struct Cli {
    /// Control API base URL
    #[arg(long, env = "SWEEPSYNC_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Live channel base URL
    #[arg(long, env = "SWEEPSYNC_WS_URL", default_value = DEFAULT_WS_URL, global = true)]
    pub ws_url: String,

    /// Per-request HTTP timeout in milliseconds
    #[arg(long, env = "SWEEPSYNC_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// Color output: auto, always, never
    #[arg(long, default_value = "auto", global = true)]
    pub color: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the backend is reachable
    Health,
    /// Print the run history of a configuration
    History(HistoryOpts),
    /// Start a run and follow it until it finishes
    Run(RunOpts),
    /// Follow live status updates without starting a run
    Watch(WatchOpts),
}

#[derive(clap::Args, Debug)]
pub struct HistoryOpts {
    /// Configuration id
    pub resource: String,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct RunOpts {
    /// Configuration id
    pub resource: String,

    /// Print each update as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Follow the run already in progress instead of exiting
    #[arg(long)]
    pub follow_existing: bool,
}

#[derive(clap::Args, Debug)]
pub struct WatchOpts {
    /// Configuration id
    pub resource: String,

    /// Print each update as a JSON line
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let cli = parse(&["sweepsync", "health"]);
        assert_eq!(cli.api_url, "http://localhost:8000");
        assert_eq!(cli.ws_url, "ws://localhost:8000");
        assert_eq!(cli.timeout_ms, 10_000);
        assert_eq!(cli.color, "auto");
        assert!(matches!(cli.command, Command::Health));
    }

    #[test]
    fn run_flags() {
        let cli = parse(&["sweepsync", "run", "cfg1", "--json", "--follow-existing"]);
        match cli.command {
            Command::Run(opts) => {
                assert_eq!(opts.resource, "cfg1");
                assert!(opts.json);
                assert!(opts.follow_existing);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = parse(&[
            "sweepsync",
            "watch",
            "cfg1",
            "--api-url",
            "https://sweeps.example.com",
            "--timeout-ms",
            "2500",
        ]);
        assert_eq!(cli.api_url, "https://sweeps.example.com");
        assert_eq!(cli.timeout_ms, 2500);
        assert!(matches!(cli.command, Command::Watch(WatchOpts { json: false, .. })));
    }

    #[test]
    fn history_requires_resource() {
        assert!(Cli::try_parse_from(["sweepsync", "history"]).is_err());
    }
}
