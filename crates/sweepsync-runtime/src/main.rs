//! sweepsync: follow parameter sweep simulation runs from the terminal.
//!
//! Talks to the control API over HTTP and to the live status channel over
//! WebSocket. Records go to stdout; channel state, notices and logs go to
//! stderr.

use std::time::Duration;

use clap::Parser;
use sweepsync_client::ClientConfig;

mod cli;
mod cmd_health;
mod cmd_history;
mod cmd_run;
mod render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("SWEEPSYNC_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::new(
        &args.api_url,
        &args.ws_url,
        Duration::from_millis(args.timeout_ms),
    )?;
    let use_color = render::resolve_color(&args.color);

    let exit_code = match args.command {
        cli::Command::Health => cmd_health::cmd_health(&config).await?,
        cli::Command::History(opts) => {
            cmd_history::cmd_history(&config, &opts.resource, opts.json, use_color).await?
        }
        cli::Command::Run(opts) => {
            let mode = cmd_run::Mode::Start {
                follow_existing: opts.follow_existing,
            };
            let output = cmd_run::Output {
                json: opts.json,
                use_color,
            };
            cmd_run::cmd_run(&config, &opts.resource, mode, output).await?
        }
        cli::Command::Watch(opts) => {
            let output = cmd_run::Output {
                json: opts.json,
                use_color,
            };
            cmd_run::cmd_run(&config, &opts.resource, cmd_run::Mode::Watch, output).await?
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
