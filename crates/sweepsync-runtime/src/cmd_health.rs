//! `sweepsync health`: check that the backend answers.

use sweepsync_client::{ClientConfig, HttpControlApi};

use crate::cmd_run::{EXIT_OK, EXIT_UNAVAILABLE};

/// Returns [`EXIT_OK`] when the backend answered, [`EXIT_UNAVAILABLE`]
/// otherwise.
pub async fn cmd_health(config: &ClientConfig) -> anyhow::Result<i32> {
    let api = HttpControlApi::new(config.clone())?;

    match api.health().await {
        Ok(reply) => {
            let message = if reply.message.is_empty() {
                "(no message)"
            } else {
                reply.message.as_str()
            };
            println!("{} {}: {}", config.api_url(), reply.status, message);
            Ok(EXIT_OK)
        }
        Err(e) => {
            eprintln!("{}: {e}", config.api_url());
            Ok(EXIT_UNAVAILABLE)
        }
    }
}
