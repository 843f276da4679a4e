//! `sweepsync history`: print the run history of a configuration.

use sweepsync_client::{ClientConfig, HttpControlApi, WsTransport};
use sweepsync_core::types::ResourceId;
use sweepsync_session::{RunController, SyncSession};

use crate::cmd_run::{EXIT_OK, EXIT_UNAVAILABLE, flush_notices};
use crate::render::format_history;

pub async fn cmd_history(
    config: &ClientConfig,
    resource: &str,
    json: bool,
    use_color: bool,
) -> anyhow::Result<i32> {
    let resource_id = ResourceId::new(resource);
    let controller = RunController::new(HttpControlApi::new(config.clone())?);
    // No channel is opened; the session only holds the seeded snapshot.
    let mut session = SyncSession::new(WsTransport::new(config.clone()));

    if controller
        .load_history(&mut session, &resource_id)
        .await
        .is_err()
    {
        flush_notices(&mut session, use_color);
        return Ok(EXIT_UNAVAILABLE);
    }

    let records = session.store().records(&resource_id);
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        println!("{}", format_history(records, use_color));
    }
    Ok(EXIT_OK)
}
