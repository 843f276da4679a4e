//! Live status channels over WebSocket.
//!
//! Each subscription spawns one task that connects to
//! `{ws}/ws/configs/{id}`, forwards text frames to the channel's sink and
//! always finishes with exactly one `closed` event. Cancelling the handle
//! sends a close frame and ends the task.

use futures_util::{SinkExt, StreamExt};
use sweepsync_session::{ChannelHandle, EventSink, Transport, TransportError};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::endpoints::ClientConfig;

pub struct WsTransport {
    config: ClientConfig,
    tasks: TaskTracker,
}

impl WsTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            tasks: TaskTracker::new(),
        }
    }

    /// Number of channel tasks still running.
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every channel task has finished.
    ///
    /// Call after closing the channels so close frames reach the server
    /// before the runtime shuts down.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

/// Cancels its channel task on `request_close` or when dropped.
#[derive(Debug)]
pub struct WsHandle {
    cancel: CancellationToken,
}

impl ChannelHandle for WsHandle {
    fn request_close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Transport for WsTransport {
    type Handle = WsHandle;

    fn subscribe(&mut self, sink: EventSink) -> Result<WsHandle, TransportError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| TransportError::Subscribe {
                resource_id: sink.resource_id().clone(),
                reason: e.to_string(),
            })?;

        let url = self.config.channel_url(sink.resource_id()).to_string();
        let cancel = CancellationToken::new();
        tracing::debug!(%url, channel = %sink.channel_id(), "spawning channel task");
        self.tasks
            .spawn_on(run_channel(url, sink, cancel.clone()), &runtime);
        Ok(WsHandle { cancel })
    }
}

async fn run_channel(url: String, sink: EventSink, cancel: CancellationToken) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(%url, "channel cancelled before connecting");
            sink.closed();
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(%url, "channel connect failed: {e}");
            sink.error(e.to_string());
            sink.closed();
            return;
        }
    };

    tracing::info!(%url, channel = %sink.channel_id(), "channel connected");
    sink.opened();

    let (mut write, mut read) = stream.split();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(%url, "sending close frame failed: {e}");
                }
                break;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if !sink.message(text) {
                        // Session is gone; nobody is listening.
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(%url, ?frame, "server closed channel");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(%url, "channel read failed: {e}");
                    sink.error(e.to_string());
                    break;
                }
                None => break,
            }
        }
    }

    sink.closed();
}
