//! LiveServer - WebSocket endpoint for dashboard subscribers

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::broadcaster::{LiveBroadcaster, Subscription};
use crate::error::LiveError;

/// Accepts WebSocket clients and streams live updates to them
///
/// Each client joins the subscriber set once its handshake completes and
/// leaves it when the socket closes. Inbound frames are ignored apart
/// from close.
pub struct LiveServer {
    listener: TcpListener,
    broadcaster: LiveBroadcaster,
}

impl LiveServer {
    /// Bind the listen address
    #[instrument(name = "live_server_bind", skip(broadcaster))]
    pub async fn bind(addr: &str, broadcaster: LiveBroadcaster) -> Result<Self, LiveError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| LiveError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!(addr = %listener.local_addr()?, "live endpoint listening");
        Ok(Self {
            listener,
            broadcaster,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, LiveError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop on a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.serve(cancel))
    }

    /// Accept clients until cancelled
    pub async fn serve(self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let broadcaster = self.broadcaster.clone();
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            if let Err(e) = handle_client(stream, peer, broadcaster, cancel).await {
                                debug!(peer = %peer, error = %e, "live client ended with error");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "live accept failed"),
                }
            }
        }
        debug!("live accept loop exiting");
    }
}

async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    broadcaster: LiveBroadcaster,
    cancel: CancellationToken,
) -> Result<(), LiveError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let subscription = broadcaster.subscribe();
    info!(
        peer = %peer,
        subscribers = broadcaster.subscriber_count(),
        "live client connected"
    );

    let result = stream_updates(ws, subscription, &cancel).await;
    info!(peer = %peer, "live client disconnected");
    result
}

async fn stream_updates(
    ws: tokio_tungstenite::WebSocketStream<TcpStream>,
    mut subscription: Subscription,
    cancel: &CancellationToken,
) -> Result<(), LiveError> {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            update = subscription.next() => match update {
                Some(update) => {
                    let text = serde_json::to_string(&update)?;
                    write.send(Message::Text(text)).await?;
                }
                None => return Ok(()),
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let server = LiveServer::bind("127.0.0.1:0", LiveBroadcaster::default())
            .await
            .unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_failure_names_address() {
        let err = LiveServer::bind("127.0.0.1:notaport", LiveBroadcaster::default())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("127.0.0.1:notaport"));
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let server = LiveServer::bind("127.0.0.1:0", LiveBroadcaster::default())
            .await
            .unwrap();
        let cancel = CancellationToken::new();
        let handle = server.spawn(cancel.clone());
        cancel.cancel();
        handle.await.unwrap();
    }
}
