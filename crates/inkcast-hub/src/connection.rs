//! WebSocket connection lifecycle: register, read loop, writer task, cleanup.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::hub::{subscriber_channel, Hub};

/// Drive one client connection until it closes.
pub async fn handle_ws_connection(hub: Arc<Hub>, ws: WebSocket) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = subscriber_channel();

    let conn_id = hub.on_connect(tx).await;
    info!(conn_id = %conn_id, "Client connected");
    #[cfg(feature = "metrics")]
    crate::metrics::record_ws_connect();

    // Write the latest frame whenever it changes; frames superseded while a
    // write is in flight are skipped. A failed write drops the slot, which
    // the hub prunes on its next broadcast.
    let writer_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let frame = rx.borrow_and_update().clone();
            if let Err(e) = ws_tx.send(Message::Text(frame.to_string().into())).await {
                debug!(conn_id = %writer_id, %e, "Write failed, stopping writer");
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                // Malformed input is logged by the hub and otherwise ignored.
                let _ = hub.on_message(&conn_id, text.as_str()).await;
            }
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    let _ = hub.on_message(&conn_id, text).await;
                }
                Err(e) => {
                    warn!(conn_id = %conn_id, %e, "Dropping non-UTF-8 binary frame");
                }
            },
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, "Client requested close");
                break;
            }
            Ok(_) => {
                // Ping/pong are answered by axum.
            }
            Err(e) => {
                warn!(conn_id = %conn_id, %e, "WebSocket error");
                break;
            }
        }
    }

    send_task.abort();
    hub.on_disconnect(&conn_id).await;
    #[cfg(feature = "metrics")]
    crate::metrics::record_ws_disconnect();
    info!(conn_id = %conn_id, "Client disconnected");
}
