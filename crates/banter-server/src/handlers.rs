//! Connection handlers for the banter relay server.
//!
//! This module owns the connection lifecycle: upgrade, the per-connection
//! event loop, and the disconnect cleanup. The relay operations themselves
//! live in `banter-core`; everything here is transport plumbing.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use banter_core::{relay, Broker, SessionContext};
use banter_protocol::{codec, ChatEvent, ClientFrame, EventKind};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// The topic broker.
    pub broker: Broker,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            broker: Broker::with_capacity(config.relay.channel_capacity),
            config,
        }
    }
}

/// Build the axum application.
#[must_use]
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let app = app(state);

    // Bind and serve
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("banter relay listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, config.transport.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_websocket(socket: WebSocket, state: Arc<AppState>) {
    // Record connection metrics
    let _metrics_guard = ConnectionMetricsGuard::new();

    // Generate connection ID
    let connection_id = format!(
        "conn_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );

    let topic = state.config.relay.topic.clone();
    let mut session = SessionContext::new();

    // Every connection subscribes to the shared broadcast topic
    let mut events = match state.broker.subscribe(&connection_id, &topic) {
        Ok(rx) => rx,
        Err(e) => {
            error!(connection = %connection_id, error = %e, "Subscribe failed");
            return;
        }
    };

    debug!(connection = %connection_id, topic = %topic, "WebSocket connected");

    // Split the WebSocket
    let (mut sender, mut receiver) = socket.split();

    // Event loop
    loop {
        tokio::select! {
            biased;

            // Receive broadcasts from the topic
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        match codec::encode_event(&event) {
                            Ok(text) => {
                                if sender.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                error!(connection = %connection_id, error = %e, "Encode failed");
                                metrics::record_error("encode");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(connection = %connection_id, skipped, "Subscriber lagged, oldest events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Receive from WebSocket
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&text, &connection_id, &mut session, &state);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Tolerate clients that send JSON in binary frames
                        match std::str::from_utf8(&data) {
                            Ok(text) => handle_text(text, &connection_id, &mut session, &state),
                            Err(_) => {
                                warn!(connection = %connection_id, "Non-UTF-8 binary frame");
                                metrics::record_error("decode");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(connection = %connection_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(connection = %connection_id, error = %e, "WebSocket error");
                        metrics::record_error("websocket");
                        break;
                    }
                    None => {
                        debug!(connection = %connection_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Cleanup: detach from the topic before announcing the leave, so the
    // departing connection is not counted among the recipients.
    drop(events);
    state.broker.unsubscribe_all(&connection_id);

    // A join was relayed on this connection; tell the room who left.
    if let Some(username) = session.take_username() {
        info!(user = %username, "User disconnected");
        let leave = ChatEvent::with(username, "", EventKind::Leave);
        metrics::record_event("leave");
        let recipients = state.broker.publish(&topic, leave);
        metrics::record_broadcast(recipients);
    }

    debug!(connection = %connection_id, "WebSocket disconnected");
}

/// Decode one inbound text frame and relay it.
///
/// Malformed frames are rejected here, before the relay: the offending
/// client's action silently fails to broadcast and other clients are
/// unaffected.
fn handle_text(
    text: &str,
    connection_id: &str,
    session: &mut SessionContext,
    state: &Arc<AppState>,
) {
    let frame = match codec::decode_frame(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(connection = %connection_id, error = %e, "Rejected inbound frame");
            metrics::record_error("decode");
            return;
        }
    };

    let (event, kind_label) = match frame {
        ClientFrame::Send { event } => (relay::relay_message(event), "message"),
        ClientFrame::Join { event } => (relay::relay_join(event, session), "join"),
    };

    metrics::record_event(kind_label);
    let recipients = state.broker.publish(&state.config.relay.topic, event);
    metrics::record_broadcast(recipients);

    debug!(connection = %connection_id, recipients, "Event broadcast");
}
