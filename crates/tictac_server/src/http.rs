//! HTTP surface of the relay: a WebSocket endpoint plus read-only routes.

use crate::binding::Relay;
use crate::code::RandomCodes;
use crate::config::ServerConfig;
use crate::error::SessionError;
use crate::protocol::{Intent, Notification};
use crate::registry::{SessionRegistry, SessionSummary};
use axum::body::Body;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::Request;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Builds the application router around a shared relay.
///
/// - `GET /ws`: WebSocket upgrade, one participant per socket
/// - `GET /sessions`: live session summaries as JSON
/// - `GET /health`: liveness probe
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .route("/sessions", get(sessions))
        .route("/health", get(health))
        .with_state(relay)
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
}

/// Binds the configured address and serves until the listener fails.
#[instrument(skip(config), fields(address = %config.bind_address()))]
pub async fn serve(config: &ServerConfig) -> std::io::Result<()> {
    let registry = SessionRegistry::with_codes(
        Arc::new(RandomCodes::new()),
        *config.max_code_attempts(),
    );
    let relay = Arc::new(Relay::new(registry));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Relay ready");
    axum::serve(listener, router(relay)).await
}

async fn upgrade(ws: WebSocketUpgrade, State(relay): State<Arc<Relay>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection(socket, relay))
}

async fn sessions(State(relay): State<Arc<Relay>>) -> Json<Vec<SessionSummary>> {
    Json(relay.registry().list())
}

async fn health() -> &'static str {
    "ok"
}

/// Pumps one socket: inbound frames become intents, notifications are
/// written by a dedicated task in the order the relay produced them.
async fn connection(socket: WebSocket, relay: Arc<Relay>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    let id = relay.connect(Box::new(tx));

    let writer = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let text = match serde_json::to_string(&notification) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode notification");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                debug!("Socket closed while writing");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Intent>(text.as_str()) {
                Ok(intent) => relay.handle(id, intent),
                Err(e) => relay.reject(id, &SessionError::MalformedMessage(e.to_string())),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%id, error = %e, "Socket error");
                break;
            }
        }
    }

    // Dropping the outlet ends the writer once its queue is empty.
    relay.disconnect(id);
    if let Err(e) = writer.await {
        warn!(%id, error = %e, "Writer task failed");
    }
}
