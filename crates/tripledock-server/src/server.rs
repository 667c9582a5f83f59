//! WebSocket server and connection handling.
//!
//! Every connection gets its own [`GameSession`]; nothing is shared between
//! players.

use crate::commentary::Commentator;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::GameSession;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use tripledock_core::{BotDifficulty, GamePhase, Outcome};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// Live sessions keyed by connection
    pub sessions: DashMap<Uuid, GameSession>,
    /// Optional commentary collaborator handed to each session
    pub commentator: Option<Arc<dyn Commentator>>,
}

impl ServerState {
    pub fn new(commentator: Option<Arc<dyn Commentator>>) -> Self {
        Self {
            sessions: DashMap::new(),
            commentator,
        }
    }

    /// Open a session for a new connection
    pub fn open_session(&self, session_id: Uuid, updates: mpsc::UnboundedSender<ServerMessage>) {
        let session = GameSession::new(updates, self.commentator.clone());
        self.sessions.insert(session_id, session);
    }

    pub fn close_session(&self, session_id: Uuid) {
        self.sessions.remove(&session_id);
    }

    /// Open a session that is closed again when the returned guard drops
    fn open_scoped_session(
        &self,
        session_id: Uuid,
        updates: mpsc::UnboundedSender<ServerMessage>,
    ) -> ScopedSession<'_> {
        self.open_session(session_id, updates);
        ScopedSession {
            state: self,
            session_id,
        }
    }

    fn session(&self, session_id: Uuid) -> Option<GameSession> {
        self.sessions.get(&session_id).map(|s| s.clone())
    }
}

/// Removes its session on drop, including early returns and panics
struct ScopedSession<'a> {
    state: &'a ServerState,
    session_id: Uuid,
}

impl Drop for ScopedSession<'_> {
    fn drop(&mut self) {
        self.state.close_session(self.session_id);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tripledock server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let session_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let _session = state.open_scoped_session(session_id, tx);

    let welcome = ServerMessage::Welcome { session_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(session_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", session_id, e);
                    if let Some(session) = state.session(session_id) {
                        session.reply(ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        });
                    }
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", session_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", session_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    info!("Connection closed for {}", session_id);
    Ok(())
}

/// Handle a client message.
pub fn handle_message(session_id: Uuid, msg: ClientMessage, state: &ServerState) {
    let Some(session) = state.session(session_id) else {
        warn!("Message for unknown session {}", session_id);
        return;
    };

    match msg {
        ClientMessage::StartLevel { config, seed } => {
            if let Err(e) = session.start_level(config, seed) {
                session.reply(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }

        ClientMessage::Tap { tile_id } => session.tap(tile_id),

        ClientMessage::Hint { difficulty } => {
            let tile_id = session.hint(difficulty.unwrap_or(BotDifficulty::Hard));
            session.reply(ServerMessage::Hint { tile_id });
        }

        ClientMessage::Snapshot => {
            let snapshot = session.snapshot();
            let outcome = match snapshot.phase {
                GamePhase::Won => Some(Outcome::Won),
                GamePhase::Lost => Some(Outcome::Lost),
                _ => None,
            };
            session.reply(ServerMessage::Snapshot { snapshot });

            // Resend commentary so a refreshed client can show it again
            if let (Some(outcome), Some(text)) = (outcome, session.commentary()) {
                session.reply(ServerMessage::Commentary {
                    outcome,
                    text: Some(text),
                });
            }
        }

        ClientMessage::Ping => session.reply(ServerMessage::Pong),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripledock_core::LevelConfig;

    fn connect(state: &ServerState) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state.open_session(id, tx);
        (id, rx)
    }

    #[test]
    fn test_sessions_are_independent() {
        let state = ServerState::default();
        let (alice, mut alice_rx) = connect(&state);
        let (bob, _bob_rx) = connect(&state);

        handle_message(
            alice,
            ClientMessage::StartLevel {
                config: LevelConfig::default(),
                seed: Some(3),
            },
            &state,
        );

        assert_eq!(state.session(alice).unwrap().snapshot().phase, GamePhase::Playing);
        assert_eq!(state.session(bob).unwrap().snapshot().phase, GamePhase::Idle);
        assert!(matches!(alice_rx.try_recv(), Ok(ServerMessage::Events { .. })));
        assert!(matches!(alice_rx.try_recv(), Ok(ServerMessage::Snapshot { .. })));
    }

    #[test]
    fn test_bad_config_reports_error() {
        let state = ServerState::default();
        let (id, mut rx) = connect(&state);

        handle_message(
            id,
            ClientMessage::StartLevel {
                config: LevelConfig {
                    tile_count: 5,
                    ..LevelConfig::default()
                },
                seed: None,
            },
            &state,
        );

        match rx.try_recv() {
            Ok(ServerMessage::Error { message }) => assert!(message.contains("multiple of three")),
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[test]
    fn test_hint_ping_and_close() {
        let state = ServerState::default();
        let (id, mut rx) = connect(&state);

        handle_message(id, ClientMessage::Hint { difficulty: None }, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Hint { tile_id: None })));

        handle_message(id, ClientMessage::Ping, &state);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::Pong)));

        state.close_session(id);
        handle_message(id, ClientMessage::Ping, &state);
        assert!(rx.try_recv().is_err());
    }

    fn open_then_fail(state: &ServerState, id: Uuid) -> anyhow::Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let _session = state.open_scoped_session(id, tx);
        assert!(state.sessions.contains_key(&id));
        anyhow::bail!("welcome could not be sent")
    }

    #[test]
    fn test_scoped_session_closes_on_early_return() {
        let state = ServerState::default();
        let id = Uuid::new_v4();

        assert!(open_then_fail(&state, id).is_err());
        assert!(!state.sessions.contains_key(&id));
        assert!(state.sessions.is_empty());
    }
}
