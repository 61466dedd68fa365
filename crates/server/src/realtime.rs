//! WebSocket push layer.
//!
//! Clients connect to `/ws?token=<jwt>`; the token is verified before the
//! upgrade. Each connection gets an mpsc channel registered in a dashmap hub.
//! Connect/disconnect flips the user's stored presence and broadcasts a
//! presence event.
//!
//! Server -> client events (JSON, tagged `type`): `request_created`,
//! `request_state`, `notification`, `presence`, `typing`.
//!
//! Client -> server messages: `join` / `leave` a request room, `typing`
//! relayed to the room. Room membership is process-local state.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use models::notification;
use service::actor::Actor;
use service::auth::token;

use crate::auth::ServerState;
use crate::errors::ApiError;

pub mod events {
    pub const REQUEST_CREATED: &str = "request_created";
    pub const REQUEST_STATE: &str = "request_state";
    pub const NOTIFICATION: &str = "notification";
    pub const PRESENCE: &str = "presence";
    pub const TYPING: &str = "typing";
}

struct Conn {
    user_id: Uuid,
    tx: mpsc::Sender<String>,
}

/// Registry of live WebSocket connections and request rooms.
#[derive(Default)]
pub struct Hub {
    conns: DashMap<Uuid, Conn>,
    rooms: DashMap<Uuid, HashSet<Uuid>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, conn_id: Uuid, user_id: Uuid, tx: mpsc::Sender<String>) {
        self.conns.insert(conn_id, Conn { user_id, tx });
    }

    fn unregister(&self, conn_id: Uuid) {
        self.conns.remove(&conn_id);
        self.rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
    }

    pub fn is_user_connected(&self, user_id: Uuid) -> bool {
        self.conns.iter().any(|c| c.user_id == user_id)
    }

    /// Send to every connection. Slow consumers are skipped, not awaited.
    pub fn broadcast(&self, event: &Value) {
        let payload = event.to_string();
        for conn in self.conns.iter() {
            let _ = conn.tx.try_send(payload.clone());
        }
    }

    /// Send to every connection belonging to one user.
    pub fn send_to_user(&self, user_id: Uuid, event: &Value) {
        let payload = event.to_string();
        for conn in self.conns.iter() {
            if conn.user_id == user_id {
                let _ = conn.tx.try_send(payload.clone());
            }
        }
    }

    fn join(&self, conn_id: Uuid, request_id: Uuid) {
        self.rooms.entry(request_id).or_default().insert(conn_id);
    }

    fn leave(&self, conn_id: Uuid, request_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(&request_id) {
            members.remove(&conn_id);
        }
    }

    fn send_room(&self, request_id: Uuid, except: Uuid, event: &Value) {
        let Some(members) = self.rooms.get(&request_id) else { return };
        let payload = event.to_string();
        for conn_id in members.iter() {
            if *conn_id == except {
                continue;
            }
            if let Some(conn) = self.conns.get(conn_id) {
                let _ = conn.tx.try_send(payload.clone());
            }
        }
    }

    /// Push freshly persisted inbox rows to their owners.
    pub fn push_notifications(&self, rows: &[notification::Model]) {
        for n in rows {
            self.send_to_user(n.user_id, &json!({ "type": events::NOTIFICATION, "data": n }));
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Client -> server messages.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsIncoming {
    Join { request_id: Uuid },
    Leave { request_id: Uuid },
    Typing { request_id: Uuid },
}

/// Authenticate the token, then upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
    State(state): State<ServerState>,
) -> Result<Response, ApiError> {
    let claims = token::verify(&state.auth.jwt_secret, &q.token)?;
    let actor = claims.actor()?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, actor)))
}

async fn handle_socket(socket: WebSocket, state: ServerState, actor: Actor) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let first_conn = !state.hub.is_user_connected(actor.id);
    state.hub.register(conn_id, actor.id, tx);
    if first_conn {
        if let Err(e) =
            service::user_service::set_presence(&state.db, actor.id, models::user::PRESENCE_ONLINE)
                .await
        {
            warn!(user_id = %actor.id, error = %e, "presence update failed");
        }
        state.hub.broadcast(&json!({
            "type": events::PRESENCE,
            "user_id": actor.id,
            "presence": models::user::PRESENCE_ONLINE,
        }));
    }
    debug!(user_id = %actor.id, %conn_id, "ws connected");

    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let incoming: WsIncoming = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(user_id = %actor.id, error = %e, "invalid ws message");
                        continue;
                    }
                };
                match incoming {
                    WsIncoming::Join { request_id } => state.hub.join(conn_id, request_id),
                    WsIncoming::Leave { request_id } => state.hub.leave(conn_id, request_id),
                    WsIncoming::Typing { request_id } => state.hub.send_room(
                        request_id,
                        conn_id,
                        &json!({
                            "type": events::TYPING,
                            "request_id": request_id,
                            "user_id": actor.id,
                        }),
                    ),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.hub.unregister(conn_id);
    sender_task.abort();
    if !state.hub.is_user_connected(actor.id) {
        if let Err(e) =
            service::user_service::set_presence(&state.db, actor.id, models::user::PRESENCE_OFFLINE)
                .await
        {
            warn!(user_id = %actor.id, error = %e, "presence update failed");
        }
        state.hub.broadcast(&json!({
            "type": events::PRESENCE,
            "user_id": actor.id,
            "presence": models::user::PRESENCE_OFFLINE,
        }));
    }
    debug!(user_id = %actor.id, %conn_id, "ws disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incoming_messages_parse() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"type": "join", "request_id": "{}"}}"#, id);
        let msg: WsIncoming = serde_json::from_str(&raw).unwrap();
        assert!(matches!(msg, WsIncoming::Join { request_id } if request_id == id));

        let raw = format!(r#"{{"type": "typing", "request_id": "{}"}}"#, id);
        assert!(matches!(serde_json::from_str(&raw).unwrap(), WsIncoming::Typing { .. }));

        assert!(serde_json::from_str::<WsIncoming>(r#"{"type": "dance"}"#).is_err());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let hub = Hub::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        hub.register(Uuid::new_v4(), user_a, tx_a);
        hub.register(Uuid::new_v4(), user_b, tx_b);

        hub.broadcast(&json!({"type": "presence"}));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());

        hub.send_to_user(user_a, &json!({"type": "notification"}));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn typing_goes_to_room_members_except_sender() {
        let hub = Hub::new();
        let conn_a = Uuid::new_v4();
        let conn_b = Uuid::new_v4();
        let conn_c = Uuid::new_v4();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        let (tx_c, mut rx_c) = mpsc::channel(4);
        hub.register(conn_a, Uuid::new_v4(), tx_a);
        hub.register(conn_b, Uuid::new_v4(), tx_b);
        hub.register(conn_c, Uuid::new_v4(), tx_c);

        let room = Uuid::new_v4();
        hub.join(conn_a, room);
        hub.join(conn_b, room);

        hub.send_room(room, conn_a, &json!({"type": "typing"}));
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_cleans_rooms() {
        let hub = Hub::new();
        let conn = Uuid::new_v4();
        let (tx, _rx) = mpsc::channel(4);
        let user = Uuid::new_v4();
        hub.register(conn, user, tx);
        let room = Uuid::new_v4();
        hub.join(conn, room);

        assert!(hub.is_user_connected(user));
        hub.unregister(conn);
        assert!(!hub.is_user_connected(user));
        assert!(hub.rooms.get(&room).is_none());
    }
}
