//! WebSocket handler for real-time updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{future, sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use taskdeck_core::directory;
use taskdeck_core::realtime::{Connection, Frame, Scope};
use taskdeck_core::Permission;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    /// Board whose events the connection receives. The caller must be able
    /// to view it.
    pub board_id: Option<String>,
    /// Caller id for clients that cannot send the identity header.
    pub user_id: Option<String>,
}

/// WebSocket upgrade handler.
///
/// Every connection belongs to a known caller and watches one board the
/// caller can view: no identity → 401, no `board_id` → 400, no access → 403.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let CurrentUser(caller) =
        CurrentUser::resolve(&state, &headers, params.user_id.as_deref()).await?;
    let board_id = params
        .board_id
        .ok_or_else(|| ApiError::bad_request("missing board_id query parameter"))?;
    directory::authorize(state.store.as_ref(), &board_id, &caller.id, Permission::View).await?;

    if !state.hub.is_running() {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "realtime hub is shut down",
        ));
    }

    Ok(ws
        .on_failed_upgrade(|e| warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state, board_id, caller.id))
        .into_response())
}

/// Handle individual WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: AppState, board_id: String, user_id: String) {
    let scope = Scope::board(board_id.as_str(), user_id.as_str());
    let subscription = match state.hub.register(scope) {
        Ok(subscription) => subscription,
        Err(e) => {
            debug!(error = %e, "Rejecting WebSocket client");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    // Access can be revoked between the upgrade check and registration.
    if let Err(e) =
        directory::authorize(state.store.as_ref(), &board_id, &user_id, Permission::View).await
    {
        debug!(error = %e, board_id = %board_id, user_id = %user_id, "Board access lost before connecting");
        state.hub.unregister(subscription.id());
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let connection = Connection::new(subscription, state.connection.clone());
    debug!(connection_id = connection.id(), "WebSocket client connected");

    let (sender, receiver) = socket.split();
    let sink = sender.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(to_message(frame))));
    let stream = receiver.map(|message| message.map(from_message));

    // The connection logs its own outcome.
    let _ = connection.run(sink, stream).await;
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close => Message::Close(None),
    }
}

fn from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(data) => Frame::Ping(data.to_vec()),
        Message::Pong(data) => Frame::Pong(data.to_vec()),
        Message::Close(_) => Frame::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use taskdeck_core::board::BoardInput;
    use taskdeck_core::realtime::{ConnectionConfig, Event, EventKind, Hub};
    use taskdeck_core::user::{register_user, NewUser, User};
    use taskdeck_core::Role;
    use taskdeck_db::MemoryStore;
    use tokio_tungstenite::{connect_async, tungstenite};

    struct Server {
        addr: std::net::SocketAddr,
        store: Arc<MemoryStore>,
        hub: Hub,
    }

    impl Server {
        async fn start() -> Self {
            let store = Arc::new(MemoryStore::new());
            let hub = Hub::default();
            let state = AppState::new(store.clone(), hub.clone(), ConnectionConfig::default());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, create_router(state)).await });
            Self { addr, store, hub }
        }

        async fn user(&self, name: &str) -> User {
            let input = NewUser {
                name: name.to_string(),
                email: format!("{name}@example.com"),
            };
            register_user(self.store.as_ref(), &input).await.unwrap()
        }

        async fn board(&self, owner: &User) -> String {
            directory::create_board_with_owner(self.store.as_ref(), &BoardInput::new("Sprint", None), &owner.id)
                .await
                .unwrap()
                .board
                .id
        }

        fn url(&self, query: &str) -> String {
            format!("ws://{}/ws{}", self.addr, query)
        }

        fn board_url(&self, board_id: &str, user: &User) -> String {
            self.url(&format!("?board_id={}&user_id={}", board_id, user.id))
        }

        async fn wait_for_connections(&self, expected: usize) {
            tokio::time::timeout(Duration::from_secs(5), async {
                while self.hub.connection_count() != expected {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await
            .unwrap();
        }
    }

    fn rejected_with(result: Result<impl Sized, tungstenite::Error>, status: u16) -> bool {
        matches!(result, Err(tungstenite::Error::Http(ref response)) if response.status() == status)
    }

    #[tokio::test]
    async fn test_two_clients_receive_update() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let bob = server.user("bob").await;
        let board = server.board(&ada).await;
        directory::add_collaborator(server.store.as_ref(), &board, &bob.email, Role::Viewer)
            .await
            .unwrap();

        let (mut a, _) = connect_async(server.board_url(&board, &ada)).await.unwrap();
        let (mut b, _) = connect_async(server.board_url(&board, &bob)).await.unwrap();
        server.wait_for_connections(2).await;

        let update = Event::for_board(EventKind::Updated, board.as_str(), json!({ "id": "t1" }));
        assert_eq!(server.hub.publish(&update), 2);

        for client in [&mut a, &mut b] {
            match client.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    assert_eq!(text.as_str(), r#"{"type":"update","data":{"id":"t1"}}"#);
                }
                other => panic!("expected text frame, got {:?}", other.map(|r| r.is_ok())),
            }
        }

        server.hub.shutdown().await;
        for client in [&mut a, &mut b] {
            assert!(matches!(
                client.next().await,
                Some(Ok(tungstenite::Message::Close(_)))
            ));
        }
        assert_eq!(server.hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_client_disconnect_unregisters() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let board = server.board(&ada).await;

        let (mut client, _) = connect_async(server.board_url(&board, &ada)).await.unwrap();
        server.wait_for_connections(1).await;

        client.close(None).await.unwrap();
        server.wait_for_connections(0).await;
    }

    #[tokio::test]
    async fn test_anonymous_upgrade_is_unauthorized() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let board = server.board(&ada).await;

        assert!(rejected_with(connect_async(server.url("")).await, 401));
        assert!(rejected_with(
            connect_async(server.url(&format!("?board_id={board}"))).await,
            401
        ));
        assert!(rejected_with(
            connect_async(server.url(&format!("?board_id={board}&user_id=ghost"))).await,
            401
        ));
        assert_eq!(server.hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_upgrade_requires_viewable_board() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let carol = server.user("carol").await;
        let board = server.board(&ada).await;

        let without_board = server.url(&format!("?user_id={}", ada.id));
        assert!(rejected_with(connect_async(without_board).await, 400));
        assert!(rejected_with(connect_async(server.board_url(&board, &carol)).await, 403));
        assert_eq!(server.hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_removed_collaborator_is_disconnected() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let bob = server.user("bob").await;
        let board = server.board(&ada).await;
        directory::add_collaborator(server.store.as_ref(), &board, &bob.email, Role::Viewer)
            .await
            .unwrap();

        let (mut client, _) = connect_async(server.board_url(&board, &bob)).await.unwrap();
        server.wait_for_connections(1).await;

        directory::remove_collaborator(server.store.as_ref(), &server.hub, &board, &bob.id)
            .await
            .unwrap();
        assert!(matches!(
            client.next().await,
            Some(Ok(tungstenite::Message::Close(_)))
        ));
        server.wait_for_connections(0).await;

        let created = Event::for_board(EventKind::Created, board.as_str(), json!({ "id": "t1" }));
        assert_eq!(server.hub.publish(&created), 0);
    }

    #[tokio::test]
    async fn test_upgrade_refused_after_shutdown() {
        let server = Server::start().await;
        let ada = server.user("ada").await;
        let board = server.board(&ada).await;
        server.hub.shutdown().await;

        assert!(rejected_with(connect_async(server.board_url(&board, &ada)).await, 503));
    }
}
