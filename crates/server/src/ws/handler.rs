use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dispatch::{self, Publisher};
use crate::models::AuthUser;
use crate::ws::events::{ClientEvent, ServerEvent};
use crate::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    query: axum::extract::Query<std::collections::HashMap<String, String>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    let auth_user = extract_session(&state, &headers, &query).await;
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth_user))
}

async fn extract_session(
    state: &AppState,
    headers: &axum::http::HeaderMap,
    query: &std::collections::HashMap<String, String>,
) -> Option<AuthUser> {
    let token_from_query = query.get("token").map(|t| t.as_str());

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    let token_from_cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            c.trim()
                .strip_prefix("bridge.session_token=")
                .map(|t| t.to_string())
        })
        .next();

    let token = token_from_query
        .map(|t| t.to_string())
        .or(auth_header)
        .or(token_from_cookie)?;

    if token.is_empty() {
        return None;
    }

    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"SELECT u.id, u.username, s.expires_at
           FROM sessions s
           JOIN users u ON u.id = s.user_id
           WHERE s.token = ?"#,
    )
    .bind(&token)
    .fetch_optional(&state.db)
    .await
    .ok()??;

    let now = chrono::Utc::now().to_rfc3339();
    if row.2 < now {
        return None;
    }

    Some(AuthUser {
        id: row.0,
        username: row.1,
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, auth_user: Option<AuthUser>) {
    let user = match auth_user {
        Some(u) => u,
        None => return,
    };

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let client_id = state.presence.join(&user.id, tx).await;
    tracing::debug!("user {} ({}) connected", user.username, user.id);

    // Task to forward messages from mpsc to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive loop
    let state_clone = state.clone();
    let user_clone = user.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => {
                    let text_str: &str = &text;
                    if let Ok(event) = serde_json::from_str::<ClientEvent>(text_str) {
                        handle_client_event(&state_clone, &user_clone, event).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.presence.leave(client_id).await;
    tracing::debug!("user {} ({}) disconnected", user.username, user.id);
}

async fn handle_client_event(state: &AppState, user: &AuthUser, event: ClientEvent) {
    let publisher = state.presence.as_ref();

    match event {
        ClientEvent::SendMessage { receiver_id, text } => {
            let result = dispatch::send_message(
                &state.db,
                publisher,
                &user.id,
                &receiver_id,
                Some(text),
                None,
            )
            .await;

            if let Err(e) = result {
                publisher
                    .notify(
                        &user.id,
                        &ServerEvent::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
            }
        }
        ClientEvent::Typing { target_id } => {
            dispatch::forward_typing(publisher, &user.id, &target_id, true).await;
        }
        ClientEvent::StopTyping { target_id } => {
            dispatch::forward_typing(publisher, &user.id, &target_id, false).await;
        }
        ClientEvent::Ping => {}
    }
}
