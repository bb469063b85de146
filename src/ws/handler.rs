//! WebSocket upgrade handler: attaches a client to a session's live event
//! stream via the `WsManager`.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::api::state::SharedState;
use crate::game::SessionCode;

use super::manager::ClientId;
use super::messages::{WsCommand, WsEvent};

/// GET /ws/sessions/{code}: upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(code): Path<SessionCode>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, code, state))
}

/// Core WebSocket session logic.
async fn handle_socket(socket: WebSocket, code: SessionCode, state: SharedState) {
    // Unknown code: report and close.
    let initial_event = match state.sessions.get(code).await {
        Ok(session) => WsEvent::subscribed(&session),
        Err(e) => {
            let (mut sink, _) = socket.split();
            let err = WsEvent::error(&e.to_string());
            let _ = sink.send(Message::Text(err.to_json().into())).await;
            let _ = sink.close().await;
            return;
        }
    };

    let (client_id, mut rx) = state.ws.subscribe(code).await;
    let (mut sink, mut stream) = socket.split();

    if sink
        .send(Message::Text(initial_event.to_json().into()))
        .await
        .is_err()
    {
        cleanup(&state, code, client_id).await;
        return;
    }

    // Writer task: forward manager events to the socket.
    let writer_state = state.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
        cleanup(&writer_state, code, client_id).await;
    });

    // Reader task: client commands.
    let reader_state = state.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, code, client_id, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    // Idempotent.
    cleanup(&state, code, client_id).await;
}

/// Process a client-sent text message. Replies go to the sender only.
async fn handle_client_message(
    state: &SharedState,
    code: SessionCode,
    client_id: ClientId,
    text: &str,
) {
    let cmd = match serde_json::from_str::<WsCommand>(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(code, "invalid WS command: {e}");
            let reply = WsEvent::error(&format!("invalid command: {e}"));
            state.ws.send_to(code, client_id, reply).await;
            return;
        }
    };

    match cmd {
        WsCommand::Ping => {
            state.ws.send_to(code, client_id, WsEvent::pong()).await;
        }
        WsCommand::Subscribe { code: requested } => {
            // The connection is bound to the code in its URL; a subscribe
            // just re-sends the current snapshot of that session.
            let reply = if requested != code {
                WsEvent::error(&format!(
                    "connection is bound to session {code}, not {requested}"
                ))
            } else {
                match state.sessions.get(code).await {
                    Ok(session) => WsEvent::subscribed(&session),
                    Err(e) => WsEvent::error(&e.to_string()),
                }
            };
            state.ws.send_to(code, client_id, reply).await;
        }
        WsCommand::Unsubscribe { code: requested } => {
            debug!(code, requested, "client requested unsubscribe");
            if requested == code {
                state.ws.unsubscribe(code, client_id).await;
            }
        }
    }
}

async fn cleanup(state: &SharedState, code: SessionCode, client_id: ClientId) {
    state.ws.unsubscribe(code, client_id).await;
    let remaining = state.ws.subscriber_count(code).await;
    debug!(code, client_id, remaining, "WS session cleaned up");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify the handler function signature compiles as an Axum handler.
    #[tokio::test]
    async fn handler_type_check() {
        fn assert_handler<F, Fut, R>(_: F)
        where
            F: FnOnce(WebSocketUpgrade, Path<SessionCode>, State<SharedState>) -> Fut,
            Fut: std::future::Future<Output = R>,
            R: IntoResponse,
        {
        }
        assert_handler(ws_handler);
    }
}
