//! WebSocket upgrade and connection lifecycle for the alert hub (spec.md
//! §4.6), grounded on `websocket/handler.rs`'s split sender/receiver +
//! forwarding-task shape.

use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::gateway::state::AppState;
use crate::tenant::TenantId;

use super::hub::{GroupKey, WsHub};
use super::messages::WsOutboundMessage;

const PING_INTERVAL: Duration = Duration::from_secs(20);
const MAX_MISSED_PONGS: u32 = 3;

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    pub token: String,
}

/// `GET /ws/{tenantId}/{storeCode}?token={jwt}` (spec.md §4.6).
pub async fn stock_alert_ws(
    ws: WebSocketUpgrade,
    axum::extract::Path((tenant_id, store_code)): axum::extract::Path<(String, String)>,
    Query(query): Query<WsAuthQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    // spec.md §4.6 step 1/2: reject before upgrading (close code 1008 is
    // the WebSocket-level equivalent once a socket is actually open; here
    // the upgrade itself is simply refused with 401).
    let claims = match state.jwt_issuer.verify(&query.token) {
        Ok(claims) => claims,
        Err(_) => return axum::http::StatusCode::UNAUTHORIZED.into_response(),
    };
    let token_tenant = match claims.tenant_id() {
        Ok(t) => t,
        Err(_) => return axum::http::StatusCode::UNAUTHORIZED.into_response(),
    };
    if token_tenant.as_str() != tenant_id {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, tenant_id, store_code))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, tenant_id: String, store_code: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = WsHub::new_channel();
    let key = GroupKey { tenant_id: tenant_id.clone(), store_code: store_code.clone() };
    let conn_id = state.ws_hub.register(key.clone(), tx);

    let ack = WsOutboundMessage::Connection {
        status: "connected",
        tenant_id: tenant_id.clone(),
        store_code: store_code.clone(),
        timestamp: chrono::Utc::now(),
    };
    if let Ok(json) = serde_json::to_string(&ack) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    if let Ok(parsed_tenant) = TenantId::parse(&tenant_id) {
        for alert in state.stock_engine.catch_up_alerts(&parsed_tenant, &store_code).await {
            if let Ok(json) = serde_json::to_string(&alert) {
                let _ = sender.send(Message::Text(json.into())).await;
            }
        }
    }

    let pong_seen = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let pong_seen_for_recv = pong_seen.clone();

    let mut send_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PING_INTERVAL);
        let mut missed = 0u32;
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    let Ok(json) = serde_json::to_string(&msg) else { continue };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    if pong_seen.swap(false, std::sync::atomic::Ordering::Relaxed) {
                        missed = 0;
                    } else {
                        missed += 1;
                    }
                    if missed > MAX_MISSED_PONGS || sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Pong(_) => {
                    pong_seen_for_recv.store(true, std::sync::atomic::Ordering::Relaxed);
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.ws_hub.deregister(&key, conn_id);
}
