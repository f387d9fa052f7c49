/// Realtime connection handlers
use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::realtime::{ConnectionMetrics, InboundMessage, MessageId};
use crate::services::AppContext;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    #[serde(flatten)]
    pub metrics: ConnectionMetrics,
    /// Channels with at least one handler
    pub channels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub handled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendPayload {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub id: MessageId,
}

/// GET /api/v1/connection
pub async fn get_status(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let status = ConnectionStatus {
        metrics: ctx.connection.metrics(),
        channels: ctx.channels.channels(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(status)))
}

/// Route a message through the channel registry as if it arrived on the transport
///
/// POST /api/v1/connection/dispatch
pub async fn dispatch_message(
    ctx: web::Data<AppContext>,
    req: web::Json<InboundMessage>,
) -> Result<HttpResponse> {
    let message = req.into_inner();
    let handled = ctx.channels.dispatch(&message);
    tracing::debug!(channel = %message.channel, kind = %message.kind, handled, "Injected inbound message");
    Ok(HttpResponse::Ok().json(ApiResponse::ok(DispatchResponse { handled })))
}

/// POST /api/v1/connection/send
pub async fn send_message(
    ctx: web::Data<AppContext>,
    req: web::Json<SendPayload>,
) -> Result<HttpResponse> {
    let SendPayload {
        channel,
        kind,
        payload,
    } = req.into_inner();

    match ctx.sender.send(channel, kind, payload) {
        Some(id) => Ok(HttpResponse::Accepted().json(ApiResponse::ok(SendResponse { id }))),
        None => {
            let state = ctx.connection.state();
            let reason = if ctx.connection.is_connected() {
                "transport rejected the message".to_string()
            } else {
                format!("connection is {state}")
            };
            Err(AppError::TransportUnavailable(reason))
        }
    }
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/connection")
            .route("", web::get().to(get_status))
            .route("/dispatch", web::post().to(dispatch_message))
            .route("/send", web::post().to(send_message)),
    );
}
