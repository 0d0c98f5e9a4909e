//! Request handling for the provider webhook endpoint.
//!
//! The provider delivers events either as `multipart/form-data` (the `fax`
//! field is a JSON-encoded string, file content is a binary part) or as
//! `application/json` (file content base64 encoded). Both shapes are decoded
//! into a [`WebhookDelivery`] before reaching the service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use faxgate_core::FaxService;
use faxgate_domain::constants::{PDF_FILE_TYPE, WEBHOOK_PATH};
use faxgate_domain::{FaxError, Result, WebhookDelivery, WebhookEventKind};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::integrations::sinch::SinchFax;

/// Upper bound for delivery bodies on both content types. Multi-page fax
/// documents arrive inline, base64 encoded in JSON bodies or as a binary
/// multipart field, so the cap sits well above any realistic fax size.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct WebhookState {
    pub service: Arc<FaxService>,
    pub enabled: bool,
}

pub(crate) fn router(state: WebhookState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle_webhook))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn handle_webhook(State(state): State<WebhookState>, request: Request) -> Response {
    if !state.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let delivery = if content_type.contains("multipart/form-data") {
        parse_multipart(request).await
    } else if content_type.contains("application/json") {
        parse_json(request).await
    } else {
        debug!(content_type, "rejected webhook with unsupported content type");
        return error_response(StatusCode::BAD_REQUEST, "Unsupported content type");
    };

    let delivery = match delivery {
        Ok(delivery) => delivery,
        Err(err) => {
            warn!(error = %err, "failed to parse webhook request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request data");
        }
    };

    dispatch(&state, delivery).await
}

async fn dispatch(state: &WebhookState, delivery: WebhookDelivery) -> Response {
    let result = match &delivery.event {
        WebhookEventKind::IncomingFax => {
            state.service.process_incoming_fax(&delivery).await.map(|_| ())
        }
        WebhookEventKind::FaxCompleted => {
            state.service.process_fax_completed(&delivery).await.map(|_| ())
        }
        // Acknowledged so the provider does not retry events we cannot use.
        WebhookEventKind::Unrecognized(name) => {
            warn!(event = %name, "ignoring unknown webhook event");
            Ok(())
        }
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "success"}))).into_response(),
        Err(FaxError::InvalidWebhookPayload(message)) => {
            warn!(error = %message, "webhook payload rejected");
            error_response(StatusCode::BAD_REQUEST, "Invalid request data")
        }
        Err(err) => {
            error!(error = %err, event = %delivery.event, "webhook processing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonWebhookBody {
    #[serde(default)]
    event: String,
    #[serde(default)]
    event_time: Option<String>,
    #[serde(default)]
    fax: Option<SinchFax>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
}

async fn parse_json(request: Request) -> Result<WebhookDelivery> {
    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await.map_err(|err| {
        FaxError::InvalidWebhookPayload(format!("unreadable request body: {err}"))
    })?;
    let body: JsonWebhookBody = serde_json::from_slice(&body)
        .map_err(|err| FaxError::InvalidWebhookPayload(format!("malformed JSON body: {err}")))?;

    let file = match body.file {
        Some(encoded) => Some(BASE64.decode(encoded.as_bytes()).map_err(|err| {
            FaxError::InvalidWebhookPayload(format!("invalid base64 file content: {err}"))
        })?),
        None => None,
    };

    Ok(WebhookDelivery {
        event: WebhookEventKind::parse(&body.event),
        event_time: body.event_time,
        fax: body.fax.map(SinchFax::into_domain),
        file,
        file_type: body.file_type,
    })
}

async fn parse_multipart(request: Request) -> Result<WebhookDelivery> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|err| {
        FaxError::InvalidWebhookPayload(format!("malformed multipart body: {err}"))
    })?;

    let mut event = String::new();
    let mut event_time = None;
    let mut fax = None;
    let mut file = None;
    let mut file_type = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        FaxError::InvalidWebhookPayload(format!("malformed multipart field: {err}"))
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("event") => event = field_text(field).await?,
            Some("eventTime") => event_time = Some(field_text(field).await?),
            Some("fax") => {
                let raw = field_text(field).await?;
                let parsed: SinchFax = serde_json::from_str(&raw).map_err(|err| {
                    FaxError::InvalidWebhookPayload(format!("malformed fax field: {err}"))
                })?;
                fax = Some(parsed.into_domain());
            }
            Some("file") => {
                let bytes = field_bytes(field).await?;
                file = Some(bytes.to_vec());
                // A binary upload is always the fax document itself.
                file_type = Some(PDF_FILE_TYPE.to_string());
            }
            _ => {}
        }
    }

    Ok(WebhookDelivery { event: WebhookEventKind::parse(&event), event_time, fax, file, file_type })
}

async fn field_text(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(|err| {
        FaxError::InvalidWebhookPayload(format!("unreadable multipart field: {err}"))
    })
}

async fn field_bytes(field: Field<'_>) -> Result<Bytes> {
    field.bytes().await.map_err(|err| {
        FaxError::InvalidWebhookPayload(format!("unreadable multipart field: {err}"))
    })
}
