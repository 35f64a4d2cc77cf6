// src/handlers.rs
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use bytes::Bytes;
use futures_util::TryStreamExt;
use log::error;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::errors::MermaiderError;
use crate::models::{GenerationStatus, UploadedImage};
use crate::session::{PipelineOutcome, SessionEvent};

const GENERATION_FAILED_MESSAGE: &str =
    "Generation failed. The image might be too complex or unclear. Please try again.";

pub async fn create_session(data: web::Data<AppState>) -> HttpResponse {
    let session_id = data.sessions.create();
    HttpResponse::Ok().json(serde_json::json!({ "session_id": session_id }))
}

pub async fn get_session(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let view = data.sessions.view(path.into_inner())?;
    Ok(HttpResponse::Ok().json(view))
}

/// Accepts one sketch per request: a `file` part plus an optional `identity`
/// part carrying the upload event's content reference. A changed identity
/// resets the session's generation state.
pub async fn upload_sketch(
    path: web::Path<Uuid>,
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut identity: Option<String> = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().to_string();
        match name.as_str() {
            "file" if file.is_none() => {
                let filename = field
                    .content_disposition()
                    .get_filename()
                    .ok_or_else(|| {
                        MermaiderError::Validation("no filename provided".to_string())
                    })?
                    .to_string();
                let declared_type = field
                    .content_type()
                    .map(|ct| ct.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await? {
                    bytes.extend_from_slice(&chunk);
                }
                file = Some((filename, declared_type, bytes));
            }
            "identity" => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.try_next().await? {
                    bytes.extend_from_slice(&chunk);
                }
                let value = String::from_utf8_lossy(&bytes).trim().to_string();
                if !value.is_empty() {
                    identity = Some(value);
                }
            }
            _ => {}
        }
    }

    let (filename, declared_type, raw) = file.ok_or_else(|| {
        MermaiderError::Validation("no file part in upload".to_string())
    })?;

    // Invalid images are refused here so generation is never attempted on
    // undecodable bytes.
    let (prepared, media_type) = data.encoder.prepare(&raw, &declared_type)?;

    let image = UploadedImage {
        identity: identity.unwrap_or_else(|| filename.clone()),
        filename,
        content_type: media_type,
        size: prepared.len(),
        data: Bytes::from(prepared),
        uploaded_at: chrono::Utc::now(),
    };

    let view = data.sessions.adopt_upload(session_id, image)?;
    Ok(HttpResponse::Ok().json(view))
}

/// Runs the two-stage pipeline for the current sketch. The request suspends
/// until both stages finish; the session guard makes a second request a
/// no-op while one is in flight.
pub async fn generate_diagram(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();

    let image = match data.sessions.begin_generation(session_id)? {
        Some(image) => image,
        None => {
            let view = data.sessions.view(session_id)?;
            return Ok(match view.status {
                GenerationStatus::Processing => HttpResponse::Conflict().json(
                    serde_json::json!({ "error": "generation already in progress" }),
                ),
                GenerationStatus::Completed => HttpResponse::Conflict().json(
                    serde_json::json!({ "error": "diagram already generated; upload a new sketch first" }),
                ),
                _ => HttpResponse::BadRequest()
                    .json(serde_json::json!({ "error": "no sketch uploaded" })),
            });
        }
    };

    let identity = image.identity.clone();
    let outcome = match data.pipeline.run(&image).await {
        Ok((draft, styled)) => PipelineOutcome::Success { draft, styled },
        Err(e) => {
            error!("Diagram generation failed: {}", e);
            PipelineOutcome::Failure
        }
    };
    let failed = matches!(outcome, PipelineOutcome::Failure);

    // Tagged with the identity captured at start: if a different sketch was
    // adopted meanwhile, this resolution is dropped by the state machine.
    let mut view = data.sessions.resolve_generation(session_id, identity, outcome)?;
    if failed {
        view.error = Some(GENERATION_FAILED_MESSAGE.to_string());
    }
    Ok(HttpResponse::Ok().json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomAction {
    In,
    Out,
    Reset,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRequest {
    pub action: ZoomAction,
}

pub async fn zoom(
    path: web::Path<Uuid>,
    body: web::Json<ZoomRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let event = match body.action {
        ZoomAction::In => SessionEvent::ZoomIn,
        ZoomAction::Out => SessionEvent::ZoomOut,
        ZoomAction::Reset => SessionEvent::ZoomReset,
    };
    let view = data.sessions.apply(path.into_inner(), event)?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn download_diagram(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    match data.sessions.export(session_id)? {
        Some((chart_type, text)) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", download_filename(&chart_type)),
            ))
            .body(text)),
        None => Ok(HttpResponse::Conflict()
            .json(serde_json::json!({ "error": "no completed diagram to download" }))),
    }
}

/// File name derived from the chart type label, with a generic fallback when
/// the label is empty or unusable in a header.
fn download_filename(chart_type: &str) -> String {
    let label: String = chart_type
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if label.is_empty() {
        "diagram.txt".to_string()
    } else {
        format!("{}_diagram.txt", label)
    }
}
