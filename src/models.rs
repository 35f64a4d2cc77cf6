// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded sketch. `identity` is whatever reference the upload event
/// supplied (the page sends `name:size:lastModified`); it only answers
/// "did the user pick a different file", it is not a content hash.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub identity: String,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub data: Bytes,
    pub uploaded_at: DateTime<Utc>,
}

/// First-pass extraction returned by the draft model as strict JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramDraft {
    #[serde(rename = "chartType")]
    pub chart_type: String,
    pub reason: String,
    pub code: String,
}

/// Styled Mermaid text, ready for rendering and download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledDiagram {
    pub text: String,
}

pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 2.5;
pub const ZOOM_STEP: f32 = 0.5;
pub const ZOOM_DEFAULT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub zoom_level: f32,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            zoom_level: ZOOM_DEFAULT,
        }
    }
}

impl ViewParams {
    pub fn zoom_in(self) -> Self {
        Self {
            zoom_level: (self.zoom_level + ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX),
        }
    }

    pub fn zoom_out(self) -> Self {
        Self {
            zoom_level: (self.zoom_level - ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX),
        }
    }

    pub fn zoom_reset(self) -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Processing,
    Completed,
    Failed,
}

/// The per-session aggregate. Mutated only through `SessionState::apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub last_upload: Option<String>,
    pub status: GenerationStatus,
    pub draft: Option<DiagramDraft>,
    pub styled: Option<StyledDiagram>,
    pub view: ViewParams,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            last_upload: None,
            status: GenerationStatus::Idle,
            draft: None,
            styled: None,
            view: ViewParams::default(),
        }
    }
}

/// Serialized projection the page re-renders from after every event.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub status: GenerationStatus,
    pub has_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styled_code: Option<String>,
    pub zoom: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
