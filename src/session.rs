// src/session.rs
use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use log::info;
use uuid::Uuid;

use crate::errors::MermaiderError;
use crate::models::{
    DiagramDraft, GenerationStatus, SessionState, SessionView, StyledDiagram, UploadedImage,
    ViewParams,
};

/// Sessions idle for longer than this are dropped on the next create.
const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    UploadChanged { identity: String },
    GenerateStarted { identity: String },
    GenerateResolved {
        identity: String,
        outcome: PipelineOutcome,
    },
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

/// What a finished pipeline run reports back to the machine. The concrete
/// error stays with the handler; the machine only needs success or failure.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Success {
        draft: DiagramDraft,
        styled: StyledDiagram,
    },
    Failure,
}

impl SessionState {
    pub fn can_generate(&self) -> bool {
        self.last_upload.is_some()
            && matches!(
                self.status,
                GenerationStatus::Idle | GenerationStatus::Failed
            )
    }

    /// The transition function. Pure and total: guarded-off events return the
    /// state unchanged, so the caller may re-dispatch the same event freely.
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match event {
            SessionEvent::UploadChanged { identity } => {
                if self.last_upload.as_deref() == Some(identity.as_str()) {
                    return self;
                }
                // A different sketch supersedes everything, even mid-flight
                // generation; the stale run is dropped when it resolves.
                SessionState {
                    last_upload: Some(identity),
                    ..SessionState::default()
                }
            }
            SessionEvent::GenerateStarted { identity } => {
                if !self.can_generate() || self.last_upload.as_deref() != Some(identity.as_str())
                {
                    return self;
                }
                SessionState {
                    status: GenerationStatus::Processing,
                    draft: None,
                    styled: None,
                    ..self
                }
            }
            SessionEvent::GenerateResolved { identity, outcome } => {
                if self.status != GenerationStatus::Processing
                    || self.last_upload.as_deref() != Some(identity.as_str())
                {
                    // Stale tag: the sketch changed while this run was in
                    // flight. Its result must never be applied.
                    return self;
                }
                match outcome {
                    PipelineOutcome::Success { draft, styled } => SessionState {
                        status: GenerationStatus::Completed,
                        draft: Some(draft),
                        styled: Some(styled),
                        ..self
                    },
                    PipelineOutcome::Failure => SessionState {
                        status: GenerationStatus::Failed,
                        draft: None,
                        styled: None,
                        ..self
                    },
                }
            }
            SessionEvent::ZoomIn => self.zoomed(ViewParams::zoom_in),
            SessionEvent::ZoomOut => self.zoomed(ViewParams::zoom_out),
            SessionEvent::ZoomReset => self.zoomed(ViewParams::zoom_reset),
        }
    }

    fn zoomed(self, f: fn(ViewParams) -> ViewParams) -> SessionState {
        if self.status != GenerationStatus::Completed {
            return self;
        }
        SessionState {
            view: f(self.view),
            ..self
        }
    }
}

struct SessionEntry {
    state: SessionState,
    image: Option<UploadedImage>,
    touched_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            state: SessionState::default(),
            image: None,
            touched_at: Utc::now(),
        }
    }

    fn view(&self) -> SessionView {
        let state = &self.state;
        SessionView {
            status: state.status,
            has_image: self.image.is_some(),
            filename: self.image.as_ref().map(|i| i.filename.clone()),
            chart_type: state.draft.as_ref().map(|d| d.chart_type.clone()),
            reason: state.draft.as_ref().map(|d| d.reason.clone()),
            styled_code: state.styled.as_ref().map(|s| s.text.clone()),
            zoom: state.view.zoom_level,
            error: None,
        }
    }
}

/// All live sessions. Each session is independent; this mutex is the only
/// shared state and is never held across an await.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().expect("session store lock poisoned")
    }

    pub fn create(&self) -> Uuid {
        let mut sessions = self.lock();
        let cutoff = Utc::now() - Duration::hours(SESSION_TTL_HOURS);
        sessions.retain(|_, entry| entry.touched_at > cutoff);

        let id = Uuid::new_v4();
        sessions.insert(id, SessionEntry::new());
        info!("Created session {}", id);
        id
    }

    /// Stores the new sketch and applies `UploadChanged`. A changed identity
    /// resets any previous generation result.
    pub fn adopt_upload(
        &self,
        id: Uuid,
        image: UploadedImage,
    ) -> Result<SessionView, MermaiderError> {
        let mut sessions = self.lock();
        let entry = sessions
            .get_mut(&id)
            .ok_or(MermaiderError::SessionNotFound(id))?;

        if entry.state.last_upload.as_deref() != Some(image.identity.as_str()) {
            info!("Session {}: new sketch '{}', resetting state", id, image.filename);
        }
        entry.state = entry.state.clone().apply(SessionEvent::UploadChanged {
            identity: image.identity.clone(),
        });
        entry.image = Some(image);
        entry.touched_at = Utc::now();
        Ok(entry.view())
    }

    /// Checks the generation guard and, when it passes, transitions to
    /// `Processing` and hands back the sketch to run against. `Ok(None)`
    /// means the guard rejected (already processing, or nothing uploaded),
    /// and no pipeline run may start.
    pub fn begin_generation(
        &self,
        id: Uuid,
    ) -> Result<Option<UploadedImage>, MermaiderError> {
        let mut sessions = self.lock();
        let entry = sessions
            .get_mut(&id)
            .ok_or(MermaiderError::SessionNotFound(id))?;
        entry.touched_at = Utc::now();

        let image = match &entry.image {
            Some(image) if entry.state.can_generate() => image.clone(),
            _ => return Ok(None),
        };
        entry.state = entry.state.clone().apply(SessionEvent::GenerateStarted {
            identity: image.identity.clone(),
        });
        info!("Session {}: generation started for '{}'", id, image.filename);
        Ok(Some(image))
    }

    /// Applies the pipeline result tagged with the identity it was launched
    /// for. If the session has since adopted a different sketch the result is
    /// dropped unapplied.
    pub fn resolve_generation(
        &self,
        id: Uuid,
        identity: String,
        outcome: PipelineOutcome,
    ) -> Result<SessionView, MermaiderError> {
        let mut sessions = self.lock();
        let entry = sessions
            .get_mut(&id)
            .ok_or(MermaiderError::SessionNotFound(id))?;
        entry.state = entry
            .state
            .clone()
            .apply(SessionEvent::GenerateResolved { identity, outcome });
        entry.touched_at = Utc::now();
        Ok(entry.view())
    }

    pub fn apply(&self, id: Uuid, event: SessionEvent) -> Result<SessionView, MermaiderError> {
        let mut sessions = self.lock();
        let entry = sessions
            .get_mut(&id)
            .ok_or(MermaiderError::SessionNotFound(id))?;
        entry.state = entry.state.clone().apply(event);
        entry.touched_at = Utc::now();
        Ok(entry.view())
    }

    pub fn view(&self, id: Uuid) -> Result<SessionView, MermaiderError> {
        let sessions = self.lock();
        sessions
            .get(&id)
            .map(|entry| entry.view())
            .ok_or(MermaiderError::SessionNotFound(id))
    }

    /// The downloadable artifact: chart type label plus styled text, present
    /// only once generation has completed.
    pub fn export(&self, id: Uuid) -> Result<Option<(String, String)>, MermaiderError> {
        let sessions = self.lock();
        let entry = sessions
            .get(&id)
            .ok_or(MermaiderError::SessionNotFound(id))?;
        if entry.state.status != GenerationStatus::Completed {
            return Ok(None);
        }
        match (&entry.state.draft, &entry.state.styled) {
            (Some(draft), Some(styled)) => {
                Ok(Some((draft.chart_type.clone(), styled.text.clone())))
            }
            _ => Ok(None),
        }
    }
}
