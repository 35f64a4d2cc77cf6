// src/pipeline.rs
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::errors::MermaiderError;
use crate::models::{DiagramDraft, StyledDiagram, UploadedImage};
use crate::prompts::{DRAFT_PROMPT, STYLE_GUIDE, STYLE_PROMPT};
use crate::services::{GenerationBackend, ImageEncoder};

/// Two-stage generation: transcribe the sketch into a draft, then reformat
/// the draft against the style guide. Strictly sequential; the first failure
/// propagates and nothing is cached between calls.
pub struct Pipeline {
    backend: Arc<dyn GenerationBackend>,
    encoder: ImageEncoder,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            encoder: ImageEncoder::new(),
        }
    }

    /// Vision call with the fixed draft instruction. The model is told to
    /// answer with a bare JSON object of exactly `chartType`, `reason`,
    /// `code`; anything else is a `MalformedDraft`, never coerced.
    pub async fn draft_stage(
        &self,
        image: &UploadedImage,
    ) -> Result<DiagramDraft, MermaiderError> {
        let payload = self.encoder.encode(image)?;
        let raw = self
            .backend
            .generate_from_image(DRAFT_PROMPT, &payload)
            .await?;
        serde_json::from_str(&raw).map_err(|e| {
            MermaiderError::MalformedDraft(format!("draft did not match requested schema: {}", e))
        })
    }

    /// Text call that reformats draft code against the style guide. The raw
    /// response is taken as-is: if the model wraps it in fences despite the
    /// instruction, rendering fails downstream rather than here.
    pub async fn style_stage(&self, code: &str) -> Result<StyledDiagram, MermaiderError> {
        let instruction = STYLE_PROMPT.replace("{mermaid_code}", code);
        let text = self
            .backend
            .generate_from_text(STYLE_GUIDE, &instruction)
            .await?;
        Ok(StyledDiagram { text })
    }

    pub async fn run(
        &self,
        image: &UploadedImage,
    ) -> Result<(DiagramDraft, StyledDiagram), MermaiderError> {
        let start = Instant::now();

        let draft = self.draft_stage(image).await?;
        info!(
            "Draft stage done: chart type '{}' ({})",
            draft.chart_type, draft.reason
        );

        let styled = match self.style_stage(&draft.code).await {
            Ok(styled) => styled,
            Err(e) => {
                // The draft itself succeeded; callers currently discard it.
                warn!("Style stage failed after successful draft: {}", e);
                return Err(e);
            }
        };

        info!(
            "Generation completed in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok((draft, styled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TransportPayload;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DRAFT_JSON: &str =
        r#"{"chartType":"flowchart","reason":"linear steps","code":"flowchart TD\nA-->B"}"#;
    const STYLED_TEXT: &str =
        "flowchart TD\nA:::process-->B:::process\nclassDef process fill:#fff";

    struct StubBackend {
        draft_response: Option<String>,
        style_response: Option<String>,
        image_calls: AtomicUsize,
        text_calls: AtomicUsize,
        last_instruction: Mutex<Option<String>>,
    }

    impl StubBackend {
        fn new(draft: Option<&str>, style: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                draft_response: draft.map(String::from),
                style_response: style.map(String::from),
                image_calls: AtomicUsize::new(0),
                text_calls: AtomicUsize::new(0),
                last_instruction: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        async fn generate_from_image(
            &self,
            _instruction: &str,
            _image: &TransportPayload,
        ) -> Result<String, MermaiderError> {
            self.image_calls.fetch_add(1, Ordering::SeqCst);
            self.draft_response
                .clone()
                .ok_or_else(|| MermaiderError::Generation("stub vision failure".to_string()))
        }

        async fn generate_from_text(
            &self,
            _system_guide: &str,
            instruction: &str,
        ) -> Result<String, MermaiderError> {
            self.text_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_instruction.lock().unwrap() = Some(instruction.to_string());
            self.style_response
                .clone()
                .ok_or_else(|| MermaiderError::Generation("stub style failure".to_string()))
        }
    }

    fn sketch() -> UploadedImage {
        UploadedImage {
            identity: "sketch.png:3:0".into(),
            filename: "sketch.png".into(),
            content_type: "image/png".into(),
            size: 3,
            data: Bytes::from_static(b"png"),
            uploaded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn run_returns_draft_and_styled_pair() {
        let backend = StubBackend::new(Some(DRAFT_JSON), Some(STYLED_TEXT));
        let pipeline = Pipeline::new(backend.clone());

        let (draft, styled) = pipeline.run(&sketch()).await.unwrap();
        assert_eq!(draft.chart_type, "flowchart");
        assert_eq!(draft.reason, "linear steps");
        assert_eq!(draft.code, "flowchart TD\nA-->B");
        assert_eq!(styled.text, STYLED_TEXT);

        // The style instruction carries the draft code interpolated.
        let instruction = backend.last_instruction.lock().unwrap().clone().unwrap();
        assert!(instruction.contains("flowchart TD\nA-->B"));
        assert!(!instruction.contains("{mermaid_code}"));
    }

    #[tokio::test]
    async fn draft_failure_skips_style_stage() {
        let backend = StubBackend::new(None, Some(STYLED_TEXT));
        let pipeline = Pipeline::new(backend.clone());

        let err = pipeline.run(&sketch()).await.unwrap_err();
        assert!(matches!(err, MermaiderError::Generation(_)));
        assert_eq!(backend.text_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_json_draft_is_malformed() {
        let backend = StubBackend::new(Some("flowchart TD\nA-->B"), Some(STYLED_TEXT));
        let pipeline = Pipeline::new(backend.clone());

        let err = pipeline.run(&sketch()).await.unwrap_err();
        assert!(matches!(err, MermaiderError::MalformedDraft(_)));
        assert_eq!(backend.text_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_field_draft_is_malformed() {
        let backend = StubBackend::new(
            Some(r#"{"chartType":"flowchart","reason":"no code field"}"#),
            Some(STYLED_TEXT),
        );
        let pipeline = Pipeline::new(backend);

        let err = pipeline.run(&sketch()).await.unwrap_err();
        assert!(matches!(err, MermaiderError::MalformedDraft(_)));
    }

    #[tokio::test]
    async fn style_failure_propagates_after_good_draft() {
        let backend = StubBackend::new(Some(DRAFT_JSON), None);
        let pipeline = Pipeline::new(backend.clone());

        let err = pipeline.run(&sketch()).await.unwrap_err();
        assert!(matches!(err, MermaiderError::Generation(_)));
        assert_eq!(backend.image_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.text_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_image_fails_before_any_call() {
        let backend = StubBackend::new(Some(DRAFT_JSON), Some(STYLED_TEXT));
        let pipeline = Pipeline::new(backend.clone());

        let mut image = sketch();
        image.data = Bytes::new();
        let err = pipeline.run(&image).await.unwrap_err();
        assert!(matches!(err, MermaiderError::Encoding(_)));
        assert_eq!(backend.image_calls.load(Ordering::SeqCst), 0);
    }
}
