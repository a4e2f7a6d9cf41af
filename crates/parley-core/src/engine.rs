use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::error::{CoreError, Result};
use crate::model::{PendingMessage, Response, SessionId, UploadedFile};
use crate::preview;
use crate::progress::{ProcessingStep, UploadProgress, UploadStage};
use crate::session::{Session, SessionRegistry};

/// Literal fallback when a 2xx answer carries no response field.
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// Fixed terminal entry for a failed answer call. The question is never lost.
pub const ANSWER_APOLOGY: &str = "Sorry, I couldn't process your question. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
}

impl Notice {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Engine-to-UI notifications. Transcript contents are read back through the
/// shared registry; events only say that something changed.
#[derive(Debug, Clone)]
pub enum UiEvent {
    SessionStarted(SessionId),
    Transcript,
    StructuredData,
    Step(Option<ProcessingStep>),
    Pending(Option<PendingMessage>),
    Notice(Notice),
}

/// UI-to-engine commands.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// One submit action: optional question text plus attached files.
    Submit { text: String, files: Vec<PathBuf> },
    /// Start a fresh backend session and make it active.
    NewChat,
}

/// Sequences the upload pipeline and the question-answer flow against a
/// [`Backend`], mutating the shared [`SessionRegistry`] and emitting
/// [`UiEvent`]s after every visible change.
pub struct ChatEngine<B> {
    backend: B,
    registry: Arc<Mutex<SessionRegistry>>,
    events: mpsc::UnboundedSender<UiEvent>,
    pending: Mutex<Option<PendingMessage>>,
    step: Mutex<Option<ProcessingStep>>,
}

impl<B: Backend> ChatEngine<B> {
    #[must_use]
    pub fn new(
        backend: B,
        registry: Arc<Mutex<SessionRegistry>>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            backend,
            registry,
            events,
            pending: Mutex::new(None),
            step: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn registry(&self) -> Arc<Mutex<SessionRegistry>> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn pending(&self) -> Option<PendingMessage> {
        self.pending.lock().unwrap().clone()
    }

    #[must_use]
    pub fn current_step(&self) -> Option<ProcessingStep> {
        *self.step.lock().unwrap()
    }

    fn emit(&self, event: UiEvent) {
        // The receiver may be gone in headless one-shot mode.
        let _ = self.events.send(event);
    }

    fn notify(&self, notice: Notice) {
        self.emit(UiEvent::Notice(notice));
    }

    fn set_step(&self, step: Option<ProcessingStep>) {
        *self.step.lock().unwrap() = step;
        self.emit(UiEvent::Step(step));
    }

    fn set_pending(&self, pending: Option<PendingMessage>) {
        *self.pending.lock().unwrap() = pending.clone();
        self.emit(UiEvent::Pending(pending));
    }

    fn active_session_id(&self) -> Option<SessionId> {
        self.registry
            .lock()
            .unwrap()
            .active()
            .map(|s| s.id.clone())
    }

    /// Start a backend session and make it active. Falls back to a locally
    /// generated id when the backend is unreachable; uploads stay disabled
    /// until a backend session exists.
    pub async fn start_session(&self) -> SessionId {
        let id = match self.backend.start_session().await {
            Ok(id) => {
                tracing::info!(session = %id, "backend session started");
                self.registry.lock().unwrap().adopt(id.clone());
                id
            }
            Err(e) => {
                tracing::warn!(error = %e, "start_session failed, using local fallback id");
                self.notify(Notice::info(
                    "Backend unreachable; started a local session (uploads disabled)",
                ));
                self.registry.lock().unwrap().create_local().id.clone()
            }
        };
        self.emit(UiEvent::SessionStarted(id.clone()));
        id
    }

    /// Pull the backend's session list into the sidebar. Best-effort.
    pub async fn refresh_sessions(&self) {
        match self.backend.list_sessions().await {
            Ok(ids) => {
                let mut registry = self.registry.lock().unwrap();
                for id in ids {
                    registry.track_remote(id);
                }
                drop(registry);
                self.emit(UiEvent::Transcript);
            }
            Err(e) => tracing::debug!(error = %e, "list_sessions failed"),
        }
    }

    /// One submit action: upload any attached files, then — if every upload
    /// succeeded, text is present, and the session has structured data —
    /// submit the text as a question.
    pub async fn submit(&self, text: &str, files: &[PathBuf]) {
        let text = text.trim();
        if text.is_empty() && files.is_empty() {
            return;
        }

        if !files.is_empty() {
            let has_backend_session = self
                .registry
                .lock()
                .unwrap()
                .active()
                .is_some_and(|s| s.remote);
            if !has_backend_session {
                self.notify(Notice::error(
                    "A backend session is required before uploading files",
                ));
                return;
            }

            // Per-file pipelines run concurrently; a failure never cancels
            // siblings already in flight.
            let results = join_all(files.iter().map(|p| self.upload_file(p))).await;
            self.set_step(None);

            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                self.notify(Notice::error(format!(
                    "{failed} out of {} files failed to upload",
                    files.len()
                )));
                return;
            }
        }

        let can_answer = self
            .registry
            .lock()
            .unwrap()
            .active()
            .is_some_and(Session::can_answer);
        if !text.is_empty() && can_answer {
            self.ask(text).await;
        }
    }

    /// The per-file pipeline: read → upload → progress message → populate →
    /// extract. Only read/upload failures count against the submit's
    /// aggregate; populate/extract failures are terminal in the transcript.
    async fn upload_file(&self, path: &Path) -> Result<()> {
        let Some(session) = self.active_session_id() else {
            return Err(CoreError::NoActiveSession);
        };

        self.set_step(Some(ProcessingStep::Uploading));

        let loaded = match preview::load(path).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read file");
                return Err(e);
            }
        };
        let record = loaded.record;
        let file_name = record.name.clone();

        if let Err(e) = self
            .backend
            .upload_document(&session, &file_name, loaded.bytes)
            .await
        {
            tracing::warn!(error = %e, file = %file_name, "upload failed");
            return Err(e.into());
        }

        let message_id = {
            let mut registry = self.registry.lock().unwrap();
            registry.append_file(&session, record.clone())?;
            registry.append_message(
                &session,
                format!("Uploaded file: {file_name}"),
                Response::Progress(UploadProgress::new(&file_name, record.size)),
                Some(record),
            )?
        };
        self.emit(UiEvent::Transcript);

        self.set_step(Some(ProcessingStep::Populating));
        if let Err(e) = self.backend.populate_session(&session).await {
            tracing::warn!(error = %e, file = %file_name, "populate failed");
            self.fail_progress(&session, message_id);
            return Ok(());
        }

        self.set_step(Some(ProcessingStep::Extracting));
        {
            let mut registry = self.registry.lock().unwrap();
            let _ = registry.update_progress(&session, message_id, UploadStage::Extracting);
        }
        self.emit(UiEvent::Transcript);
        match self.backend.extract_policy_data(&session).await {
            Ok(data) => {
                let mut registry = self.registry.lock().unwrap();
                // Ignore-on-missing is fine here: the session cannot vanish.
                let _ = registry.set_structured_data(&session, data);
                let _ = registry.update_progress(&session, message_id, UploadStage::Ready);
                drop(registry);
                self.emit(UiEvent::StructuredData);
                self.emit(UiEvent::Transcript);
            }
            Err(e) => {
                tracing::warn!(error = %e, file = %file_name, "extract failed");
                self.fail_progress(&session, message_id);
            }
        }
        Ok(())
    }

    fn fail_progress(&self, session: &SessionId, message: crate::model::MessageId) {
        let _ = self
            .registry
            .lock()
            .unwrap()
            .update_progress(session, message, UploadStage::Failed);
        self.emit(UiEvent::Transcript);
    }

    /// Submit a question. The pending echo appears before any network round
    /// trip; success, a malformed body, and failure each still produce
    /// exactly one terminal transcript entry.
    pub async fn ask(&self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            return;
        }
        let Some(session) = self.active_session_id() else {
            return;
        };

        self.set_pending(Some(PendingMessage::new(question)));
        self.set_step(Some(ProcessingStep::Thinking));

        let response = match self.backend.fetch_response(&session, question).await {
            Ok(Some(answer)) => Response::Structured(answer),
            Ok(None) => Response::Text(NO_RESPONSE_FALLBACK.into()),
            Err(e) => {
                tracing::warn!(error = %e, "answer call failed");
                self.notify(Notice::error("Failed to get a response from the assistant"));
                Response::Text(ANSWER_APOLOGY.into())
            }
        };

        self.set_pending(None);
        if let Err(e) = self
            .registry
            .lock()
            .unwrap()
            .append_message(&session, question, response, None)
        {
            tracing::error!(error = %e, "failed to append answer message");
        }
        self.emit(UiEvent::Transcript);
        self.set_step(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use crate::model::{Confidence, StructuredAnswer};

    fn make_engine(mock: MockBackend) -> (ChatEngine<MockBackend>, mpsc::UnboundedReceiver<UiEvent>)
    {
        let registry = Arc::new(Mutex::new(SessionRegistry::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        (ChatEngine::new(mock, registry, tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn notices(events: &[UiEvent]) -> Vec<&Notice> {
        events
            .iter()
            .filter_map(|e| match e {
                UiEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, len: usize) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![b'x'; len]).unwrap();
        path
    }

    #[tokio::test]
    async fn start_session_adopts_server_id() {
        let (engine, _rx) = make_engine(MockBackend::default());
        let id = engine.start_session().await;
        assert_eq!(id.as_str(), "mock-session");
        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        assert!(registry.active().unwrap().remote);
    }

    #[tokio::test]
    async fn start_session_falls_back_to_local_id() {
        let mock = MockBackend {
            fail_start: true,
            ..MockBackend::default()
        };
        let (engine, mut rx) = make_engine(mock);
        engine.start_session().await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        assert!(!registry.active().unwrap().remote);
        drop(registry);

        let events = drain(&mut rx);
        assert_eq!(notices(&events).len(), 1);
        assert_eq!(notices(&events)[0].severity, Severity::Info);
    }

    #[tokio::test]
    async fn empty_submit_is_a_noop() {
        let mock = MockBackend::default();
        let (engine, _rx) = make_engine(mock.clone());
        engine.start_session().await;

        engine.submit("   ", &[]).await;

        assert!(engine.pending().is_none());
        // Only the start_session call reached the backend.
        assert_eq!(mock.calls(), vec!["start_session".to_string()]);
    }

    #[tokio::test]
    async fn successful_chain_reaches_ready_and_stores_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "report.pdf", 2048);
        let mock = MockBackend::default();
        let (engine, _rx) = make_engine(mock.clone());
        engine.start_session().await;

        engine.submit("", std::slice::from_ref(&path)).await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert_eq!(session.files.len(), 1);
        assert_eq!(session.files[0].name, "report.pdf");
        assert_eq!(session.files[0].size, 2048);
        assert_eq!(
            session.structured_data,
            Some(serde_json::json!({"policy_number": "P-100"}))
        );
        match &session.messages[0].response {
            Response::Progress(p) => {
                assert_eq!(p.stage, UploadStage::Ready);
                assert!(p.lines().iter().any(|l| l.text.contains("report.pdf")));
            }
            other => panic!("expected progress message, got {other:?}"),
        }
        drop(registry);
        assert!(engine.current_step().is_none());
    }

    #[tokio::test]
    async fn populate_failure_is_terminal_and_skips_extract() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.txt", 64);
        let mock = MockBackend {
            fail_populate: true,
            ..MockBackend::default()
        };
        let (engine, _rx) = make_engine(mock.clone());
        engine.start_session().await;

        engine.submit("", std::slice::from_ref(&path)).await;

        assert!(
            !mock
                .calls()
                .iter()
                .any(|c| c.starts_with("extract_policy_data"))
        );
        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert!(session.structured_data.is_none());
        match &session.messages[0].response {
            Response::Progress(p) => assert_eq!(p.stage, UploadStage::Failed),
            other => panic!("expected progress message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn extract_failure_leaves_structured_data_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.txt", 64);
        let mock = MockBackend {
            fail_extract: true,
            ..MockBackend::default()
        };
        let (engine, _rx) = make_engine(mock);
        engine.start_session().await;

        engine.submit("", std::slice::from_ref(&path)).await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert!(session.structured_data.is_none());
        match &session.messages[0].response {
            Response::Progress(p) => assert_eq!(p.stage, UploadStage::Failed),
            other => panic!("expected progress message, got {other:?}"),
        }
        drop(registry);
    }

    #[tokio::test]
    async fn upload_without_backend_session_makes_no_network_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "a.txt", 64);
        let mock = MockBackend {
            fail_start: true,
            ..MockBackend::default()
        };
        let (engine, mut rx) = make_engine(mock.clone());
        engine.start_session().await;
        let _ = drain(&mut rx);

        engine.submit("question too", std::slice::from_ref(&path)).await;

        let events = drain(&mut rx);
        assert_eq!(notices(&events).len(), 1);
        assert_eq!(notices(&events)[0].severity, Severity::Error);
        // Only the failed start_session call; the upload never went out.
        assert_eq!(mock.calls(), vec!["start_session".to_string()]);
    }

    #[tokio::test]
    async fn question_echo_appears_before_answer_resolves() {
        let mock = MockBackend::default();
        let (engine, mut rx) = make_engine(mock);
        engine.start_session().await;
        {
            let registry = engine.registry();
            let mut registry = registry.lock().unwrap();
            let id = registry.active_id().unwrap().clone();
            registry
                .set_structured_data(&id, serde_json::json!({}))
                .unwrap();
        }
        let _ = drain(&mut rx);

        engine.submit("What is the deductible?", &[]).await;

        let events = drain(&mut rx);
        let pending_set = events.iter().position(
            |e| matches!(e, UiEvent::Pending(Some(p)) if p.query == "What is the deductible?"),
        );
        let transcript = events
            .iter()
            .position(|e| matches!(e, UiEvent::Transcript));
        assert!(pending_set.unwrap() < transcript.unwrap());

        assert!(engine.pending().is_none());
        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].query, "What is the deductible?");
        assert!(matches!(
            session.messages[0].response,
            Response::Structured(_)
        ));
    }

    #[tokio::test]
    async fn question_without_structured_data_is_gated_off() {
        let mock = MockBackend::default();
        let (engine, _rx) = make_engine(mock.clone());
        engine.start_session().await;

        engine.submit("premature question", &[]).await;

        assert!(
            !mock
                .calls()
                .iter()
                .any(|c| c.starts_with("fetch_response"))
        );
    }

    #[tokio::test]
    async fn failed_answer_becomes_apology_with_one_notice() {
        let mock = MockBackend {
            fail_answer: true,
            ..MockBackend::default()
        };
        let (engine, mut rx) = make_engine(mock);
        engine.start_session().await;
        let _ = drain(&mut rx);

        engine.ask("Will this fail?").await;

        let events = drain(&mut rx);
        assert_eq!(notices(&events).len(), 1);

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].query, "Will this fail?");
        match &session.messages[0].response {
            Response::Text(t) => assert_eq!(t, ANSWER_APOLOGY),
            other => panic!("expected apology text, got {other:?}"),
        }
        drop(registry);
        assert!(engine.pending().is_none());
        assert!(engine.current_step().is_none());
    }

    #[tokio::test]
    async fn absent_answer_field_degrades_to_fallback() {
        let mock = MockBackend::with_answers(vec![None]);
        let (engine, _rx) = make_engine(mock);
        engine.start_session().await;

        engine.ask("malformed?").await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        match &session.messages[0].response {
            Response::Text(t) => assert_eq!(t, NO_RESPONSE_FALLBACK),
            other => panic!("expected fallback text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn structured_answer_survives_intact() {
        let answer = StructuredAnswer {
            answer: "The deductible is $500.".into(),
            confidence: Some(Confidence { score: 0.91 }),
            citations: vec![],
        };
        let mock = MockBackend::with_answers(vec![Some(answer)]);
        let (engine, _rx) = make_engine(mock);
        engine.start_session().await;

        engine.ask("What is the deductible?").await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        match &session.messages[0].response {
            Response::Structured(a) => {
                assert_eq!(a.answer, "The deductible is $500.");
                assert!((a.confidence.unwrap().score - 0.91).abs() < f32::EPSILON);
            }
            other => panic!("expected structured answer, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn batch_partial_failure_aggregates_and_suppresses_question() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_file(&dir, "one.txt", 10),
            write_file(&dir, "bad.txt", 10),
            write_file(&dir, "three.txt", 10),
        ];
        let mock = MockBackend {
            fail_upload_matching: Some("bad".into()),
            ..MockBackend::default()
        };
        let (engine, mut rx) = make_engine(mock.clone());
        engine.start_session().await;
        let _ = drain(&mut rx);

        engine.submit("What is covered?", &files).await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        let session = registry.active().unwrap();
        assert_eq!(session.files.len(), 2);
        drop(registry);

        let events = drain(&mut rx);
        let errors: Vec<_> = notices(&events)
            .into_iter()
            .filter(|n| n.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].text, "1 out of 3 files failed to upload");

        assert!(
            !mock
                .calls()
                .iter()
                .any(|c| c.starts_with("fetch_response"))
        );
    }

    #[tokio::test]
    async fn refresh_sessions_tracks_backend_ids() {
        let mock = MockBackend {
            session_id: "remote-1".into(),
            ..MockBackend::default()
        };
        let (engine, _rx) = make_engine(mock);
        engine.refresh_sessions().await;

        let registry = engine.registry();
        let registry = registry.lock().unwrap();
        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.sessions()[0].id.as_str(), "remote-1");
        // Discovered sessions never steal focus.
        assert!(registry.active().is_none());
    }
}
