use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::model::{Message, MessageId, Response, SessionId, UploadedFile};
use crate::progress::UploadStage;

/// One independent conversation thread. Lives only in memory for the app's
/// lifetime; never explicitly destroyed.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    /// True when the id was assigned by the backend. Uploads require a
    /// backend session; locally generated fallback sessions cannot upload.
    pub remote: bool,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    pub structured_data: Option<serde_json::Value>,
    pub files: Vec<UploadedFile>,
}

impl Session {
    fn new(id: SessionId, title: impl Into<String>, remote: bool) -> Self {
        Self {
            id,
            title: title.into(),
            remote,
            created_at: Utc::now(),
            messages: Vec::new(),
            structured_data: None,
            files: Vec::new(),
        }
    }

    /// Questions are only possible once structured data has been extracted.
    #[must_use]
    pub fn can_answer(&self) -> bool {
        self.structured_data.is_some()
    }
}

/// Holds every session plus the active one. All mutations are keyed by
/// session id and never touch other sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    next_message_id: u64,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a server-assigned id and make it active.
    pub fn adopt(&mut self, id: SessionId) -> &Session {
        self.insert(Session::new(id, "New Chat", true))
    }

    /// Create a session with a locally generated fallback id and make it
    /// active. Used when the backend is unreachable at startup.
    pub fn create_local(&mut self) -> &Session {
        self.insert(Session::new(SessionId::generate(), "New Chat", false))
    }

    fn insert(&mut self, session: Session) -> &Session {
        self.active = Some(session.id.clone());
        // Newest first, matching the sidebar ordering.
        self.sessions.insert(0, session);
        &self.sessions[0]
    }

    /// Register a backend session discovered via list-sessions without making
    /// it active. No-op when the id is already known.
    pub fn track_remote(&mut self, id: SessionId) {
        if self.get(&id).is_some() {
            return;
        }
        let short: String = id.as_str().chars().take(8).collect();
        let session = Session::new(id, format!("Session {short}"), true);
        self.sessions.push(session);
    }

    /// Make a previously created session the active view. The caller's
    /// visible transcript and structured data are fully replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSession`] if no session has that id.
    pub fn switch(&mut self, id: &SessionId) -> Result<()> {
        if self.sessions.iter().any(|s| &s.id == id) {
            self.active = Some(id.clone());
            Ok(())
        } else {
            Err(CoreError::UnknownSession(id.to_string()))
        }
    }

    #[must_use]
    pub fn active(&self) -> Option<&Session> {
        let id = self.active.as_ref()?;
        self.sessions.iter().find(|s| &s.id == id)
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// All sessions, newest first.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn get_mut(&mut self, id: &SessionId) -> Result<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| CoreError::UnknownSession(id.to_string()))
    }

    /// Append a message to a session's transcript, assigning its stable id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSession`] if no session has that id.
    pub fn append_message(
        &mut self,
        session: &SessionId,
        query: impl Into<String>,
        response: Response,
        attached_file: Option<UploadedFile>,
    ) -> Result<MessageId> {
        self.next_message_id += 1;
        let id = MessageId(self.next_message_id);
        let message = Message {
            id,
            query: query.into(),
            response,
            attached_file,
            created_at: Utc::now(),
        };
        self.get_mut(session)?.messages.push(message);
        Ok(id)
    }

    /// Rewrite the stage of a progress message in place. The one piece of
    /// server-confirmed mutable state in an otherwise append-only transcript.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownMessage`] if the message does not exist
    /// or is not a progress message.
    pub fn update_progress(
        &mut self,
        session: &SessionId,
        message: MessageId,
        stage: UploadStage,
    ) -> Result<()> {
        let s = self.get_mut(session)?;
        let found = s.messages.iter_mut().find(|m| m.id == message);
        match found {
            Some(Message {
                response: Response::Progress(progress),
                ..
            }) => {
                progress.stage = stage;
                Ok(())
            }
            _ => Err(CoreError::UnknownMessage(message.to_string())),
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSession`] if no session has that id.
    pub fn set_structured_data(
        &mut self,
        session: &SessionId,
        data: serde_json::Value,
    ) -> Result<()> {
        self.get_mut(session)?.structured_data = Some(data);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownSession`] if no session has that id.
    pub fn append_file(&mut self, session: &SessionId, file: UploadedFile) -> Result<()> {
        self.get_mut(session)?.files.push(file);
        Ok(())
    }
}
