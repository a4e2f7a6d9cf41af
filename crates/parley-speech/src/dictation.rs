//! Dictation session state: merges live transcripts with typed text.

/// Idle ⇄ listening state machine around a dictation capture.
///
/// Starting snapshots the input buffer as a fixed base; every interim
/// transcript is merged against that base rather than the live buffer, so
/// re-delivered cumulative transcripts never duplicate text.
#[derive(Debug, Default)]
pub struct Dictation {
    listening: bool,
    base: String,
}

impl Dictation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Enter listening, snapshotting the current input as the merge base.
    pub fn start(&mut self, current_input: &str) {
        self.listening = true;
        self.base = current_input.to_owned();
    }

    /// Merge a cumulative interim transcript against the snapshot base.
    /// Returns the full replacement input text, or `None` when idle (a late
    /// event after stop is dropped).
    #[must_use]
    pub fn apply(&self, transcript: &str) -> Option<String> {
        if !self.listening {
            return None;
        }
        let transcript = transcript.trim_start();
        if transcript.is_empty() {
            return Some(self.base.clone());
        }
        let base = self.base.trim_end();
        if base.is_empty() {
            Some(transcript.to_owned())
        } else {
            Some(format!("{base} {transcript}"))
        }
    }

    /// Explicit stop or platform end-of-utterance.
    pub fn stop(&mut self) {
        self.listening = false;
        self.base.clear();
    }

    /// Capture errors force idle; the caller surfaces the notice.
    pub fn fail(&mut self) {
        tracing::debug!("dictation capture failed, returning to idle");
        self.stop();
    }
}
