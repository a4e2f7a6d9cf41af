use serde::Serialize;

/// Which pipeline stage an in-flight operation is in. The header label is
/// derived from this alone, so it can never drift out of sync with the
/// per-message progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    Uploading,
    Populating,
    Extracting,
    Thinking,
}

impl ProcessingStep {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Uploading => "Uploading file...",
            Self::Populating => "Populating session with file data...",
            Self::Extracting => "Extracting structured data from file...",
            Self::Thinking => "Thinking...",
        }
    }
}

/// Progress state of one upload message. The message is created once the
/// upload itself has succeeded, so `Populating` is the initial stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Populating,
    Extracting,
    Ready,
    /// Populate or extract failed; remaining stages were aborted.
    Failed,
}

impl UploadStage {
    /// The header label while this stage is running, if any.
    #[must_use]
    pub fn step(self) -> Option<ProcessingStep> {
        match self {
            Self::Populating => Some(ProcessingStep::Populating),
            Self::Extracting => Some(ProcessingStep::Extracting),
            Self::Ready | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// Render state of one line of a progress message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMark {
    Done,
    Active,
    Pending,
    Error,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLine {
    pub mark: StageMark,
    pub text: String,
}

impl StageLine {
    fn new(mark: StageMark, text: impl Into<String>) -> Self {
        Self {
            mark,
            text: text.into(),
        }
    }
}

/// The finite-state progress record attached to an upload message, replacing
/// ad-hoc string rewrites with a single stage field and a pure renderer.
#[derive(Debug, Clone, Serialize)]
pub struct UploadProgress {
    pub file_name: String,
    pub size_bytes: u64,
    pub stage: UploadStage,
}

impl UploadProgress {
    #[must_use]
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
            stage: UploadStage::Populating,
        }
    }

    fn size_kb(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let kb = self.size_bytes as f64 / 1024.0;
        format!("{kb:.1}KB")
    }

    /// Pure mapping from stage to display lines.
    #[must_use]
    pub fn lines(&self) -> Vec<StageLine> {
        let uploaded = format!(
            "File \"{}\" ({}) uploaded successfully",
            self.file_name,
            self.size_kb()
        );
        let populating = "Populating session with file data...";
        let populated = "Session populated successfully";
        let extracting = "Extracting structured data from file...";
        let extracted = "Structured data extracted successfully";

        match self.stage {
            UploadStage::Populating => vec![
                StageLine::new(StageMark::Done, uploaded),
                StageLine::new(StageMark::Active, populating),
                StageLine::new(StageMark::Pending, extracting),
            ],
            UploadStage::Extracting => vec![
                StageLine::new(StageMark::Done, uploaded),
                StageLine::new(StageMark::Done, populated),
                StageLine::new(StageMark::Active, extracting),
            ],
            UploadStage::Ready => vec![
                StageLine::new(StageMark::Done, uploaded),
                StageLine::new(StageMark::Done, populated),
                StageLine::new(StageMark::Done, extracted),
                StageLine::new(
                    StageMark::Note,
                    "Your file is ready! You can now ask questions about it.",
                ),
            ],
            UploadStage::Failed => vec![
                StageLine::new(StageMark::Done, uploaded),
                StageLine::new(
                    StageMark::Error,
                    "Error occurred during processing. Please try again.",
                ),
            ],
        }
    }
}
