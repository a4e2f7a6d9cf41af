use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;

use crate::error::{CoreError, Result};
use crate::model::{FilePreview, UploadedFile};

/// Coarse classification used for preview handling and MIME labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Spreadsheet,
    Presentation,
    WordDocument,
    Text,
}

impl FileKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" => Self::Image,
            "pdf" => Self::Pdf,
            "xls" | "xlsx" | "csv" => {
                if ext == "csv" {
                    // CSV is plain text despite being spreadsheet-shaped.
                    Self::Text
                } else {
                    Self::Spreadsheet
                }
            }
            "ppt" | "pptx" => Self::Presentation,
            "doc" | "docx" => Self::WordDocument,
            _ => Self::Text,
        }
    }

    /// MIME-ish type string recorded on the uploaded file.
    #[must_use]
    pub fn mime_type(self, name: &str) -> String {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match self {
            Self::Image => match ext.as_str() {
                "jpg" | "jpeg" => "image/jpeg".into(),
                "gif" => "image/gif".into(),
                "webp" => "image/webp".into(),
                "bmp" => "image/bmp".into(),
                _ => "image/png".into(),
            },
            Self::Pdf => "application/pdf".into(),
            Self::Spreadsheet => {
                if ext == "xls" {
                    "application/vnd.ms-excel".into()
                } else {
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".into()
                }
            }
            Self::Presentation => {
                if ext == "ppt" {
                    "application/vnd.ms-powerpoint".into()
                } else {
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation"
                        .into()
                }
            }
            Self::WordDocument => {
                if ext == "doc" {
                    "application/msword".into()
                } else {
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                        .into()
                }
            }
            Self::Text => "text/plain".into(),
        }
    }

    /// Office formats are not content-read; they resolve to an empty preview
    /// and get a type-specific placeholder viewer.
    #[must_use]
    pub fn skips_content(self) -> bool {
        matches!(self, Self::Spreadsheet | Self::Presentation | Self::WordDocument)
    }
}

/// A local file read into memory, ready for the upload pipeline.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub record: UploadedFile,
    pub bytes: Vec<u8>,
}

/// Read a local file and materialize its preview.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn load(path: &Path) -> Result<LoadedFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| CoreError::Other(format!("invalid file path: {}", path.display())))?;

    let bytes = tokio::fs::read(path).await?;
    let kind = FileKind::from_name(&name);
    let mime_type = kind.mime_type(&name);

    let content = match kind {
        FileKind::Image | FileKind::Pdf => {
            FilePreview::DataUrl(format!("data:{mime_type};base64,{}", BASE64.encode(&bytes)))
        }
        _ if kind.skips_content() => FilePreview::None,
        _ => FilePreview::Text(String::from_utf8_lossy(&bytes).into_owned()),
    };

    let record = UploadedFile {
        name,
        size: bytes.len() as u64,
        mime_type,
        uploaded_at: Utc::now(),
        content,
    };
    Ok(LoadedFile { record, bytes })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(FileKind::from_name("photo.JPG"), FileKind::Image);
        assert_eq!(FileKind::from_name("policy.pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_name("sheet.xlsx"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("deck.ppt"), FileKind::Presentation);
        assert_eq!(FileKind::from_name("letter.docx"), FileKind::WordDocument);
        assert_eq!(FileKind::from_name("notes.md"), FileKind::Text);
        assert_eq!(FileKind::from_name("noext"), FileKind::Text);
    }

    #[test]
    fn csv_reads_as_text() {
        assert_eq!(FileKind::from_name("data.csv"), FileKind::Text);
    }

    #[test]
    fn office_formats_skip_content() {
        assert!(FileKind::from_name("a.xlsx").skips_content());
        assert!(FileKind::from_name("a.doc").skips_content());
        assert!(!FileKind::from_name("a.pdf").skips_content());
        assert!(!FileKind::from_name("a.txt").skips_content());
    }

    #[tokio::test]
    async fn loads_text_file_with_text_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "hello preview").unwrap();

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.record.name, "notes.txt");
        assert_eq!(loaded.record.size, 13);
        assert_eq!(loaded.record.mime_type, "text/plain");
        match &loaded.record.content {
            FilePreview::Text(t) => assert_eq!(t, "hello preview"),
            other => panic!("expected text preview, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn loads_pdf_as_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();

        let loaded = load(&path).await.unwrap();
        match &loaded.record.content {
            FilePreview::DataUrl(url) => {
                assert!(url.starts_with("data:application/pdf;base64,"));
            }
            other => panic!("expected data url, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn office_file_loads_without_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, b"not really a spreadsheet").unwrap();

        let loaded = load(&path).await.unwrap();
        assert!(matches!(loaded.record.content, FilePreview::None));
        assert!(!loaded.bytes.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = load(Path::new("/nonexistent/file.txt")).await.unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
