use parley_core::progress::StageMark;
use parley_core::{Message, PendingMessage, Response, StructuredAnswer};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::App;
use crate::theme::Theme;

pub fn render(app: &App, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let theme = app.theme();
    let inner_height = area.height.saturating_sub(2) as usize;

    let mut lines: Vec<Line<'static>> = Vec::new();
    {
        let registry = app.registry().lock().unwrap();
        if let Some(session) = registry.active() {
            for (idx, message) in session.messages.iter().enumerate() {
                if idx > 0 {
                    lines.push(Line::default());
                }
                lines.extend(message_lines(message, &theme));
            }
        }
    }
    if let Some(pending) = app.pending() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.extend(pending_lines(pending, &theme));
    }

    let total = lines.len();
    let max_scroll = total.saturating_sub(inner_height);
    let scroll = max_scroll.saturating_sub(app.scroll_offset().min(max_scroll));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.panel_border)
                .title(" Chat "),
        )
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(paragraph, area);
}

/// Lines for one transcript entry: the user's query, then the response body.
pub fn message_lines(message: &Message, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!("You \u{25b8} {}", message.query),
        theme.user_message,
    ))];

    match &message.response {
        Response::Text(text) => {
            for part in text.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {part}"),
                    theme.assistant_message,
                )));
            }
        }
        Response::Structured(answer) => lines.extend(structured_lines(answer, theme)),
        Response::Progress(progress) => {
            for stage_line in progress.lines() {
                let (marker, style) = match stage_line.mark {
                    StageMark::Done => ("\u{2713}", theme.stage_done),
                    StageMark::Active => ("\u{2026}", theme.stage_active),
                    StageMark::Pending => ("\u{25cb}", theme.stage_pending),
                    StageMark::Error => ("\u{2717}", theme.stage_error),
                    StageMark::Note => (" ", theme.assistant_message),
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {marker} "), style),
                    Span::styled(stage_line.text.clone(), style),
                ]));
            }
        }
    }
    lines
}

fn structured_lines(answer: &StructuredAnswer, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for part in answer.answer.lines() {
        lines.push(Line::from(Span::styled(
            format!("  {part}"),
            theme.assistant_message,
        )));
    }
    if let Some(confidence) = answer.confidence {
        lines.push(Line::from(Span::styled(
            format!("  Confidence {}", confidence_bar(confidence.score)),
            theme.confidence_bar,
        )));
    }
    for citation in &answer.citations {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (citation.confidence.score * 100.0).round() as u8;
        lines.push(Line::from(Span::styled(
            format!(
                "  \u{2022} {} ({pct}%): {}",
                citation.document_name, citation.text_snippet
            ),
            theme.citation,
        )));
    }
    lines
}

fn pending_lines(pending: &PendingMessage, theme: &Theme) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("You \u{25b8} {}", pending.query),
            theme.user_message,
        )),
        Line::from(Span::styled("  \u{2026}".to_owned(), theme.pending_message)),
    ]
}

/// Ten-cell bar plus a rounded percentage, e.g. `████████░░ 87%`.
#[must_use]
pub fn confidence_bar(score: f32) -> String {
    let clamped = score.clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (clamped * 10.0).round() as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pct = (clamped * 100.0).round() as u8;
    format!(
        "{}{} {pct}%",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(10 - filled)
    )
}

#[cfg(test)]
mod tests {
    use parley_core::progress::{UploadProgress, UploadStage};
    use parley_core::{Citation, Confidence};

    use super::*;

    fn flatten(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|s| s.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    fn make_message(response: Response) -> Message {
        Message {
            id: parley_core::MessageId(1),
            query: "What is covered?".into(),
            response,
            attached_file: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn confidence_bar_endpoints() {
        assert_eq!(confidence_bar(0.0), "\u{2591}".repeat(10) + " 0%");
        assert_eq!(confidence_bar(1.0), "\u{2588}".repeat(10) + " 100%");
    }

    #[test]
    fn confidence_bar_clamps_out_of_range() {
        assert!(confidence_bar(1.7).ends_with("100%"));
        assert!(confidence_bar(-0.3).ends_with("0%"));
    }

    #[test]
    fn text_response_renders_query_then_body() {
        let message = make_message(Response::Text("Plain answer".into()));
        let rendered = flatten(&message_lines(&message, &Theme::dark()));
        assert!(rendered[0].contains("What is covered?"));
        assert!(rendered[1].contains("Plain answer"));
    }

    #[test]
    fn structured_response_shows_confidence_and_citations() {
        let message = make_message(Response::Structured(StructuredAnswer {
            answer: "Flood damage is covered.".into(),
            confidence: Some(Confidence { score: 0.87 }),
            citations: vec![Citation {
                document_name: "policy.pdf".into(),
                confidence: Confidence { score: 0.92 },
                text_snippet: "flood damage up to the limit".into(),
            }],
        }));
        let rendered = flatten(&message_lines(&message, &Theme::dark()));
        assert!(rendered.iter().any(|l| l.contains("87%")));
        assert!(
            rendered
                .iter()
                .any(|l| l.contains("policy.pdf") && l.contains("92%"))
        );
    }

    #[test]
    fn progress_response_renders_stage_markers() {
        let message = make_message(Response::Progress(UploadProgress::new("report.pdf", 2048)));
        let rendered = flatten(&message_lines(&message, &Theme::dark()));
        assert!(rendered.iter().any(|l| l.contains("\u{2713}")));
        assert!(rendered.iter().any(|l| l.contains("report.pdf")));
    }

    #[test]
    fn failed_progress_renders_error_marker() {
        let mut progress = UploadProgress::new("report.pdf", 2048);
        progress.stage = UploadStage::Failed;
        let message = make_message(Response::Progress(progress));
        let rendered = flatten(&message_lines(&message, &Theme::dark()));
        assert!(rendered.iter().any(|l| l.contains("\u{2717}")));
    }

    #[test]
    fn pending_skeleton_echoes_query() {
        let pending = PendingMessage::new("Am I covered?");
        let rendered = flatten(&pending_lines(&pending, &Theme::dark()));
        assert!(rendered[0].contains("Am I covered?"));
        assert_eq!(rendered.len(), 2);
    }
}
