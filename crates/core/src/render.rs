use std::time::{Duration, Instant};

/// How long the "Copied!" confirmation stays up.
pub const COPY_CONFIRMATION: Duration = Duration::from_secs(2);

/// A block of result text; single line breaks are kept as separate lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub lines: Vec<String>,
}

/// Split result text into paragraphs on blank lines.
pub fn paragraphs(text: &str) -> Vec<Paragraph> {
    let mut out = Vec::new();
    let mut lines = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !lines.is_empty() {
                out.push(Paragraph {
                    lines: std::mem::take(&mut lines),
                });
            }
        } else {
            lines.push(line.to_string());
        }
    }

    if !lines.is_empty() {
        out.push(Paragraph { lines });
    }

    out
}

/// Paragraphs joined back for terminal output, with an optional indent
pub fn render_plain(text: &str, indent: &str) -> String {
    paragraphs(text)
        .iter()
        .map(|p| {
            p.lines
                .iter()
                .map(|line| format!("{}{}", indent, line))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyConfirmation {
    copied_at: Option<Instant>,
}

impl CopyConfirmation {
    pub fn mark(&mut self, now: Instant) {
        self.copied_at = Some(now);
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPY_CONFIRMATION)
    }

    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_visible(now) { "Copied!" } else { "Copy" }
    }
}
