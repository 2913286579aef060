use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{
    session::{FinishReason, Mode},
    state::GameState,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

/// Everything a frame needs, copied out of the shared state so drawing
/// never happens while the lock is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub mode: Mode,
    pub show_preview: bool,
    pub elapsed_secs: u64,
    pub symbols_typed: usize,
    pub current: Option<char>,
    pub next: Option<char>,
    pub finished: Option<FinishReason>,
}

impl From<&GameState> for View {
    fn from(state: &GameState) -> Self {
        let progress = state.progress();
        Self {
            mode: state.config().mode,
            show_preview: state.config().show_preview,
            elapsed_secs: progress.elapsed_secs,
            symbols_typed: progress.symbols_typed,
            current: state.current_target(),
            next: state.next_target(),
            finished: progress.finished,
        }
    }
}

/// Spaces would be invisible on screen.
fn display_symbol(c: char) -> String {
    match c {
        ' ' => "·".to_owned(),
        c => c.to_string(),
    }
}

impl View {
    pub fn time_line(&self) -> String {
        match self.mode {
            Mode::TimeLimited { limit_secs } => format!(
                "Time: {} / {} seconds ({}s left)",
                self.elapsed_secs,
                limit_secs,
                limit_secs.saturating_sub(self.elapsed_secs)
            ),
            Mode::FixedLength { target_length } => format!(
                "Time: {}s  Typed: {} / {}",
                self.elapsed_secs, self.symbols_typed, target_length
            ),
        }
    }

    pub fn headline(&self) -> Option<&'static str> {
        self.finished.map(|reason| match reason {
            FinishReason::AllTyped => "All symbols typed!",
            FinishReason::TimeExpired => "Time's up!",
            FinishReason::UserQuit => "Session stopped.",
            FinishReason::ReaderError => "Keyboard input failed, session aborted.",
        })
    }

    /// Final statistics as plain text, also printed once the terminal is restored.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if let Some(headline) = self.headline() {
            lines.push(headline.to_string());
        }
        lines.push(format!("Symbols typed: {}", self.symbols_typed));
        lines.push(format!("Time taken: {}s", self.elapsed_secs));
        lines
    }
}

impl Widget for &View {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_dim_style = Style::default()
            .patch(dim_style)
            .add_modifier(Modifier::ITALIC);

        let lines: Vec<Line> = match self.finished {
            Some(reason) => {
                let headline_style = match reason {
                    FinishReason::AllTyped | FinishReason::TimeExpired => green_bold_style,
                    FinishReason::UserQuit => bold_style.fg(Color::Yellow),
                    FinishReason::ReaderError => bold_style.fg(Color::Red),
                };
                self.summary_lines()
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| {
                        if i == 0 {
                            Line::from(Span::styled(text, headline_style))
                        } else {
                            Line::from(text)
                        }
                    })
                    .collect()
            }
            None => {
                let mut lines = vec![
                    Line::from(Span::styled(self.time_line(), Style::default().fg(Color::Cyan))),
                    Line::from(vec![
                        Span::raw("Match this symbol: "),
                        Span::styled(
                            self.current.map(display_symbol).unwrap_or_default(),
                            green_bold_style,
                        ),
                    ]),
                ];
                if self.show_preview {
                    if let Some(next) = self.next {
                        lines.push(Line::from(Span::styled(
                            format!("Next: {}", display_symbol(next)),
                            dim_style,
                        )));
                    }
                }
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "(esc) or (ctrl-c) to quit",
                    italic_dim_style,
                )));
                lines
            }
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([Constraint::Min(0)])
            .split(area);

        Paragraph::new(lines).render(chunks[0], buf);
    }
}
