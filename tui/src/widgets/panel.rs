//! Panel Widgets
//!
//! Centered cards for the intro and stage-results overlays.

use companion_core::{IntroPanel, StageResultsPanel};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};

use crate::theme::{PANEL_ACCENT, PANEL_BG, PANEL_TEXT, PANEL_TITLE, STAR_GOLD};

/// Card width in columns (clamped to the area)
const CARD_WIDTH: u16 = 48;

/// Rectangle of `width` × `height` centered in `area`
#[must_use]
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_card(title: &str, body: Vec<Line<'_>>, hint: &str, area: Rect, buf: &mut Buffer) {
    // borders + blank line + hint
    let height = body.len() as u16 + 4;
    let card = centered(area, CARD_WIDTH, height);
    Clear.render(card, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PANEL_ACCENT))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(PANEL_TITLE).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(PANEL_BG));

    let mut lines = body;
    lines.push(Line::default());
    lines.push(Line::styled(
        format!("[Enter] {hint}"),
        Style::default().fg(PANEL_ACCENT),
    ));

    Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(card, buf);
}

/// Intro overlay
pub struct IntroCard<'a> {
    panel: &'a IntroPanel,
}

impl<'a> IntroCard<'a> {
    pub fn new(panel: &'a IntroPanel) -> Self {
        Self { panel }
    }
}

impl Widget for IntroCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let body = self
            .panel
            .lines()
            .iter()
            .map(|line| Line::styled(line.as_str(), Style::default().fg(PANEL_TEXT)))
            .collect();
        render_card(self.panel.title(), body, self.panel.confirm_label(), area, buf);
    }
}

/// Stage-results overlay
pub struct ResultsCard<'a> {
    panel: &'a StageResultsPanel,
}

impl<'a> ResultsCard<'a> {
    pub fn new(panel: &'a StageResultsPanel) -> Self {
        Self { panel }
    }
}

impl Widget for ResultsCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let summary = self.panel.summary();
        let text = Style::default().fg(PANEL_TEXT);
        let accuracy = summary
            .accuracy()
            .map_or_else(|| "-".to_string(), |a| format!("{:.0}%", a * 100.0));

        let body = vec![
            Line::styled(summary.star_label(), Style::default().fg(STAR_GOLD)),
            Line::styled(format!("Distance  {} m", summary.distance), text),
            Line::styled(
                format!("Answers   {} ✓  {} ✗", summary.correct, summary.incorrect),
                text,
            ),
            Line::styled(format!("Accuracy  {accuracy}"), text),
            Line::styled(format!("Time      {}", summary.elapsed_label()), text),
        ];
        render_card(self.panel.title(), body, self.panel.continue_label(), area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::StageSummary;
    use std::time::Duration;

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 40, 10), Rect::new(20, 7, 40, 10));
        assert_eq!(centered(area, 100, 30), area);
    }

    #[test]
    fn test_intro_card_shows_title_lines_and_hint() {
        let panel = IntroPanel::new(
            "Welcome",
            vec!["Cross the dunes".to_string()],
            "Start",
            || {},
        );
        let area = Rect::new(0, 0, 60, 16);
        let mut buf = Buffer::empty(area);
        IntroCard::new(&panel).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains(" Welcome "));
        assert!(text.contains("Cross the dunes"));
        assert!(text.contains("[Enter] Start"));
    }

    #[test]
    fn test_results_card_shows_summary() {
        let summary = StageSummary::new(240, 2, 4, 1, Duration::from_secs(95));
        let panel = StageResultsPanel::new("Done", summary, "Next", || {});
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        ResultsCard::new(&panel).render(area, &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("★★☆"));
        assert!(text.contains("240 m"));
        assert!(text.contains("80%"));
        assert!(text.contains("01:35"));
        assert!(text.contains("[Enter] Next"));
    }
}
