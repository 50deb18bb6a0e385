use crate::event::{PromptKind, PromptRequest};
use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub fn draw_prompt(frame: &mut Frame, area: Rect, prompt: &PromptRequest, theme: &Theme) {
    let answers = match prompt.kind {
        PromptKind::Confirm => Line::from(vec![
            Span::styled("  y", theme.success_style().add_modifier(Modifier::BOLD)),
            Span::raw(" - Yes    "),
            Span::styled("n", theme.error_style().add_modifier(Modifier::BOLD)),
            Span::raw(" - No"),
        ]),
        PromptKind::Notice => Line::from(Span::styled("Press any key", theme.dim_style())),
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(prompt.message.as_str(), theme.text_style())),
        Line::from(""),
        answers,
    ];

    let width = 56u16.min(area.width.saturating_sub(4));
    let dialog_area = Layout::centered_box(area, width, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.accent_style())
        .title(format!(" {} ", prompt.title))
        .title_style(theme.accent_style().add_modifier(Modifier::BOLD));

    frame.render_widget(Clear, dialog_area);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        dialog_area,
    );
}
