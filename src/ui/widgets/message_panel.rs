use crate::app::WizardApp;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub fn draw_message_panel(frame: &mut Frame, area: Rect, app: &WizardApp) {
    let progress;
    let (text, is_error) = match &app.message {
        Some(m) => (m.text.as_str(), m.is_error),
        None => match app.progress {
            Some((done, total)) => {
                progress = format!("Installed {} of {} files", done, total);
                (progress.as_str(), false)
            }
            None if app.blocked => ("Working...", false),
            None => return,
        },
    };

    let (title, style) = if is_error {
        (" Error ", app.theme.error_style())
    } else {
        (" Info ", app.theme.action_style())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
        .title_style(style.add_modifier(Modifier::BOLD));

    let text_style = if is_error { style } else { app.theme.text_style() };
    let paragraph = Paragraph::new(Line::from(Span::styled(text, text_style)))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
