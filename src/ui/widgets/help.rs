use crate::app::WizardApp;
use crate::ui::Layout;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub fn draw_help(frame: &mut Frame, area: Rect, app: &WizardApp) {
    let Some(help) = app.snapshot.as_ref().and_then(|s| s.help.as_deref()) else {
        return;
    };

    let mut lines: Vec<Line> = app
        .substitute(help)
        .lines()
        .map(|l| Line::from(l.to_string()))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        app.theme.dim_style(),
    )));

    let height = (lines.len() as u16 + 2).min(area.height);
    let width = 60u16.min(area.width.saturating_sub(4));
    let help_area = Layout::centered_box(area, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.dim_style())
        .title(" Help ")
        .title_style(app.theme.accent_style());

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        help_area,
    );
}
