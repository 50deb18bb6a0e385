use crate::app::WizardApp;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn draw_header(frame: &mut Frame, area: Rect, app: &WizardApp) {
    let title = app.substitute(&app.config.general.title);

    let left = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(title, app.theme.accent_style().add_modifier(Modifier::BOLD)),
    ]));
    frame.render_widget(left, area);

    let Some(ref snapshot) = app.snapshot else {
        return;
    };

    let mut spans = Vec::new();
    if app.is_dryrun() {
        spans.push(Span::styled("[DRYRUN] ", app.theme.error_style()));
    }
    if snapshot.step.total > 0 {
        spans.push(Span::styled(
            format!("Step {} of {}", snapshot.step.step, snapshot.step.total),
            app.theme.dim_style(),
        ));
    }
    spans.push(Span::raw(" "));

    let right = Paragraph::new(Line::from(spans)).alignment(Alignment::Right);
    frame.render_widget(right, area);
}
