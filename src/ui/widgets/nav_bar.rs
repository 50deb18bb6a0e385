use crate::app::WizardApp;
use crate::navigation::Button;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

fn button<'a>(app: &WizardApp, button: Button, key: &'a str, label: &'a str) -> Vec<Span<'a>> {
    if !button.visible {
        return Vec::new();
    }
    vec![
        Span::styled(key, app.theme.button_style(button.enabled)),
        Span::styled(format!(":{} ", label), app.theme.dim_style()),
    ]
}

pub fn draw_nav_bar(frame: &mut Frame, area: Rect, app: &WizardApp) {
    let Some(ref snapshot) = app.snapshot else {
        return;
    };
    let buttons = snapshot.buttons;

    let mut left = vec![Span::raw(" ")];
    if !app.fields.is_empty() {
        left.push(Span::styled("Tab", app.theme.action_style()));
        left.push(Span::styled(":field ", app.theme.dim_style()));
    }
    if snapshot.help.is_some() {
        left.push(Span::styled("F1", app.theme.action_style()));
        left.push(Span::styled(":help ", app.theme.dim_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(left)).style(app.theme.text_style()), area);

    let right: Vec<Span> = button(app, buttons.previous, "PgUp", "back")
        .into_iter()
        .chain(button(app, buttons.next, "Enter", "next"))
        .chain(button(app, buttons.quit, "Esc", "quit"))
        .collect();
    let right = Line::from(right);

    let right_width = right.width() as u16;
    if area.width > right_width {
        let right_area = Rect {
            x: area.x + area.width - right_width - 1,
            y: area.y,
            width: right_width + 1,
            height: 1,
        };
        frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), right_area);
    }
}
