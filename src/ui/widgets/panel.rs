use crate::app::{Field, WizardApp};
use crate::config::PanelKind;
use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

pub fn draw_panel(frame: &mut Frame, area: Rect, app: &WizardApp) {
    let Some(panel) = app.panel() else {
        return;
    };

    let width = 64u16.min(area.width.saturating_sub(4));
    let height = 16u16.min(area.height);
    let panel_area = Layout::centered_box(area, width, height);

    let title = if panel.title.is_empty() {
        panel.id.clone()
    } else {
        app.substitute(&panel.title)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.dim_style())
        .title(format!(" {} ", title))
        .title_style(app.theme.accent_style());

    let inner = block.inner(panel_area);
    frame.render_widget(Clear, panel_area);
    frame.render_widget(block, panel_area);

    let inner = inner.inner(Margin::new(1, 0));
    let field_rows = (app.fields.len() * 2) as u16;
    let chunks = ratatui::layout::Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(2),              // Text
            Constraint::Length(field_rows),  // Fields
            Constraint::Length(1),           // Progress
        ])
        .split(inner);

    let text = Paragraph::new(app.substitute(&panel.text))
        .style(app.theme.text_style())
        .wrap(Wrap { trim: true });
    frame.render_widget(text, chunks[0]);

    for (i, field) in app.fields.iter().enumerate() {
        let y = chunks[1].y + (i as u16) * 2;
        if y + 2 > chunks[1].y + chunks[1].height {
            break;
        }
        draw_field(
            frame,
            Rect::new(chunks[1].x, y, chunks[1].width, 2),
            field,
            i == app.focused,
            &app.theme,
        );
    }

    if let (PanelKind::Install, Some((done, total))) = (panel.kind, app.progress) {
        let ratio = if total == 0 { 1.0 } else { done as f64 / total as f64 };
        let gauge = Gauge::default()
            .gauge_style(app.theme.success_style())
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!("{}/{}", done, total));
        frame.render_widget(gauge, chunks[2]);
    }
}

fn draw_field(frame: &mut Frame, area: Rect, field: &Field, focused: bool, theme: &Theme) {
    let label_style = if focused {
        theme.accent_style()
    } else {
        theme.dim_style()
    };
    let mut label = vec![Span::styled(field.config.label.as_str(), label_style)];
    if field.config.required {
        label.push(Span::styled(" *", theme.error_style()));
    }
    frame.render_widget(
        Paragraph::new(Line::from(label)),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let shown = field.buffer.display('*');
    let line = render_input_field(&shown, field.buffer.cursor(), focused, theme);
    frame.render_widget(
        Paragraph::new(line),
        Rect::new(area.x, area.y + 1, area.width, 1),
    );
}

fn render_input_field<'a>(content: &'a str, cursor: usize, focused: bool, theme: &Theme) -> Line<'a> {
    let prefix = if focused { "> " } else { "  " };

    if !focused {
        return Line::from(vec![
            Span::styled(prefix, theme.dim_style()),
            Span::styled(content, theme.dim_style()),
        ]);
    }

    let before: String = content.chars().take(cursor).collect();
    let after: String = content.chars().skip(cursor).collect();

    Line::from(vec![
        Span::styled(prefix, theme.accent_style()),
        Span::raw(before),
        Span::styled("│", theme.accent_style()),
        Span::raw(after),
    ])
}
