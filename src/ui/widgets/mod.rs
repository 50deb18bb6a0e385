mod header;
mod help;
mod message_panel;
mod nav_bar;
mod panel;
mod prompt;

pub use header::draw_header;
pub use help::draw_help;
pub use message_panel::draw_message_panel;
pub use nav_bar::draw_nav_bar;
pub use panel::draw_panel;
pub use prompt::draw_prompt;

use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Block;

pub fn draw_background(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default().style(theme.text_style());
    frame.render_widget(block, area);
}
