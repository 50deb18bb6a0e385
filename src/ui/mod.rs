mod input;
mod layout;
mod theme;
pub mod widgets;

pub use input::InputBuffer;
pub use layout::Layout;
pub use theme::Theme;

use crate::app::WizardApp;
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &WizardApp) {
    let layout = Layout::new(frame.area());

    widgets::draw_background(frame, layout.full, &app.theme);
    widgets::draw_header(frame, layout.header, app);
    widgets::draw_panel(frame, layout.content, app);
    widgets::draw_message_panel(frame, layout.message, app);
    widgets::draw_nav_bar(frame, layout.nav, app);

    // Popups render on top of everything
    if app.show_help {
        widgets::draw_help(frame, layout.content, app);
    }

    if let Some(ref prompt) = app.prompt {
        widgets::draw_prompt(frame, layout.content, prompt, &app.theme);
    }
}
