use ratatui::style::{Color, Modifier, Style};

/// Colours by role in the wizard screen
#[derive(Debug, Clone)]
pub struct Theme {
    pub text: Color,
    /// Titles and the focused field
    pub accent: Color,
    /// Key hints for usable actions
    pub action: Color,
    /// Borders, hints and unusable buttons
    pub dim: Color,
    pub error: Color,
    pub success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::White,
            accent: Color::Yellow,
            action: Color::Cyan,
            dim: Color::DarkGray,
            error: Color::Red,
            success: Color::Green,
        }
    }
}

impl Theme {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text).bg(Color::Reset)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn action_style(&self) -> Style {
        Style::default().fg(self.action)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Navigation button, dimmed when it cannot be used
    pub fn button_style(&self, usable: bool) -> Style {
        if usable {
            self.action_style().add_modifier(Modifier::BOLD)
        } else {
            self.dim_style()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_style_dims_unusable() {
        let theme = Theme::default();
        assert_eq!(theme.button_style(false), theme.dim_style());
        assert_eq!(theme.button_style(true).fg, Some(Color::Cyan));
        assert!(theme.button_style(true).add_modifier.contains(Modifier::BOLD));
    }
}
