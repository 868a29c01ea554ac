use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub focus_border: Color,
    pub blurred_border: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub selection_fg: Color,

    // Specific components
    pub group_name: Style,
    pub group_protected: Style,
    pub group_active: Style,
    pub group_count: Style,
    pub group_appearing: Style,
    pub form_input: Style,
    pub member_name: Style,
    pub footer: Style,
    pub toast: Style,
    pub undo_hint: Style,
    pub alert_title: Style,
    pub alert_border: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            blurred_border: Color::DarkGray,
            text: Color::White,
            text_secondary: Color::Gray,
            selection_fg: Color::Yellow,

            group_name: Style::default().fg(Color::White),
            group_protected: Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            group_active: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            group_count: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            group_appearing: Style::default().add_modifier(Modifier::DIM),
            form_input: Style::default().fg(Color::Yellow),
            member_name: Style::default().fg(Color::White),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            toast: Style::default().fg(Color::Black).bg(Color::Yellow),
            undo_hint: Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            alert_title: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            alert_border: Style::default().fg(Color::Red).bg(Color::Black),
        }
    }
}

impl Theme {
    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focus_border).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.blurred_border)
        }
    }
}
