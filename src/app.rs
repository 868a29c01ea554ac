use crate::models::FocusArea;
use crate::roster::GroupRoster;

/// Everything the UI loop owns: the roster plus cursor and focus.
pub struct App {
    pub roster: GroupRoster,
    pub focus: FocusArea,
    /// Index into the visible roster view.
    pub cursor: usize,
    pub member_scroll: usize,
    /// Filter text being typed; applied on Enter.
    pub filter_input: String,
    /// Write the sort toggle back to the user config.
    pub persist_sort: bool,
}

impl App {
    pub fn new(roster: GroupRoster, persist_sort: bool) -> Self {
        let filter_input = roster.state.filter_text.clone();
        Self {
            roster,
            focus: FocusArea::Groups,
            cursor: 0,
            member_scroll: 0,
            filter_input,
            persist_sort,
        }
    }

    pub fn visible_len(&self) -> usize {
        self.roster.state.entries.iter().filter(|e| !e.hidden).count()
    }

    /// Id of the entry under the cursor.
    pub fn cursor_id(&self) -> Option<String> {
        self.roster
            .state
            .entries
            .iter()
            .filter(|e| !e.hidden)
            .nth(self.cursor)
            .map(|e| e.id.clone())
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible_len().saturating_sub(1));
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }
}
