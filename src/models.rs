use std::time::{Duration, Instant};

/// Id of the built-in group containing every user. The server never lists it.
pub const EVERYONE_ID: &str = "_everyone";
/// Id of the built-in administrators group.
pub const ADMIN_ID: &str = "admin";

/// How long a temporary toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(7);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberCount {
    Unknown,
    Known(u64),
}

impl MemberCount {
    /// Server counts of zero or below collapse to `Known(0)`.
    pub fn from_server(count: Option<i64>) -> Self {
        match count {
            Some(n) if n > 0 => MemberCount::Known(n as u64),
            Some(_) => MemberCount::Known(0),
            None => MemberCount::Unknown,
        }
    }

    pub fn value(self) -> u64 {
        match self {
            MemberCount::Known(n) => n,
            MemberCount::Unknown => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortMode {
    ByName,
    ByMemberCount,
}

impl SortMode {
    pub fn from_flag(by_member_count: bool) -> Self {
        if by_member_count { SortMode::ByMemberCount } else { SortMode::ByName }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortMode::ByName => SortMode::ByMemberCount,
            SortMode::ByMemberCount => SortMode::ByName,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::ByName => "name",
            SortMode::ByMemberCount => "members",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupEntry {
    pub id: String,
    pub display_name: String,
    pub member_count: MemberCount,
    pub protected: bool,
    /// Hidden while a delete is pending.
    pub hidden: bool,
    /// Inserted by the latest refresh and not yet shown once.
    pub appearing: bool,
}

impl GroupEntry {
    pub fn new(id: &str, member_count: MemberCount, in_admin_subset: bool) -> Self {
        let display_name = if id == ADMIN_ID { "Admins" } else { id };
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            member_count,
            protected: in_admin_subset || is_protected_id(id),
            hidden: false,
            appearing: false,
        }
    }

    pub fn everyone() -> Self {
        Self {
            id: EVERYONE_ID.to_string(),
            display_name: "Everyone".to_string(),
            member_count: MemberCount::Unknown,
            protected: true,
            hidden: false,
            appearing: false,
        }
    }
}

pub fn is_protected_id(id: &str) -> bool {
    id == EVERYONE_ID || id == ADMIN_ID
}

/// Render-ready projection of a [`GroupEntry`]. Never read back into the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewNode {
    pub id: String,
    pub label: String,
    pub count_label: Option<String>,
    pub deletable: bool,
    pub active: bool,
    pub appearing: bool,
}

/// Add-group affordance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddGroupForm {
    Collapsed,
    Expanded { input: String },
}

impl AddGroupForm {
    pub fn is_expanded(&self) -> bool {
        matches!(self, AddGroupForm::Expanded { .. })
    }

    /// Click on the "add" trigger. Opens with an empty input.
    pub fn toggle(&mut self) {
        *self = match self {
            AddGroupForm::Collapsed => AddGroupForm::Expanded { input: String::new() },
            AddGroupForm::Expanded { .. } => AddGroupForm::Collapsed,
        };
    }

    /// Interaction anywhere outside the form. Collapses only an empty form.
    pub fn outside_interaction(&mut self) {
        if let AddGroupForm::Expanded { input } = self {
            if input.trim().is_empty() {
                *self = AddGroupForm::Collapsed;
            }
        }
    }

    pub fn escape(&mut self) {
        *self = AddGroupForm::Collapsed;
    }

    pub fn push_char(&mut self, c: char) {
        if let AddGroupForm::Expanded { input } = self {
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if let AddGroupForm::Expanded { input } = self {
            input.pop();
        }
    }

    pub fn input(&self) -> Option<&str> {
        match self {
            AddGroupForm::Expanded { input } => Some(input.as_str()),
            AddGroupForm::Collapsed => None,
        }
    }

    /// The submit button is disabled while the input is empty.
    pub fn can_submit(&self) -> bool {
        self.input().is_some_and(|input| !input.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Toast { expires_at: Instant },
    /// Offers undo for the most recent soft delete.
    Undo { id: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn toast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Toast { expires_at: Instant::now() + TOAST_TTL },
        }
    }

    pub fn undo(id: &str) -> Self {
        Self {
            text: format!("deleted {id}"),
            kind: NotificationKind::Undo { id: id.to_string() },
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.kind, NotificationKind::Toast { expires_at } if now >= expires_at)
    }
}

/// Blocking dialog; swallows input until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    Groups,
    Members,
    Filter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_entry_is_protected_and_renamed() {
        let admin = GroupEntry::new(ADMIN_ID, MemberCount::Known(2), false);
        assert!(admin.protected);
        assert_eq!(admin.display_name, "Admins");

        let plain = GroupEntry::new("staff", MemberCount::Unknown, false);
        assert!(!plain.protected);
        assert_eq!(plain.display_name, "staff");
    }

    #[test]
    fn server_counts_below_one_become_zero() {
        assert_eq!(MemberCount::from_server(Some(-3)), MemberCount::Known(0));
        assert_eq!(MemberCount::from_server(Some(4)), MemberCount::Known(4));
        assert_eq!(MemberCount::from_server(None), MemberCount::Unknown);
    }

    #[test]
    fn form_collapses_on_outside_interaction_only_when_empty() {
        let mut form = AddGroupForm::Collapsed;
        form.toggle();
        assert!(form.is_expanded());
        assert!(!form.can_submit());

        form.push_char('x');
        form.outside_interaction();
        assert!(form.is_expanded());
        assert!(form.can_submit());

        form.backspace();
        form.outside_interaction();
        assert_eq!(form, AddGroupForm::Collapsed);
    }

    #[test]
    fn escape_collapses_a_filled_form() {
        let mut form = AddGroupForm::Expanded { input: "ops".into() };
        form.escape();
        assert_eq!(form, AddGroupForm::Collapsed);
    }
}
