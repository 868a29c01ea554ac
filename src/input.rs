use anyhow::Result;
use crossterm::event::KeyCode;

use crate::app::App;
use crate::config::save_sort_mode;
use crate::models::{FocusArea, Notification, SortMode};

/// Applies one key press. Returns `Ok(false)` when the app should quit.
pub fn handle_key(key: KeyCode, app: &mut App) -> Result<bool> {
    // A blocking alert swallows the key that dismisses it.
    if app.roster.state.alert.is_some() {
        if matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.roster.state.alert = None;
        }
        return Ok(true);
    }

    if app.roster.state.form.is_expanded() {
        return Ok(handle_form_key(key, app));
    }

    if app.focus == FocusArea::Filter {
        handle_filter_key(key, app);
        return Ok(true);
    }

    match key {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Up | KeyCode::Char('k') => match app.focus {
            FocusArea::Members => app.member_scroll = app.member_scroll.saturating_sub(1),
            _ => app.move_cursor(-1),
        },
        KeyCode::Down | KeyCode::Char('j') => match app.focus {
            FocusArea::Members => {
                let max = app.roster.members.users.len().saturating_sub(1);
                app.member_scroll = (app.member_scroll + 1).min(max);
            }
            _ => app.move_cursor(1),
        },
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusArea::Groups => FocusArea::Members,
                _ => FocusArea::Groups,
            };
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(id) = app.cursor_id() {
                app.member_scroll = 0;
                app.roster.select_group(Some(&id));
            }
        }
        KeyCode::Esc => {
            app.roster.select_group(None);
        }
        KeyCode::Char('n') => app.roster.state.form.toggle(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = app.cursor_id() {
                if let Err(err) = app.roster.mark_for_delete(&id) {
                    app.roster.state.notification = Some(Notification::toast(err.user_message()));
                }
                app.clamp_cursor();
            }
        }
        KeyCode::Char('u') => {
            app.roster.undo();
        }
        KeyCode::Char('/') => {
            app.filter_input = app.roster.state.filter_text.clone();
            app.focus = FocusArea::Filter;
        }
        KeyCode::Char('g') => {
            let state = &app.roster.state;
            let (filter, groups, sort) = (state.filter_text.clone(), !state.filter_groups, state.sort_mode);
            if !app.roster.refresh(&filter, groups, sort) {
                app.roster.state.notification = Some(Notification::toast("Still loading groups"));
            }
        }
        KeyCode::Char('s') => {
            let mode = app.roster.state.sort_mode.toggled();
            if !app.roster.set_sort_mode(mode) {
                app.roster.state.notification = Some(Notification::toast("Still loading groups"));
            } else if app.persist_sort {
                if let Err(err) = save_sort_mode(mode == SortMode::ByMemberCount) {
                    tracing::warn!(error = %err, "could not save sort mode");
                }
            }
        }
        KeyCode::Char('r') => {
            app.roster.reload();
        }
        _ => {}
    }
    Ok(true)
}

fn handle_form_key(key: KeyCode, app: &mut App) -> bool {
    match key {
        KeyCode::Esc => app.roster.state.form.escape(),
        KeyCode::Backspace => app.roster.state.form.backspace(),
        KeyCode::Char(c) => app.roster.state.form.push_char(c),
        KeyCode::Enter => {
            // Validation failures are already shown as a toast.
            let _ = app.roster.submit_form();
        }
        // Moving away from the form counts as an outside interaction.
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
            app.roster.state.form.outside_interaction();
            if !app.roster.state.form.is_expanded() {
                return handle_key(key, app).unwrap_or(true);
            }
        }
        _ => {}
    }
    true
}

fn handle_filter_key(key: KeyCode, app: &mut App) {
    match key {
        KeyCode::Esc => {
            app.filter_input = app.roster.state.filter_text.clone();
            app.focus = FocusArea::Groups;
        }
        KeyCode::Enter => {
            let state = &app.roster.state;
            let (groups, sort) = (state.filter_groups, state.sort_mode);
            let pattern = app.filter_input.clone();
            if app.roster.refresh(&pattern, groups, sort) {
                app.cursor = 0;
                app.focus = FocusArea::Groups;
            } else {
                app.roster.state.notification = Some(Notification::toast("Still loading groups"));
            }
        }
        KeyCode::Backspace => {
            app.filter_input.pop();
        }
        KeyCode::Char(c) => app.filter_input.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result as RosterResult, RosterError};
    use crate::models::{AddGroupForm, Alert, GroupEntry, MemberCount};
    use crate::network::{GroupBackend, GroupQuery, GroupSubsets, UserRecord};
    use crate::roster::GroupRoster;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    struct OfflineBackend;

    #[async_trait]
    impl GroupBackend for OfflineBackend {
        async fn fetch_groups(&self, _query: &GroupQuery) -> RosterResult<GroupSubsets> {
            Ok(GroupSubsets::default())
        }
        async fn create_group(&self, name: &str) -> RosterResult<String> {
            Ok(name.to_string())
        }
        async fn delete_group(&self, _id: &str) -> RosterResult<()> {
            Ok(())
        }
        async fn fetch_total_users(&self) -> RosterResult<u64> {
            Err(RosterError::Validation("offline".into()))
        }
        async fn fetch_members(&self, _gid: &str, _limit: usize) -> RosterResult<Vec<UserRecord>> {
            Ok(Vec::new())
        }
    }

    fn app() -> App {
        let (mut roster, _rx) = GroupRoster::new(Arc::new(OfflineBackend), Handle::current(), SortMode::ByName, 10);
        roster.state.seed_everyone();
        roster.state.insert_created("ops");
        App::new(roster, false)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            handle_key(*key, app).unwrap();
        }
    }

    #[tokio::test]
    async fn typing_a_filter_and_enter_starts_a_refresh() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/'), KeyCode::Char('o'), KeyCode::Char('p'), KeyCode::Enter]);
        assert_eq!(app.filter_input, "op");
        assert_eq!(app.roster.state.filter_text, "");
        assert!(app.roster.state.updating);
        assert!(app.focus == FocusArea::Groups);
    }

    #[tokio::test]
    async fn sort_toggle_during_a_read_only_toasts() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('r'), KeyCode::Char('s')]);
        assert_eq!(app.roster.state.sort_mode, SortMode::ByName);
        assert_eq!(app.roster.state.notification.as_ref().unwrap().text, "Still loading groups");
    }

    #[tokio::test]
    async fn sort_toggle_when_idle_switches_mode() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('s')]);
        assert_eq!(app.roster.state.sort_mode, SortMode::ByMemberCount);
        assert!(app.roster.state.updating);
        assert!(app.roster.state.notification.is_none());
    }

    #[tokio::test]
    async fn escape_discards_filter_edit() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('/'), KeyCode::Char('x'), KeyCode::Esc]);
        assert_eq!(app.filter_input, "");
        assert!(!app.roster.state.updating);
    }

    #[tokio::test]
    async fn form_keys_are_captured_until_escape() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('q'), KeyCode::Char('a')]);
        assert_eq!(app.roster.state.form, AddGroupForm::Expanded { input: "qa".into() });

        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.roster.state.form, AddGroupForm::Collapsed);
    }

    #[tokio::test]
    async fn moving_away_from_an_empty_form_collapses_it() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Down]);
        assert_eq!(app.roster.state.form, AddGroupForm::Collapsed);
        assert_eq!(app.cursor, 1);

        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char('x'), KeyCode::Down]);
        assert!(app.roster.state.form.is_expanded());
        assert_eq!(app.cursor, 1);
    }

    #[tokio::test]
    async fn whitespace_name_shows_validation_toast() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Char(' '), KeyCode::Enter]);
        let toast = app.roster.state.notification.as_ref().unwrap();
        assert_eq!(toast.text, "Error creating group: A valid group name must be provided");
        assert!(app.roster.state.form.is_expanded());
    }

    #[tokio::test]
    async fn delete_on_protected_entry_only_toasts() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('d')]);
        assert!(app.roster.state.pending_deletes.is_empty());
        assert_eq!(app.roster.state.notification.as_ref().unwrap().text, "Everyone cannot be deleted");

        press(&mut app, &[KeyCode::Down, KeyCode::Char('d')]);
        assert!(app.roster.state.pending_deletes.contains_key("ops"));
        assert_eq!(app.cursor, 0);

        press(&mut app, &[KeyCode::Char('u')]);
        assert_eq!(app.visible_len(), 2);
    }

    #[tokio::test]
    async fn alert_blocks_other_keys() {
        let mut app = app();
        app.roster.state.alert = Some(Alert { title: "t".into(), message: "m".into() });
        assert!(handle_key(KeyCode::Char('q'), &mut app).unwrap());
        assert!(app.roster.state.alert.is_some());
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.roster.state.alert.is_none());
        assert!(!handle_key(KeyCode::Char('q'), &mut app).unwrap());
    }

    #[tokio::test]
    async fn enter_selects_the_entry_under_the_cursor() {
        let mut app = app();
        app.roster.state.entries.push(GroupEntry::new("zeta", MemberCount::Known(1), false));
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.roster.state.active_id.as_deref(), Some("ops"));
        assert_eq!(app.roster.members.gid.as_deref(), Some("ops"));
    }
}
