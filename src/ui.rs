use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::App;
use crate::members::MemberList;
use crate::models::{FocusArea, NotificationKind, SortMode, ViewNode};
use crate::sort::RENDER_BATCH;
use crate::theme::Theme;

/// One roster row. Deletable rows carry the delete hint, counts sit on the right.
fn render_group_line(node: &ViewNode, theme: &Theme) -> Line<'static> {
    let mut style = if node.active {
        theme.group_active
    } else if node.deletable {
        theme.group_name
    } else {
        theme.group_protected
    };
    if node.appearing {
        style = style.patch(theme.group_appearing);
    }

    let marker = if node.active { "●" } else { " " };
    let mut spans = vec![Span::raw(format!("{marker} ")), Span::styled(node.label.clone(), style)];
    if let Some(count) = &node.count_label {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(count.clone(), theme.group_count));
    }
    if !node.deletable {
        spans.push(Span::styled(" ⚿", Style::default().fg(theme.text_secondary)));
    }
    Line::from(spans)
}

/// Renders the whole screen.
pub fn render(f: &mut Frame, app: &App, theme: &Theme) {
    let area = f.area();
    let vertical_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(vertical_chunks[0]);

    render_groups(f, app, theme, columns[0]);
    render_members(f, app, theme, columns[1]);
    render_footer(f, app, theme, vertical_chunks[1]);

    if let Some(alert) = &app.roster.state.alert {
        let popup_area = centered_rect(50, 30, area);
        f.render_widget(Clear, popup_area);
        let block = Block::default()
            .title(Span::styled(alert.title.clone(), theme.alert_title))
            .borders(Borders::ALL)
            .style(theme.alert_border);
        let text = vec![
            Line::from(Span::styled(alert.message.clone(), Style::default().fg(theme.text))),
            Line::from(""),
            Line::from(Span::styled("Press Enter to close", theme.footer)),
        ];
        let para = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        f.render_widget(para, popup_area);
    }
}

fn render_groups(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let state = &app.roster.state;
    let form_height = if state.form.is_expanded() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(form_height), Constraint::Min(1)])
        .split(area);

    if let Some(input) = state.form.input() {
        let hint = if state.form.can_submit() { "Enter create · Esc cancel" } else { "type a name · Esc cancel" };
        let form = Paragraph::new(Line::from(vec![
            Span::styled(input.to_string(), theme.form_input),
            Span::styled("▏", theme.form_input),
        ]))
        .block(Block::default().title("New group").title_bottom(hint).borders(Borders::ALL).style(theme.border(true)));
        f.render_widget(form, chunks[0]);
    }

    let view = state.view();
    let mut items: Vec<ListItem> = Vec::with_capacity(view.len());
    for batch in view.chunks(RENDER_BATCH) {
        items.extend(batch.iter().map(|node| ListItem::new(render_group_line(node, theme))));
    }

    let title = match (app.focus, state.filter_text.is_empty()) {
        (FocusArea::Filter, _) => format!("Groups – filter: {}▏", app.filter_input),
        (_, true) => "Groups [n] add".to_string(),
        (_, false) => format!("Groups – filter: {}", state.filter_text),
    };
    let focused = matches!(app.focus, FocusArea::Groups | FocusArea::Filter) && !state.form.is_expanded();
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL).style(theme.border(focused)))
        .highlight_style(Style::default().fg(theme.selection_fg).add_modifier(Modifier::REVERSED))
        .highlight_symbol("→");
    let mut list_state = ListState::default();
    if !view.is_empty() {
        list_state.select(Some(app.cursor.min(view.len() - 1)));
    }
    f.render_stateful_widget(list, chunks[1], &mut list_state);

    if let Some(notification) = &state.notification {
        let bar = Rect {
            x: chunks[1].x + 1,
            y: chunks[1].y + chunks[1].height.saturating_sub(2),
            width: chunks[1].width.saturating_sub(2),
            height: 1,
        };
        let line = match &notification.kind {
            NotificationKind::Toast { .. } => Line::from(Span::styled(notification.text.clone(), theme.toast)),
            NotificationKind::Undo { .. } => Line::from(vec![
                Span::styled(format!("{} ", notification.text), theme.toast),
                Span::styled("undo [u]", theme.undo_hint),
            ]),
        };
        f.render_widget(Clear, bar);
        f.render_widget(Paragraph::new(line), bar);
    }
}

fn render_members(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let members = &app.roster.members;
    let title = match (&app.roster.state.active_id, members.users.len()) {
        (Some(id), n) => format!("Members of {id} ({n})"),
        (None, _) => "Members".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(theme.border(app.focus == FocusArea::Members));

    let placeholder = if members.loading {
        Some("Loading…".to_string())
    } else if let Some(err) = &members.error {
        Some(format!("Error loading members: {err}"))
    } else if app.roster.state.active_id.is_none() {
        Some("Select a group with Enter".to_string())
    } else if members.users.is_empty() {
        Some("No members".to_string())
    } else {
        None
    };

    if let Some(text) = placeholder {
        let para = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(para, area);
        return;
    }

    let items: Vec<ListItem> = members
        .users
        .iter()
        .skip(app.member_scroll)
        .map(|u| {
            let mut spans = vec![Span::styled(MemberList::label(u).to_string(), theme.member_name)];
            if u.displayname.as_deref().is_some_and(|d| !d.is_empty() && d != u.name) {
                spans.push(Span::styled(format!("  {}", u.name), Style::default().fg(theme.text_secondary)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_footer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let state = &app.roster.state;
    let sort = match state.sort_mode {
        SortMode::ByName => "s: by name",
        SortMode::ByMemberCount => "s: by members",
    };
    let groups = if state.filter_groups { "g: groups filtered" } else { "g: all groups" };
    let status = if state.updating {
        "loading…".to_string()
    } else {
        state
            .last_refreshed
            .map(|t| format!("updated {}", t.format("%H:%M:%S")))
            .unwrap_or_default()
    };
    let pending = match state.pending_deletes.len() {
        0 => String::new(),
        n => format!(" | {n} pending delete(s)"),
    };
    let footer = Paragraph::new(format!(
        "↑/↓ Navigate | Enter Select | n New | d Delete | u Undo | / Filter | {groups} | {sort} | r Refresh | q Quit | {status}{pending}"
    ))
    .block(Block::default().borders(Borders::ALL))
    .style(theme.footer);
    f.render_widget(footer, area);
}

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(deletable: bool, active: bool) -> ViewNode {
        ViewNode {
            id: "ops".into(),
            label: "ops".into(),
            count_label: Some("4".into()),
            deletable,
            active,
            appearing: false,
        }
    }

    #[test]
    fn protected_rows_get_lock_marker() {
        let theme = Theme::default();
        let line = render_group_line(&node(false, false), &theme);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "  ops 4 ⚿");
    }

    #[test]
    fn active_row_is_marked() {
        let theme = Theme::default();
        let line = render_group_line(&node(true, true), &theme);
        assert_eq!(line.spans[0].content, "● ");
        assert_eq!(line.spans[1].style, theme.group_active);
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 30, outer);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom());
    }
}
