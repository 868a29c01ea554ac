//! Group roster: the ordered, server-mirrored list of groups and the
//! controller that drives it.
//!
//! [`RosterState`] is plain data with synchronous transitions. [`GroupRoster`]
//! owns one, spawns network calls on the tokio runtime and applies their
//! results when the UI loop hands back the matching [`RosterEvent`]. Nothing
//! else mutates the state.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::error::{Result, RosterError};
use crate::members::MemberList;
use crate::models::{
    AddGroupForm, Alert, EVERYONE_ID, GroupEntry, MemberCount, Notification, NotificationKind,
    SortMode, ViewNode,
};
use crate::network::{GroupBackend, GroupQuery, GroupSubsets, UserRecord};
use crate::sort::sort_entries;

/// A soft-deleted entry waiting for undo or for the app to exit.
#[derive(Debug)]
pub struct PendingDelete {
    pub entry: GroupEntry,
    pub token: CancellationToken,
}

#[derive(Debug)]
pub struct RosterState {
    pub entries: Vec<GroupEntry>,
    pub active_id: Option<String>,
    pub filter_text: String,
    pub filter_groups: bool,
    pub sort_mode: SortMode,
    pub pending_deletes: BTreeMap<String, PendingDelete>,
    /// Every group id seen listed or created.
    pub known_groups: BTreeSet<String>,
    /// Set while a read request is in flight.
    pub updating: bool,
    pub form: AddGroupForm,
    pub notification: Option<Notification>,
    pub alert: Option<Alert>,
    pub last_refreshed: Option<DateTime<Local>>,
}

impl RosterState {
    pub fn new(sort_mode: SortMode) -> Self {
        Self {
            entries: Vec::new(),
            active_id: None,
            filter_text: String::new(),
            filter_groups: false,
            sort_mode,
            pending_deletes: BTreeMap::new(),
            known_groups: BTreeSet::new(),
            updating: false,
            form: AddGroupForm::Collapsed,
            notification: None,
            alert: None,
            last_refreshed: None,
        }
    }

    pub fn entry(&self, id: &str) -> Option<&GroupEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: &str) -> Option<&mut GroupEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn seed_everyone(&mut self) {
        if self.entry(EVERYONE_ID).is_none() {
            self.entries.push(GroupEntry::everyone());
            self.resort();
        }
    }

    pub fn resort(&mut self) {
        sort_entries(&mut self.entries, self.sort_mode);
    }

    /// Merges a successful read into the view. Known ids keep their entry and
    /// get the new count; new ids are inserted flagged as appearing; ids the
    /// server no longer lists are dropped, except the local everyone entry.
    /// Ids with a pending delete stay hidden whichever way they come back.
    pub fn apply_groups(&mut self, subsets: GroupSubsets) {
        let mut seen = HashSet::new();
        let tagged = subsets
            .admin_groups
            .into_iter()
            .map(|g| (true, g))
            .chain(subsets.groups.into_iter().map(|g| (false, g)));

        for (in_admin_subset, record) in tagged {
            if !seen.insert(record.name.clone()) {
                continue;
            }
            let count = MemberCount::from_server(record.usercount);
            let pending = self.pending_deletes.contains_key(&record.name);
            self.known_groups.insert(record.name.clone());
            match self.entry_mut(&record.name) {
                Some(existing) => {
                    if count != MemberCount::Unknown {
                        existing.member_count = count;
                    }
                    existing.protected |= in_admin_subset;
                    existing.hidden = pending;
                }
                None => {
                    let mut entry = GroupEntry::new(&record.name, count, in_admin_subset);
                    entry.appearing = true;
                    entry.hidden = pending;
                    self.entries.push(entry);
                }
            }
        }

        self.entries.retain(|e| e.id == EVERYONE_ID || seen.contains(&e.id));
        self.resort();
    }

    /// Counts of zero or below are stored as zero.
    pub fn set_user_count(&mut self, id: &str, count: i64) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.member_count = MemberCount::from_server(Some(count));
        self.resort();
        true
    }

    /// Adds a freshly created group with no members.
    pub fn insert_created(&mut self, id: &str) {
        self.known_groups.insert(id.to_string());
        if self.entry(id).is_none() {
            self.entries.push(GroupEntry::new(id, MemberCount::Known(0), false));
            self.resort();
        }
    }

    /// Hides the entry and records a pending delete. The undo notification
    /// now points at this entry, replacing any earlier one.
    pub fn mark_for_delete(&mut self, id: &str) -> Result<()> {
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| RosterError::Validation(format!("No group named {id}")))?;
        if entry.protected {
            return Err(RosterError::Validation(format!("{} cannot be deleted", entry.display_name)));
        }
        if entry.hidden {
            return Ok(());
        }
        let snapshot = entry.clone();
        entry.hidden = true;
        self.pending_deletes.insert(
            id.to_string(),
            PendingDelete { entry: snapshot, token: CancellationToken::new() },
        );
        self.notification = Some(Notification::undo(id));
        Ok(())
    }

    /// Restores the entry named by the undo notification, if any.
    pub fn undo(&mut self) -> Option<String> {
        let id = match &self.notification {
            Some(Notification { kind: NotificationKind::Undo { id }, .. }) => id.clone(),
            _ => return None,
        };
        self.notification = None;
        let pending = self.pending_deletes.remove(&id)?;
        pending.token.cancel();
        match self.entry_mut(&id) {
            Some(entry) => entry.hidden = false,
            None => {
                let mut entry = pending.entry;
                entry.hidden = false;
                self.entries.push(entry);
                self.resort();
            }
        }
        Some(id)
    }

    /// Drains the pending deletes that were not cancelled.
    pub fn take_pending(&mut self) -> Vec<PendingDelete> {
        if matches!(
            self.notification,
            Some(Notification { kind: NotificationKind::Undo { .. }, .. })
        ) {
            self.notification = None;
        }
        std::mem::take(&mut self.pending_deletes)
            .into_values()
            .filter(|p| !p.token.is_cancelled())
            .collect()
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.retain(|e| e.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
    }

    /// Post-render step: entries shown once are no longer appearing.
    pub fn finish_appear(&mut self) -> usize {
        let mut cleared = 0;
        for entry in self.entries.iter_mut().filter(|e| e.appearing) {
            entry.appearing = false;
            cleared += 1;
        }
        cleared
    }

    pub fn expire_notification(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notification = None;
        }
    }

    /// Visible entries projected for rendering, in roster order.
    pub fn view(&self) -> Vec<ViewNode> {
        self.entries
            .iter()
            .filter(|e| !e.hidden)
            .map(|e| render_entry(e, self.sort_mode, self.active_id.as_deref()))
            .collect()
    }
}

/// Counts are only shown when sorting by them, and never when zero.
pub fn render_entry(entry: &GroupEntry, sort_mode: SortMode, active_id: Option<&str>) -> ViewNode {
    let count_label = match (sort_mode, entry.member_count) {
        (SortMode::ByMemberCount, MemberCount::Known(n)) if n > 0 => Some(n.to_string()),
        _ => None,
    };
    ViewNode {
        id: entry.id.clone(),
        label: entry.display_name.clone(),
        count_label,
        deletable: !entry.protected,
        active: active_id == Some(entry.id.as_str()),
        appearing: entry.appearing,
    }
}

/// Completed network work, delivered back to the UI loop.
#[derive(Debug)]
pub enum RosterEvent {
    /// Carries the parameters it was sent with; they only become the
    /// roster's own once the read succeeds.
    Groups { query: GroupQuery, result: Result<GroupSubsets> },
    Created(Result<String>),
    TotalUsers(Result<u64>),
    Members { gid: String, result: Result<Vec<UserRecord>> },
}

pub struct GroupRoster {
    pub state: RosterState,
    pub members: MemberList,
    backend: Arc<dyn GroupBackend>,
    runtime: Handle,
    events: UnboundedSender<RosterEvent>,
    member_page_size: usize,
}

impl GroupRoster {
    pub fn new(
        backend: Arc<dyn GroupBackend>,
        runtime: Handle,
        sort_mode: SortMode,
        member_page_size: usize,
    ) -> (Self, UnboundedReceiver<RosterEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let roster = Self {
            state: RosterState::new(sort_mode),
            members: MemberList::default(),
            backend,
            runtime,
            events,
            member_page_size,
        };
        (roster, rx)
    }

    /// Page-load sequence: everyone entry, its count when needed, first read.
    pub fn start(&mut self) {
        self.state.seed_everyone();
        if self.state.sort_mode == SortMode::ByMemberCount {
            self.load_total_users();
        }
        self.reload();
    }

    fn spawn<F>(&self, work: F)
    where
        F: std::future::Future<Output = RosterEvent> + Send + 'static,
    {
        let events = self.events.clone();
        self.runtime.spawn(async move {
            // The receiver only goes away when the app is shutting down.
            let _ = events.send(work.await);
        });
    }

    /// Starts a read. Returns false, doing nothing, while another read is
    /// still outstanding.
    pub fn refresh(&mut self, filter_text: &str, filter_groups: bool, sort_mode: SortMode) -> bool {
        if self.state.updating {
            tracing::debug!("refresh already in flight, skipping");
            return false;
        }
        self.state.updating = true;

        let query = GroupQuery {
            pattern: filter_text.to_string(),
            filter_groups,
            sort_mode,
        };
        tracing::info!(pattern = %query.pattern, filter_groups, sort = sort_mode.label(), "refreshing groups");
        let backend = self.backend.clone();
        self.spawn(async move {
            let result = backend.fetch_groups(&query).await;
            RosterEvent::Groups { query, result }
        });
        true
    }

    /// Refresh with the current filter and sort parameters.
    pub fn reload(&mut self) -> bool {
        let filter_text = self.state.filter_text.clone();
        self.refresh(&filter_text, self.state.filter_groups, self.state.sort_mode)
    }

    /// Re-sorts locally and re-reads with the new order. Returns false, leaving
    /// the mode unchanged, while another read is still outstanding.
    pub fn set_sort_mode(&mut self, sort_mode: SortMode) -> bool {
        if self.state.sort_mode == sort_mode {
            return true;
        }
        if self.state.updating {
            tracing::debug!("refresh already in flight, keeping sort mode");
            return false;
        }
        self.state.sort_mode = sort_mode;
        self.state.resort();
        if sort_mode == SortMode::ByMemberCount {
            self.load_total_users();
        }
        self.reload()
    }

    pub fn load_total_users(&self) {
        let backend = self.backend.clone();
        self.spawn(async move { RosterEvent::TotalUsers(backend.fetch_total_users().await) });
    }

    /// Validates and sends a create request. Blank names never reach the server.
    pub fn create_group(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            let err = RosterError::Validation("A valid group name must be provided".into());
            self.state.notification =
                Some(Notification::toast(format!("Error creating group: {}", err.user_message())));
            return Err(err);
        }
        tracing::info!(group = name, "creating group");
        let backend = self.backend.clone();
        let name = name.to_string();
        self.spawn(async move { RosterEvent::Created(backend.create_group(&name).await) });
        Ok(())
    }

    /// Submit of the add-group form. Ignored while the input is empty.
    pub fn submit_form(&mut self) -> Result<()> {
        if !self.state.form.can_submit() {
            return Ok(());
        }
        let name = self.state.form.input().unwrap_or_default().to_string();
        self.create_group(&name)
    }

    pub fn mark_for_delete(&mut self, id: &str) -> Result<()> {
        self.state.mark_for_delete(id)?;
        tracing::info!(group = id, "marked for delete");
        Ok(())
    }

    pub fn undo(&mut self) -> Option<String> {
        let restored = self.state.undo();
        if let Some(id) = &restored {
            tracing::info!(group = %id, "delete undone");
        }
        restored
    }

    /// Sends the delete for every pending entry and drops them from the view.
    /// Failures are logged and otherwise ignored.
    pub async fn commit_pending_deletes(&mut self) -> usize {
        let pending = self.state.take_pending();
        if pending.is_empty() {
            return 0;
        }
        let backend = self.backend.clone();
        let ids: Vec<String> = pending.into_iter().map(|p| p.entry.id).collect();
        let results = futures::future::join_all(ids.iter().map(|id| backend.delete_group(id))).await;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(()) => tracing::info!(group = %id, "group deleted"),
                Err(err) => tracing::warn!(group = %id, error = %err, "group delete failed"),
            }
            self.state.remove(id);
        }
        ids.len()
    }

    /// Makes `id` the active group and reloads the member pane for it.
    pub fn select_group(&mut self, id: Option<&str>) {
        self.state.active_id = id.map(str::to_string);
        self.members.empty();
        let Some(id) = id else {
            return;
        };
        // The everyone entry lists all users: no gid filter.
        let gid = if id == EVERYONE_ID { "" } else { id }.to_string();
        self.members.begin(&gid);
        let backend = self.backend.clone();
        let limit = self.member_page_size;
        self.spawn(async move {
            let result = backend.fetch_members(&gid, limit).await;
            RosterEvent::Members { gid, result }
        });
    }

    pub fn handle_event(&mut self, event: RosterEvent) {
        match event {
            RosterEvent::Groups { query, result: Ok(subsets) } => {
                self.state.updating = false;
                self.state.filter_text = query.pattern;
                self.state.filter_groups = query.filter_groups;
                self.state.sort_mode = query.sort_mode;
                self.state.apply_groups(subsets);
                self.state.last_refreshed = Some(Local::now());
            }
            RosterEvent::Groups { result: Err(err), .. } => {
                self.state.updating = false;
                tracing::error!(error = %err, "failed to retrieve groups");
                self.state.alert = Some(Alert {
                    title: "Error retrieving groups".into(),
                    message: err.user_message(),
                });
            }
            RosterEvent::Created(Ok(id)) => {
                tracing::info!(group = %id, "group created");
                self.state.insert_created(&id);
                self.state.form = AddGroupForm::Collapsed;
            }
            RosterEvent::Created(Err(err)) => {
                tracing::warn!(error = %err, "group creation failed");
                self.state.notification = Some(Notification::toast(format!(
                    "Error creating group: {}",
                    err.user_message()
                )));
            }
            RosterEvent::TotalUsers(Ok(total)) => {
                let total = i64::try_from(total).unwrap_or(i64::MAX);
                self.state.set_user_count(EVERYONE_ID, total);
            }
            RosterEvent::TotalUsers(Err(err)) => {
                tracing::warn!(error = %err, "failed to load user stats");
            }
            RosterEvent::Members { gid, result } => {
                self.members.apply(&gid, result);
            }
        }
    }

    pub fn after_render(&mut self) {
        self.state.finish_appear();
    }

    pub fn tick(&mut self, now: Instant) {
        self.state.expire_notification(now);
    }
}
