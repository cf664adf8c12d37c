//! Client-side todo state kept in sync with the remote collection.
//!
//! # Design
//! - The displayed state (`TodoState`) lives in a `watch` channel owned by
//!   the store. UI code observes it through `subscribe()`; every change
//!   notifies receivers.
//! - Add appends the server-created item. Update and delete are applied
//!   locally only after the server confirmed them. A failed call leaves
//!   the items exactly as they were.
//! - Operations take `&self` and never hold the state across an `.await`.
//!   Confirmed mutations are matched by id, so overlapping operations stay
//!   correct even if the list changed in between.
//! - A `load` response only replaces the items if no mutation was confirmed
//!   and no newer load settled since it was dispatched. `loading` stays set
//!   until every outstanding load has settled.
//! - A delete and an update racing on the same id are not reconciled: there
//!   is no versioning, and an update confirmed after the item was removed
//!   locally is dropped.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::client::TodoClient;
use crate::config::ClientConfig;
use crate::error::{StoreError, TransportError, ValidationError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{AddTodo, TodoId, TodoItem, TodoPatch};

/// The item currently in edit mode and its unsaved text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub id: TodoId,
    pub draft: String,
}

/// Everything a view needs to render the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoState {
    /// Items in server order, newly added ones appended.
    pub items: Vec<TodoItem>,
    /// A `load` is outstanding.
    pub loading: bool,
    /// The most recent `load` failed.
    pub load_failed: bool,
    pub edit: Option<EditSession>,
}

impl TodoState {
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Item count label, e.g. `1 task` or `3 tasks`.
    pub fn summary(&self) -> String {
        let count = self.items.len();
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} task{plural}")
    }

    fn end_edit_if(&mut self, stale: impl Fn(&Self, &EditSession) -> bool) -> bool {
        if self.edit.as_ref().is_some_and(|edit| stale(self, edit)) {
            self.edit = None;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-facing message produced by a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Pending notices beyond this count push out the oldest ones.
const NOTICE_CAPACITY: usize = 64;

/// Orders overlapping loads against each other and against confirmed
/// mutations. Only touched while the state channel is being modified.
#[derive(Debug, Default)]
struct SyncClock {
    outstanding_loads: usize,
    issued_loads: u64,
    settled_load: u64,
    confirmed_mutations: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct LoadTicket {
    seq: u64,
    mutations: u64,
}

impl SyncClock {
    fn issue(&mut self) -> LoadTicket {
        self.outstanding_loads += 1;
        self.issued_loads += 1;
        LoadTicket {
            seq: self.issued_loads,
            mutations: self.confirmed_mutations,
        }
    }

    /// Marks the load behind `ticket` as finished. Returns whether its
    /// result is still newer than everything applied locally.
    fn settle(&mut self, ticket: LoadTicket) -> bool {
        self.outstanding_loads = self.outstanding_loads.saturating_sub(1);
        let current =
            ticket.seq > self.settled_load && ticket.mutations == self.confirmed_mutations;
        if current {
            self.settled_load = ticket.seq;
        }
        current
    }
}

/// Single source of truth for the todos on display.
#[derive(Debug)]
pub struct TodoStore<T> {
    client: TodoClient,
    transport: T,
    state: watch::Sender<TodoState>,
    clock: Mutex<SyncClock>,
    notices: Mutex<VecDeque<Notice>>,
}

impl TodoStore<ReqwestTransport> {
    /// Store talking to the backend described by `config` over reqwest.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(TodoClient::from_config(config), transport))
    }
}

impl<T: Transport> TodoStore<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self {
            client,
            transport,
            state: watch::Sender::new(TodoState::default()),
            clock: Mutex::new(SyncClock::default()),
            notices: Mutex::new(VecDeque::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TodoState {
        self.state.borrow().clone()
    }

    pub fn todos(&self) -> Vec<TodoItem> {
        self.state.borrow().items.clone()
    }

    pub fn get(&self, id: TodoId) -> Option<TodoItem> {
        self.state.borrow().get(id).cloned()
    }

    /// Take every notice produced since the last call, oldest first.
    ///
    /// Only the most recent 64 undrained notices are kept, so callers that
    /// show notices should drain after each operation.
    pub fn drain_notices(&self) -> Vec<Notice> {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        notices.drain(..).collect()
    }

    /// Replace the local items with the server's collection.
    ///
    /// On failure the items are kept and `load_failed` is set. A response
    /// that was overtaken by a confirmed mutation or by a newer load is
    /// discarded.
    pub async fn load(&self) -> Result<(), StoreError> {
        tracing::debug!("loading todos...");
        let ticket = self.issue_load();

        match self.fetch_all().await {
            Ok(items) => {
                let count = items.len();
                let applied = self.settle_load(ticket, |s| {
                    s.items = items;
                    s.load_failed = false;
                    s.end_edit_if(|state, edit| state.get(edit.id).is_none());
                });
                if applied {
                    tracing::debug!(count, "loaded todos");
                } else {
                    tracing::debug!(count, "discarded stale todo list");
                }
                Ok(())
            }
            Err(err) => {
                self.settle_load(ticket, |s| s.load_failed = true);
                Err(self.report("load todos", err))
            }
        }
    }

    /// Create a todo remotely and append the server's item.
    pub async fn add(&self, description: &str) -> Result<TodoItem, StoreError> {
        self.try_add(description)
            .await
            .map_err(|err| self.report("add todo", err))
    }

    /// Delete a todo remotely, then drop it locally.
    pub async fn remove(&self, id: TodoId) -> Result<(), StoreError> {
        self.try_remove(id)
            .await
            .map_err(|err| self.report("delete todo", err))
    }

    /// Send the merge of the current item and `patch`, then apply `patch`
    /// locally.
    pub async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<TodoItem, StoreError> {
        self.try_update(id, patch)
            .await
            .map_err(|err| self.report("update todo", err))
    }

    pub async fn toggle_completed(&self, id: TodoId) -> Result<TodoItem, StoreError> {
        let result = match self.get(id) {
            Some(item) => self.try_update(id, TodoPatch::completed(!item.completed)).await,
            None => Err(ValidationError::UnknownTodo(id).into()),
        };
        result.map_err(|err| self.report("update todo", err))
    }

    /// Put `id` in edit mode with its current description as the draft.
    /// Any other session is dropped without saving.
    pub fn begin_edit(&self, id: TodoId) -> Result<(), StoreError> {
        let found = self.state.send_if_modified(|s| {
            let Some(draft) = s.get(id).map(|item| item.description.clone()) else {
                return false;
            };
            s.edit = Some(EditSession { id, draft });
            true
        });
        if found {
            Ok(())
        } else {
            Err(self.report("edit todo", ValidationError::UnknownTodo(id).into()))
        }
    }

    pub fn set_draft(&self, text: &str) -> Result<(), StoreError> {
        let editing = self.state.send_if_modified(|s| match &mut s.edit {
            Some(edit) => {
                edit.draft = text.to_string();
                true
            }
            None => false,
        });
        if editing {
            Ok(())
        } else {
            Err(self.report("edit todo", ValidationError::NotEditing.into()))
        }
    }

    /// Leave edit mode, discarding the draft. Returns the discarded session.
    pub fn cancel_edit(&self) -> Option<EditSession> {
        let mut discarded = None;
        self.state.send_if_modified(|s| {
            discarded = s.edit.take();
            discarded.is_some()
        });
        discarded
    }

    pub fn editing(&self) -> Option<EditSession> {
        self.state.borrow().edit.clone()
    }

    /// Save the draft as the item's description. The session ends only once
    /// the server confirmed the change.
    pub async fn commit_edit(&self) -> Result<TodoItem, StoreError> {
        let Some(session) = self.editing() else {
            return Err(self.report("save todo", ValidationError::NotEditing.into()));
        };
        let item = self
            .try_update(session.id, TodoPatch::description(session.draft))
            .await
            .map_err(|err| self.report("save todo", err))?;
        self.state
            .send_if_modified(|s| s.end_edit_if(|_, edit| edit.id == session.id));
        Ok(item)
    }

    fn issue_load(&self) -> LoadTicket {
        let mut ticket = LoadTicket::default();
        self.state.send_modify(|s| {
            ticket = self.clock().issue();
            s.loading = true;
        });
        ticket
    }

    /// Ends the load behind `ticket` and runs `apply` if its result is
    /// still current. Returns whether `apply` ran.
    fn settle_load(&self, ticket: LoadTicket, apply: impl FnOnce(&mut TodoState)) -> bool {
        let mut applied = false;
        self.state.send_modify(|s| {
            let mut clock = self.clock();
            applied = clock.settle(ticket);
            s.loading = clock.outstanding_loads > 0;
            if applied {
                apply(s);
            }
        });
        applied
    }

    fn clock(&self) -> MutexGuard<'_, SyncClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called from inside a state modification for every confirmed mutation.
    fn record_mutation(&self) {
        self.clock().confirmed_mutations += 1;
    }

    async fn fetch_all(&self) -> Result<Vec<TodoItem>, StoreError> {
        let response = self.round_trip(self.client.build_list_todos()).await?;
        Ok(self.client.parse_list_todos(response)?)
    }

    async fn try_add(&self, description: &str) -> Result<TodoItem, StoreError> {
        let description = required_description(description)?;
        tracing::debug!(%description, "adding todo...");

        let request = self.client.build_add_todo(&AddTodo { description })?;
        let response = self.round_trip(request).await?;
        let item = self.client.parse_add_todo(response)?;

        self.state.send_modify(|s| {
            self.record_mutation();
            match s.items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => s.items.push(item.clone()),
            }
        });
        self.notify(NoticeLevel::Info, "Todo added");
        Ok(item)
    }

    async fn try_remove(&self, id: TodoId) -> Result<(), StoreError> {
        tracing::debug!(%id, "removing todo...");
        let response = self.round_trip(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)?;

        self.state.send_if_modified(|s| {
            self.record_mutation();
            let before = s.items.len();
            s.items.retain(|item| item.id != id);
            let ended = s.end_edit_if(|_, edit| edit.id == id);
            s.items.len() != before || ended
        });
        self.notify(NoticeLevel::Info, "Todo deleted");
        Ok(())
    }

    async fn try_update(&self, id: TodoId, patch: TodoPatch) -> Result<TodoItem, StoreError> {
        let patch = normalize_patch(patch)?;
        let current = self.get(id).ok_or(ValidationError::UnknownTodo(id))?;
        let body = patch.merged(&current);
        tracing::debug!(%id, ?patch, "updating todo...");

        let request = self.client.build_update_todo(id, &body)?;
        let response = self.round_trip(request).await?;
        if let Some(echoed) = self.client.parse_update_todo(response)? {
            if echoed.description != body.description || echoed.completed != body.completed {
                tracing::debug!(%id, ?echoed, "server echoed a different item, applying local patch");
            }
        }

        let mut applied = None;
        self.state.send_if_modified(|s| {
            self.record_mutation();
            match s.items.iter_mut().find(|i| i.id == id) {
                Some(item) => {
                    patch.apply_to(item);
                    applied = Some(item.clone());
                    true
                }
                None => false,
            }
        });

        match applied {
            Some(item) => {
                self.notify(NoticeLevel::Info, "Todo updated");
                Ok(item)
            }
            None => {
                tracing::warn!(%id, "todo disappeared while its update was in flight");
                self.notify(
                    NoticeLevel::Warning,
                    "Todo was updated remotely but is no longer in the list",
                );
                let mut item = current;
                patch.apply_to(&mut item);
                Ok(item)
            }
        }
    }

    async fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.path, "calling backend");
        self.transport.execute(request).await
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        if notices.len() == NOTICE_CAPACITY {
            notices.pop_front();
        }
        notices.push_back(Notice {
            level,
            message: message.into(),
        });
    }

    /// Log `err` and queue it as a notice before handing it back.
    fn report(&self, action: &str, err: StoreError) -> StoreError {
        let level = if err.is_validation() {
            tracing::debug!(error = %err, "rejected {action}");
            NoticeLevel::Warning
        } else {
            tracing::warn!(error = %err, "failed to {action}");
            NoticeLevel::Error
        };
        self.notify(level, format!("Could not {action}: {err}"));
        err
    }
}

fn required_description(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

fn normalize_patch(patch: TodoPatch) -> Result<TodoPatch, ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    let description = patch
        .description
        .as_deref()
        .map(required_description)
        .transpose()?;
    Ok(TodoPatch {
        description,
        completed: patch.completed,
    })
}
