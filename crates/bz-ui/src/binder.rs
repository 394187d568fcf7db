//! # ListBinder
//!
//! The fetch, render and wire cycle shared by every collection view. A
//! [`ListSource`] says where the list lives, how to fetch it, how to draw a
//! row and what each row action does; [`ListBinder`] owns the rows currently
//! shown, the empty and error placeholders, and the per-row in-flight guard.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use askama::Template;
use async_trait::async_trait;
use bz_core::{ClientError, ErrorKind, Result, Role};
use dashmap::DashSet;
use uuid::Uuid;

use crate::context::{Submission, ViewContext};
use crate::surface::{row_field, Surface};
use crate::templates::{Placeholder, Table};

/// Precondition checked against the session before anything is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

/// What an empty collection shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empty {
    /// A muted message inside the container.
    Message(&'static str),
    /// A separate anchor that is revealed while the container stays empty.
    Indicator(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Plain,
    Table(&'static [&'static str]),
}

/// How a row action changed the list.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    /// Replace the row in place.
    Updated(T),
    /// Drop the row in place.
    Removed,
    /// Fetch and redraw the whole list.
    Refetch,
    /// Leave the list as it is.
    Kept,
}

/// What the last load rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Rendered(usize),
    Empty,
    /// Gate failed locally or the backend refused the credential.
    Unauthenticated,
    Forbidden,
    Failed(ClientError),
}

/// Read access to the inputs rendered inside one row.
pub struct RowInput<'a> {
    surface: &'a dyn Surface,
    container: &'static str,
    row_id: Uuid,
}

impl<'a> RowInput<'a> {
    pub fn new(surface: &'a dyn Surface, container: &'static str, row_id: Uuid) -> Self {
        Self {
            surface,
            container,
            row_id,
        }
    }

    pub fn anchor(&self, field: &str) -> String {
        row_field(self.container, self.row_id, field)
    }

    pub fn value(&self, field: &str) -> String {
        self.surface.value(&self.anchor(field))
    }

    /// Checkbox state; stored as `"true"`/`"on"` when ticked.
    pub fn checked(&self, field: &str) -> bool {
        matches!(self.value(field).as_str(), "true" | "on")
    }

    pub fn clear_invalid(&self, fields: &[&str]) {
        for field in fields {
            self.surface.clear_invalid(&self.anchor(field));
        }
    }
}

#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Action: Copy + fmt::Debug + Send + Sync + 'static;

    /// Anchor the rows are rendered into.
    fn container(&self) -> &'static str;

    /// Plural noun used in placeholders, e.g. `"reports"`.
    fn noun(&self) -> &'static str;

    fn gate(&self) -> Gate {
        Gate::Public
    }

    fn empty(&self) -> Empty;

    fn frame(&self) -> Frame {
        Frame::Plain
    }

    fn row_id(&self, item: &Self::Item) -> Uuid;

    fn render_row(&self, item: &Self::Item, busy: bool) -> askama::Result<String>;

    /// Editable inputs a row exposes, with their initial values.
    fn fields(&self, _item: &Self::Item) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Prompt to show before running `action`; `None` runs it directly.
    fn confirmation(&self, _action: Self::Action, _row: &RowInput<'_>) -> Option<&'static str> {
        None
    }

    /// Notification text when `action` fails without a backend message.
    fn fallback(&self, _action: Self::Action) -> &'static str {
        "Action failed"
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Self::Item>>;

    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Self::Item,
        action: Self::Action,
        row: &RowInput<'_>,
    ) -> Result<RowOutcome<Self::Item>>;
}

pub struct ListBinder<S: ListSource> {
    ctx: ViewContext,
    source: S,
    rows: Mutex<Vec<S::Item>>,
    in_flight: DashSet<Uuid>,
}

impl<S: ListSource> ListBinder<S> {
    pub fn new(ctx: ViewContext, source: S) -> Self {
        Self {
            ctx,
            source,
            rows: Mutex::new(Vec::new()),
            in_flight: DashSet::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Rows as currently shown.
    pub fn rows(&self) -> Vec<S::Item> {
        self.lock_rows().clone()
    }

    pub fn is_busy(&self, row_id: Uuid) -> bool {
        self.in_flight.contains(&row_id)
    }

    /// Checks the gate, fetches, and redraws the container from scratch.
    pub async fn load(&self) -> ListState {
        let session = self.ctx.session();
        let gated = match self.source.gate() {
            Gate::Public => None,
            Gate::Authenticated if !session.is_authenticated() => Some(ListState::Unauthenticated),
            Gate::Roles(_) if !session.is_authenticated() => Some(ListState::Unauthenticated),
            Gate::Roles(roles) if !session.has_role(roles) => Some(ListState::Forbidden),
            _ => None,
        };
        if let Some(state) = gated {
            self.show_state(&state);
            return state;
        }

        match self.source.fetch(&self.ctx).await {
            Ok(items) => {
                let count = items.len();
                let previous = std::mem::replace(&mut *self.lock_rows(), items);
                self.unmount_all(&previous);
                self.render();
                self.mount_all();
                if count == 0 {
                    ListState::Empty
                } else {
                    ListState::Rendered(count)
                }
            }
            Err(err) => {
                let state = match err.kind() {
                    ErrorKind::Unauthenticated => ListState::Unauthenticated,
                    ErrorKind::Forbidden => ListState::Forbidden,
                    _ => {
                        tracing::warn!(list = self.source.container(), error = %err, "list load failed");
                        ListState::Failed(err)
                    }
                };
                let previous = std::mem::take(&mut *self.lock_rows());
                self.unmount_all(&previous);
                self.show_state(&state);
                state
            }
        }
    }

    /// Runs `action` on one row. The row is drawn busy (controls disabled)
    /// until the request settles; a second action on the same row meanwhile
    /// returns [`Submission::Busy`] without sending anything.
    pub async fn dispatch(&self, row_id: Uuid, action: S::Action) -> Submission<()> {
        let Some(item) = self
            .lock_rows()
            .iter()
            .find(|item| self.source.row_id(item) == row_id)
            .cloned()
        else {
            return Submission::Failed(ClientError::NotFound {
                message: format!("No such row in {}", self.source.noun()),
            });
        };

        if !self.in_flight.insert(row_id) {
            tracing::debug!(%row_id, ?action, "row action already in flight");
            return Submission::Busy;
        }
        let guard = RowGuard {
            set: &self.in_flight,
            row_id,
        };

        let surface = self.ctx.surface.as_ref();
        let row = RowInput::new(surface, self.source.container(), row_id);
        if let Some(prompt) = self.source.confirmation(action, &row) {
            if !self.ctx.dialogs.confirm(prompt) {
                return Submission::Cancelled;
            }
        }

        self.render();
        let outcome = self.source.perform(&self.ctx, &item, action, &row).await;
        drop(guard);

        match outcome {
            Ok(RowOutcome::Updated(updated)) => {
                if let Some(slot) = self
                    .lock_rows()
                    .iter_mut()
                    .find(|it| self.source.row_id(it) == row_id)
                {
                    *slot = updated.clone();
                }
                self.render();
                self.mount_fields(&updated);
            }
            Ok(RowOutcome::Removed) => {
                self.lock_rows()
                    .retain(|it| self.source.row_id(it) != row_id);
                self.unmount_fields(&item);
                self.render();
            }
            Ok(RowOutcome::Refetch) => {
                let _ = self.load().await;
            }
            Ok(RowOutcome::Kept) => self.render(),
            Err(err) => {
                self.ctx.report(&err, self.source.fallback(action));
                self.render();
                return Submission::Failed(err);
            }
        }
        Submission::Done(())
    }

    fn show_state(&self, state: &ListState) {
        let surface = self.ctx.surface.as_ref();
        let noun = self.source.noun();
        let placeholder = match state {
            ListState::Unauthenticated => Placeholder::muted(&format!("Please login to view {noun}")).render(),
            ListState::Forbidden => Placeholder::danger("Insufficient permissions").render(),
            ListState::Failed(_) => Placeholder::danger(&format!("Failed to load {noun}")).render(),
            ListState::Rendered(_) | ListState::Empty => return,
        };
        if let Empty::Indicator(anchor) = self.source.empty() {
            surface.set_visible(anchor, false);
        }
        match placeholder {
            Ok(html) => surface.set_html(self.source.container(), html),
            Err(err) => tracing::error!(error = %err, "placeholder render failed"),
        }
    }

    fn render(&self) {
        let surface = self.ctx.surface.as_ref();
        let container = self.source.container();
        let rows = self.lock_rows().clone();

        if rows.is_empty() {
            let html = match self.source.empty() {
                Empty::Message(text) => Placeholder::muted(text).render(),
                Empty::Indicator(anchor) => {
                    surface.set_visible(anchor, true);
                    Ok(String::new())
                }
            };
            match html {
                Ok(html) => surface.set_html(container, html),
                Err(err) => tracing::error!(error = %err, "placeholder render failed"),
            }
            return;
        }

        if let Empty::Indicator(anchor) = self.source.empty() {
            surface.set_visible(anchor, false);
        }
        let rendered: askama::Result<Vec<String>> = rows
            .iter()
            .map(|item| {
                let busy = self.in_flight.contains(&self.source.row_id(item));
                self.source.render_row(item, busy)
            })
            .collect();
        let html = rendered.and_then(|rows| match self.source.frame() {
            Frame::Plain => Ok(rows.concat()),
            Frame::Table(headers) => Table { headers, rows }.render(),
        });
        match html {
            Ok(html) => surface.set_html(container, html),
            Err(err) => tracing::error!(list = container, error = %err, "row render failed"),
        }
    }

    fn mount_all(&self) {
        for item in self.lock_rows().clone() {
            self.mount_fields(&item);
        }
    }

    fn mount_fields(&self, item: &S::Item) {
        let id = self.source.row_id(item);
        for (field, value) in self.source.fields(item) {
            self.ctx
                .surface
                .mount_field(&row_field(self.source.container(), id, field), &value);
        }
    }

    fn unmount_all(&self, items: &[S::Item]) {
        for item in items {
            self.unmount_fields(item);
        }
    }

    fn unmount_fields(&self, item: &S::Item) {
        let id = self.source.row_id(item);
        for (field, _) in self.source.fields(item) {
            self.ctx
                .surface
                .unmount_field(&row_field(self.source.container(), id, field));
        }
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, Vec<S::Item>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct RowGuard<'a> {
    set: &'a DashSet<Uuid>,
    row_id: Uuid,
}

impl Drop for RowGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.row_id);
    }
}
