//! Conversation list and the two message panes: the one embedded in the ad
//! detail page and the standalone one opened from the list.
//!
//! A pane never appends optimistically: after a send it fetches and redraws
//! the whole thread.

use std::sync::{Mutex, PoisonError};

use askama::Template;
use async_trait::async_trait;
use bz_core::{ClientError, Conversation, Result};
use uuid::Uuid;

use crate::binder::{Empty, Gate, ListBinder, ListSource, RowInput, RowOutcome};
use crate::context::{Submission, ViewContext};
use crate::templates::{ConversationRow, MessageLine};

pub const CONV_LIST: &str = "conv-list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneLayout {
    /// Inside the ad detail page.
    Embedded,
    /// Opened from the conversation list.
    Standalone,
}

pub struct PaneAnchors {
    pub pane: &'static str,
    pub header: Option<&'static str>,
    pub messages: &'static str,
    pub form: &'static str,
    pub input: &'static str,
}

impl PaneAnchors {
    pub fn all(&self) -> Vec<&'static str> {
        let mut all = vec![self.pane, self.messages, self.form, self.input];
        all.extend(self.header);
        all
    }
}

impl PaneLayout {
    pub fn anchors(self) -> PaneAnchors {
        match self {
            PaneLayout::Embedded => PaneAnchors {
                pane: "ad-conversation",
                header: None,
                messages: "ad-messages",
                form: "ad-msg-form",
                input: "ad-msg-text",
            },
            PaneLayout::Standalone => PaneAnchors {
                pane: "conv-pane",
                header: Some("conv-header"),
                messages: "messages",
                form: "msg-form",
                input: "msg-text",
            },
        }
    }
}

pub struct ConversationPane {
    ctx: ViewContext,
    id: Uuid,
    layout: PaneLayout,
}

impl ConversationPane {
    pub fn new(ctx: ViewContext, id: Uuid, layout: PaneLayout) -> Self {
        Self { ctx, id, layout }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reveals the pane and redraws the thread, oldest message first.
    pub async fn refresh(&self) -> Result<usize> {
        let anchors = self.layout.anchors();
        let surface = self.ctx.surface.as_ref();
        surface.set_visible(anchors.pane, true);
        if let Some(header) = anchors.header {
            surface.set_text(header, &format!("Conversation {}", self.id));
        }

        let messages = self.ctx.api.messages(self.id).await?;
        let compact = self.layout == PaneLayout::Standalone;
        let lines: askama::Result<Vec<String>> = messages
            .iter()
            .map(|m| MessageLine::new(m, compact).render())
            .collect();
        match lines {
            Ok(lines) => surface.set_html(anchors.messages, lines.concat()),
            Err(err) => tracing::error!(conversation = %self.id, error = %err, "message render failed"),
        }
        Ok(messages.len())
    }

    /// Sends the typed text, clears the input and redraws the thread. Blank
    /// input sends nothing.
    pub async fn send(&self) -> Submission<usize> {
        let anchors = self.layout.anchors();
        let text = self.ctx.surface.value(anchors.input);
        let text = text.trim();
        if text.is_empty() {
            return Submission::Cancelled;
        }

        self.ctx
            .submit(anchors.form, "Send failed", async {
                self.ctx.api.send_message(self.id, text).await?;
                self.ctx.surface.set_value(anchors.input, "");
                self.refresh().await
            })
            .await
    }
}

/// Conversations the signed-in user takes part in. "Open" loads the
/// standalone pane.
#[derive(Default)]
pub struct ConversationsSource {
    open: Mutex<Option<Uuid>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    Open,
}

impl ConversationsSource {
    /// Conversation currently shown in the standalone pane.
    pub fn open_conversation(&self) -> Option<Uuid> {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ListSource for ConversationsSource {
    type Item = Conversation;
    type Action = ConversationAction;

    fn container(&self) -> &'static str {
        CONV_LIST
    }

    fn noun(&self) -> &'static str {
        "conversations"
    }

    fn gate(&self) -> Gate {
        Gate::Authenticated
    }

    fn empty(&self) -> Empty {
        Empty::Message("No conversations yet")
    }

    fn row_id(&self, item: &Conversation) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Conversation, _busy: bool) -> askama::Result<String> {
        ConversationRow::from(item).render()
    }

    fn fallback(&self, _action: ConversationAction) -> &'static str {
        "Could not open conversation"
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Conversation>> {
        ctx.api.list_conversations().await
    }

    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Conversation,
        action: ConversationAction,
        _row: &RowInput<'_>,
    ) -> Result<RowOutcome<Conversation>> {
        match action {
            ConversationAction::Open => {
                ConversationPane::new(ctx.clone(), item.id, PaneLayout::Standalone)
                    .refresh()
                    .await?;
                *self.open.lock().unwrap_or_else(PoisonError::into_inner) = Some(item.id);
                Ok(RowOutcome::Kept)
            }
        }
    }
}

pub struct ConversationsPage {
    ctx: ViewContext,
    list: ListBinder<ConversationsSource>,
}

impl ConversationsPage {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            list: ListBinder::new(ctx.clone(), ConversationsSource::default()),
            ctx,
        }
    }

    pub fn list(&self) -> &ListBinder<ConversationsSource> {
        &self.list
    }

    pub async fn open(&self, conversation_id: Uuid) -> Submission<()> {
        self.list.dispatch(conversation_id, ConversationAction::Open).await
    }

    /// Sends into the conversation opened from the list.
    pub async fn send(&self) -> Submission<usize> {
        match self.list.source().open_conversation() {
            Some(id) => ConversationPane::new(self.ctx.clone(), id, PaneLayout::Standalone).send().await,
            None => Submission::Failed(ClientError::invalid("msg-text", "Open a conversation first")),
        }
    }
}
