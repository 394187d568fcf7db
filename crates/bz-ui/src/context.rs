//! # ViewContext
//!
//! Everything a page handler needs, passed explicitly: the API facade (which
//! carries the session), the page surface, and the notification and
//! confirmation ports. Cheap to clone; every field is shared.

use std::future::Future;
use std::sync::Arc;

use bz_api::MarketApi;
use bz_core::{ClientError, Dialogs, Level, Notifier, Result, SessionStore};
use dashmap::DashSet;

use crate::surface::Surface;

/// Result of a user-triggered action.
#[derive(Debug)]
#[must_use]
pub enum Submission<T> {
    Done(T),
    /// The same action was already in flight; nothing was sent.
    Busy,
    /// The user declined the confirmation prompt, or there was nothing to send.
    Cancelled,
    Failed(ClientError),
}

impl<T> Submission<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Submission::Done(_))
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Submission::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn done(self) -> Option<T> {
        match self {
            Submission::Done(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ViewContext {
    pub api: Arc<MarketApi>,
    pub surface: Arc<dyn Surface>,
    pub notifier: Arc<dyn Notifier>,
    pub dialogs: Arc<dyn Dialogs>,
    in_flight: Arc<DashSet<String>>,
}

impl ViewContext {
    pub fn new(
        api: Arc<MarketApi>,
        surface: Arc<dyn Surface>,
        notifier: Arc<dyn Notifier>,
        dialogs: Arc<dyn Dialogs>,
    ) -> Self {
        Self {
            api,
            surface,
            notifier,
            dialogs,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.api.session()
    }

    pub fn success(&self, message: &str) {
        self.notifier.notify(Level::Success, message);
    }

    /// Surfaces a failure. Local validation marks the offending field; backend
    /// failures show the backend's text when it sent any; anything else shows
    /// `fallback`.
    pub fn report(&self, err: &ClientError, fallback: &str) {
        match err {
            ClientError::Validation {
                field: Some(field),
                message,
                status: None,
            } => {
                self.surface.mark_invalid(field, message);
                self.notifier.notify(Level::Error, message);
            }
            err if err.is_domain() => {
                let text = err.backend_message().unwrap_or(fallback);
                self.notifier.notify(Level::Error, text);
            }
            err => {
                tracing::warn!(error = %err, "request failed");
                self.notifier.notify(Level::Error, fallback);
            }
        }
    }

    pub fn clear_invalid(&self, fields: &[&str]) {
        for field in fields {
            self.surface.clear_invalid(field);
        }
    }

    /// Runs a form action with its trigger disabled for the duration. A
    /// second call while the first is pending returns [`Submission::Busy`]
    /// without polling `action`.
    pub async fn submit<T, F>(&self, trigger: &str, fallback: &str, action: F) -> Submission<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.in_flight.insert(trigger.to_string()) {
            tracing::debug!(trigger, "duplicate submission ignored");
            return Submission::Busy;
        }
        let _release = Release {
            set: &self.in_flight,
            key: trigger,
            surface: self.surface.as_ref(),
        };
        self.surface.set_disabled(trigger, true);

        match action.await {
            Ok(value) => Submission::Done(value),
            Err(err) => {
                self.report(&err, fallback);
                Submission::Failed(err)
            }
        }
    }
}

/// Re-enables a trigger even when the action future is dropped midway.
struct Release<'a> {
    set: &'a DashSet<String>,
    key: &'a str,
    surface: &'a dyn Surface,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.set.remove(self.key);
        self.surface.set_disabled(self.key, false);
    }
}
