//! Wires the real controller (gateway, API, session, binders) to a
//! [`Document`] and the fake backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bz_api::{MarketApi, RequestGateway};
use bz_core::{Dialogs, Identity, Level, MemoryStore, Notifier, SessionStore, User};
use bz_ui::pages::nav;
use bz_ui::{Document, PageRouter, ViewContext};
use secrecy::SecretString;

use crate::backend::FakeMarket;

#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<(Level, String)> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.with_level(Level::Error)
    }

    pub fn successes(&self) -> Vec<String> {
        self.with_level(Level::Success)
    }

    fn with_level(&self, level: Level) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

/// Answers every prompt with a fixed reply and remembers the prompts.
pub struct ScriptedDialogs {
    answer: AtomicBool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedDialogs {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer: AtomicBool::new(answer),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Dialogs for ScriptedDialogs {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        self.answer.load(Ordering::SeqCst)
    }
}

pub const NAV: [&str; 9] = [
    nav::LOGIN,
    nav::REGISTER,
    nav::USER,
    nav::USERNAME,
    nav::LOGOUT,
    nav::ADMIN,
    nav::MODERATOR,
    nav::MY_ADS,
    nav::PROFILE,
];

/// A page at `location` with the navigation bar and `anchors` declared.
pub fn page(location: &str, anchors: &[&str]) -> Document {
    NAV.iter()
        .fold(Document::new(location), |doc, a| doc.with_hidden(a))
        .with_anchors(anchors)
}

pub struct Harness {
    pub market: FakeMarket,
    pub doc: Arc<Document>,
    pub ctx: ViewContext,
    pub notes: Arc<RecordingNotifier>,
    pub dialogs: Arc<ScriptedDialogs>,
}

impl Harness {
    pub async fn start(market: &FakeMarket, doc: Document) -> Self {
        let api_root = market.serve().await;
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        let api = Arc::new(MarketApi::new(RequestGateway::new(api_root, session)));
        let doc = Arc::new(doc);
        let notes = Arc::new(RecordingNotifier::default());
        let dialogs = Arc::new(ScriptedDialogs::answering(true));
        let ctx = ViewContext::new(api, doc.clone(), notes.clone(), dialogs.clone());
        Self {
            market: market.clone(),
            doc,
            ctx,
            notes,
            dialogs,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.ctx.session()
    }

    /// Stores a backend-issued token and identity as a login would.
    pub fn sign_in(&self, user: &User) {
        let token = self.market.issue_token(user.id);
        self.session()
            .set_session(SecretString::from(token), Some(Identity::from(user)))
            .expect("session stored");
    }

    pub fn router(&self) -> PageRouter {
        PageRouter::new(self.ctx.clone(), Duration::ZERO)
    }
}

/// Yields until `check` holds, for effects driven by spawned watchers.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    check()
}
