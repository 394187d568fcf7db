//! # PageRouter
//!
//! Runs on page load: probes the surface for the anchors that identify each
//! page and runs every matching setup routine. Routines are independent; a
//! failing one is logged and the rest still run.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::binder::ListBinder;
use crate::context::ViewContext;
use crate::pages::ad_detail::{self, AdDetailPage};
use crate::pages::ad_form::{self, AdForm};
use crate::pages::admin::{self, AdminPage};
use crate::pages::auth::{self, LoginForm, RegisterForm};
use crate::pages::catalog::{self, AdsPage};
use crate::pages::conversations::{self, ConversationsPage};
use crate::pages::moderation::{self, ReportsSource};
use crate::pages::my_ads::{self, MyAdsSource};
use crate::pages::profile::{self, ProfilePage};
use crate::pages::{nav, path_id};

/// Handles to everything set up for the current page. Dropping it stops the
/// navigation bar watcher.
#[derive(Default)]
pub struct Mounted {
    pub nav: Option<JoinHandle<()>>,
    pub login: Option<LoginForm>,
    pub register: Option<RegisterForm>,
    pub logout: bool,
    pub ads: Option<AdsPage>,
    pub ad_form: Option<AdForm>,
    pub conversations: Option<ConversationsPage>,
    pub reports: Option<ListBinder<ReportsSource>>,
    pub ad_detail: Option<AdDetailPage>,
    pub admin: Option<AdminPage>,
    pub my_ads: Option<ListBinder<MyAdsSource>>,
    pub profile: Option<ProfilePage>,
    pub moderator: Option<ListBinder<ReportsSource>>,
}

impl Drop for Mounted {
    fn drop(&mut self) {
        if let Some(nav) = self.nav.take() {
            nav.abort();
        }
    }
}

pub struct PageRouter {
    ctx: ViewContext,
    search_debounce: Duration,
}

impl PageRouter {
    pub fn new(ctx: ViewContext, search_debounce: Duration) -> Self {
        Self {
            ctx,
            search_debounce,
        }
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    pub async fn boot(&self) -> Mounted {
        let ctx = &self.ctx;
        let has = |anchor: &str| ctx.surface.has(anchor);
        let location = ctx.surface.location();
        let mut mounted = Mounted::default();
        mounted.nav = Some(nav::mount(ctx));
        tracing::debug!(%location, "booting page");

        if has(auth::LOGIN_FORM) {
            mounted.login = Some(LoginForm::new(ctx.clone()));
        }
        if has(auth::REGISTER_FORM) {
            mounted.register = Some(RegisterForm::new(ctx.clone()));
        }
        mounted.logout = has(auth::LOGOUT_BUTTON);

        if let Err(err) = catalog::populate_categories(ctx).await {
            tracing::warn!(error = %err, "categories unavailable");
        }

        if has(catalog::ADS_LIST) {
            let page = AdsPage::new(ctx.clone(), self.search_debounce);
            page.load().await;
            mounted.ads = Some(page);
        }
        if has(ad_form::CREATE_FORM) {
            mounted.ad_form = Some(AdForm::create(ctx.clone()));
        }
        if has(ad_form::EDIT_FORM) {
            match path_id(&location, 1) {
                Some(id) => match AdForm::edit(ctx.clone(), id).await {
                    Ok(form) => mounted.ad_form = Some(form),
                    Err(err) => {
                        tracing::warn!(ad_id = %id, error = %err, "edit form not loaded");
                        ctx.report(&err, "Failed to load ad");
                    }
                },
                None => tracing::warn!(%location, "edit form without ad id"),
            }
        }
        if has(conversations::CONV_LIST) {
            let page = ConversationsPage::new(ctx.clone());
            page.list().load().await;
            mounted.conversations = Some(page);
        }
        if has(moderation::REPORT_LIST) {
            let list = ListBinder::new(ctx.clone(), ReportsSource::read_only());
            list.load().await;
            mounted.reports = Some(list);
        }
        if has(ad_detail::TITLE) {
            match path_id(&location, 1) {
                Some(id) => match AdDetailPage::load(ctx.clone(), id).await {
                    Ok(page) => mounted.ad_detail = Some(page),
                    Err(err) => {
                        tracing::warn!(ad_id = %id, error = %err, "ad detail not loaded");
                        ctx.report(&err, "Failed to load ad");
                    }
                },
                None => tracing::warn!(%location, "detail page without ad id"),
            }
        }
        if has(admin::ADMIN_CONTENT) {
            mounted.admin = AdminPage::mount(ctx.clone()).await;
        }
        if has(my_ads::MY_ADS_LIST) {
            let list = ListBinder::new(ctx.clone(), MyAdsSource);
            list.load().await;
            mounted.my_ads = Some(list);
        }
        if has(profile::PROFILE_FORM) {
            if let Some(page) = ProfilePage::mount(ctx.clone()) {
                if let Err(err) = page.load().await {
                    tracing::warn!(error = %err, "profile not loaded");
                    ctx.report(&err, "Failed to load profile");
                }
                mounted.profile = Some(page);
            }
        }
        if has(moderation::MODERATOR_REPORTS) {
            let list = moderation::moderator_page(ctx.clone());
            list.load().await;
            mounted.moderator = Some(list);
        }
        mounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Document;
    use bz_api::{MarketApi, RequestGateway};
    use bz_core::{MemoryStore, MockDialogs, MockNotifier, SessionStore};
    use std::sync::Arc;

    fn context(doc: Arc<Document>) -> ViewContext {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        let api = Arc::new(MarketApi::new(RequestGateway::new("http://127.0.0.1:9/api", session)));
        ViewContext::new(api, doc, Arc::new(MockNotifier::new()), Arc::new(MockDialogs::new()))
    }

    #[tokio::test]
    async fn only_present_anchors_are_mounted() {
        let doc = Arc::new(Document::new("/login").with_anchors(&[auth::LOGIN_FORM, nav::LOGIN]));
        let mounted = PageRouter::new(context(doc.clone()), Duration::ZERO).boot().await;

        assert!(mounted.login.is_some());
        assert!(mounted.register.is_none());
        assert!(mounted.ads.is_none());
        assert!(mounted.admin.is_none());
        assert!(doc.is_visible(nav::LOGIN));
    }

    #[tokio::test]
    async fn anonymous_admin_page_shows_login_placeholder() {
        let doc = Arc::new(Document::new("/admin").with_anchor(admin::ADMIN_CONTENT));
        let mounted = PageRouter::new(context(doc.clone()), Duration::ZERO).boot().await;

        assert!(mounted.admin.is_none());
        assert!(doc.html(admin::ADMIN_CONTENT).contains("Please login"));
    }

    #[tokio::test]
    async fn anonymous_moderator_page_is_gated_before_any_request() {
        let doc = Arc::new(Document::new("/moderator").with_anchor(moderation::MODERATOR_REPORTS));
        let mounted = PageRouter::new(context(doc.clone()), Duration::ZERO).boot().await;

        assert!(mounted.moderator.is_some());
        assert!(doc
            .html(moderation::MODERATOR_REPORTS)
            .contains("Please login to view reports"));
    }
}
