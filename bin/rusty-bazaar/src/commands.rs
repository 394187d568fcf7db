//! One function per subcommand: lay out the page, boot it, act, print.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use bz_api::MarketApi;
use bz_core::{Dialogs, Notifier, Upload};
use bz_ui::pages::conversations::PaneLayout;
use bz_ui::pages::my_ads::MyAdAction;
use bz_ui::pages::{ad_detail, ad_form, admin, auth, catalog, conversations, moderation, my_ads, nav, profile};
use bz_ui::{Document, Mounted, PageRouter, Submission, Surface, ViewContext};
use uuid::Uuid;

use crate::Command;

/// Everything a page needs except the page itself.
pub struct Shell {
    pub api: Arc<MarketApi>,
    pub notifier: Arc<dyn Notifier>,
    pub dialogs: Arc<dyn Dialogs>,
    pub search_debounce: Duration,
}

const NAV: [&str; 9] = [
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

const AD_DETAIL: [&str; 7] = [
    ad_detail::TITLE,
    ad_detail::PRICE,
    ad_detail::CATEGORY,
    ad_detail::DESCRIPTION,
    ad_detail::SELLER,
    ad_detail::DATE,
    ad_detail::GALLERY,
];

struct Page {
    doc: Arc<Document>,
    router: PageRouter,
}

impl Page {
    fn ctx(&self) -> &ViewContext {
        self.router.context()
    }
}

impl Shell {
    /// Builds a page at `location` declaring `anchors` plus the nav bar.
    fn page(&self, location: &str, anchors: &[&str], layout: impl FnOnce(Document) -> Document) -> Page {
        let doc = NAV
            .iter()
            .fold(Document::new(location), |doc, a| doc.with_hidden(a))
            .with_anchors(anchors);
        let doc = Arc::new(layout(doc));
        let ctx = ViewContext::new(
            self.api.clone(),
            doc.clone(),
            self.notifier.clone(),
            self.dialogs.clone(),
        );
        Page {
            doc,
            router: PageRouter::new(ctx, self.search_debounce),
        }
    }
}

pub async fn run(shell: &Shell, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let page = shell.page("/login", &[auth::LOGIN_FORM], |doc| {
                doc.with_value(auth::EMAIL, &email)
                    .with_value(auth::PASSWORD, &password)
            });
            let mounted = page.router.boot().await;
            let form = mounted.login.as_ref().ok_or_else(|| missing("login form"))?;
            settle(form.submit().await)?;
            print_page(&page.doc);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let page = shell.page("/register", &[auth::REGISTER_FORM], |doc| {
                doc.with_value(auth::USERNAME, &username)
                    .with_value(auth::EMAIL, &email)
                    .with_value(auth::PASSWORD, &password)
            });
            let mounted = page.router.boot().await;
            let form = mounted.register.as_ref().ok_or_else(|| missing("register form"))?;
            settle(form.submit().await)?;
            print_page(&page.doc);
        }
        Command::Logout => {
            let page = shell.page("/", &[auth::LOGOUT_BUTTON], |doc| doc);
            let _mounted = page.router.boot().await;
            settle(auth::logout(page.ctx()))?;
            print_page(&page.doc);
        }
        Command::Ads { query, category } => {
            let page = shell.page(
                "/",
                &[catalog::ADS_LIST, catalog::SEARCH_INPUT, catalog::CATEGORY_FILTER],
                |doc| {
                    doc.with_hidden(catalog::EMPTY_ADS)
                        .with_value(catalog::SEARCH_INPUT, query.as_deref().unwrap_or_default())
                        .with_value(
                            catalog::CATEGORY_FILTER,
                            &category.map(|c| c.to_string()).unwrap_or_default(),
                        )
                },
            );
            let _mounted = page.router.boot().await;
            print_page(&page.doc);
        }
        Command::Ad { id } => {
            let (page, _mounted) = detail_page(shell, id, None).await;
            print_page(&page.doc);
        }
        Command::Report { id, reason } => {
            let (page, mounted) = detail_page(shell, id, None).await;
            let detail = mounted.ad_detail.as_ref().ok_or_else(|| missing("ad"))?;
            detail.open_report();
            page.doc.set_value(ad_detail::REPORT_REASON, &reason);
            settle(detail.submit_report().await)?;
            print_page(&page.doc);
        }
        Command::Close { id } => {
            let (page, mounted) = detail_page(shell, id, None).await;
            let detail = mounted.ad_detail.as_ref().ok_or_else(|| missing("ad"))?;
            settle(detail.close().await)?;
            print_page(&page.doc);
        }
        Command::Contact { id, text } => {
            let embedded = PaneLayout::Embedded.anchors();
            let (page, mounted) = detail_page(shell, id, Some(embedded.all())).await;
            let detail = mounted.ad_detail.as_ref().ok_or_else(|| missing("ad"))?;
            if let Some(pane) = settle(detail.contact_seller().await)? {
                page.doc.set_value(embedded.input, &text);
                settle(pane.send().await)?;
            }
            print_page(&page.doc);
        }
        Command::MyAds => {
            let page = shell.page("/my-ads", &[my_ads::MY_ADS_LIST], |doc| doc);
            let _mounted = page.router.boot().await;
            print_page(&page.doc);
        }
        Command::Reopen { id } => {
            let page = shell.page("/my-ads", &[my_ads::MY_ADS_LIST], |doc| doc);
            let mounted = page.router.boot().await;
            let list = mounted.my_ads.as_ref().ok_or_else(|| missing("my ads"))?;
            settle(list.dispatch(id, MyAdAction::Reopen).await)?;
            print_page(&page.doc);
        }
        Command::Conversations { id, send } => {
            let mut anchors = vec![conversations::CONV_LIST];
            anchors.extend(PaneLayout::Standalone.anchors().all());
            let page = shell.page("/conversations", &anchors, |doc| doc);
            let mounted = page.router.boot().await;
            let convs = mounted.conversations.as_ref().ok_or_else(|| missing("conversations"))?;
            if let Some(id) = id {
                settle(convs.open(id).await)?;
                if let Some(text) = send {
                    page.doc.set_value(PaneLayout::Standalone.anchors().input, &text);
                    settle(convs.send().await)?;
                }
            }
            print_page(&page.doc);
        }
        Command::CreateAd {
            title,
            price,
            category,
            description,
            location,
            files,
        } => {
            let uploads = files
                .iter()
                .map(|path| read_upload(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let page = shell.page(
                "/ads/new",
                &[ad_form::CREATE_FORM, ad_form::CATEGORY],
                |doc| {
                    doc.with_value(ad_form::TITLE, &title)
                        .with_value(ad_form::PRICE, &price)
                        .with_value(ad_form::DESCRIPTION, &description)
                        .with_value(ad_form::LOCATION, location.as_deref().unwrap_or_default())
                        .with_files(ad_form::IMAGES, uploads)
                },
            );
            let mounted = page.router.boot().await;
            page.doc.set_value(ad_form::CATEGORY, &category.to_string());
            let form = mounted.ad_form.as_ref().ok_or_else(|| missing("ad form"))?;
            if let Some(report) = settle(form.submit().await)? {
                println!("ad {} saved, {} image(s) attached", report.ad_id, report.attached().count());
            }
            print_page(&page.doc);
        }
        Command::Profile { username, email } => {
            let page = shell.page(
                "/profile",
                &[profile::PROFILE_FORM, profile::USERNAME, profile::EMAIL],
                |doc| doc,
            );
            let mounted = page.router.boot().await;
            let form = mounted.profile.as_ref().ok_or_else(|| missing("profile (login first)"))?;
            if username.is_some() || email.is_some() {
                if let Some(username) = &username {
                    page.doc.set_value(profile::USERNAME, username);
                }
                if let Some(email) = &email {
                    page.doc.set_value(profile::EMAIL, email);
                }
                settle(form.save().await)?;
            }
            print_page(&page.doc);
        }
        Command::Admin { new_category } => {
            let mut anchors = vec![
                admin::ADMIN_CONTENT,
                admin::USERS_LIST,
                admin::CATEGORIES_LIST,
                admin::CREATE_CATEGORY_FORM,
                admin::NEW_CATEGORY_NAME,
                moderation::ADMIN_REPORTS,
            ];
            anchors.extend(admin::TABS);
            let page = shell.page("/admin", &anchors, |doc| doc);
            let mounted = page.router.boot().await;
            if let (Some(name), Some(dashboard)) = (new_category, mounted.admin.as_ref()) {
                page.doc.set_value(admin::NEW_CATEGORY_NAME, &name);
                settle(dashboard.create_category().await)?;
            }
            print_page(&page.doc);
        }
        Command::Moderator => {
            let page = shell.page("/moderator", &[moderation::MODERATOR_REPORTS], |doc| doc);
            let _mounted = page.router.boot().await;
            print_page(&page.doc);
        }
    }
    Ok(())
}

async fn detail_page(shell: &Shell, id: Uuid, extra: Option<Vec<&'static str>>) -> (Page, Mounted) {
    let mut anchors = AD_DETAIL.to_vec();
    anchors.extend(extra.unwrap_or_default());
    let page = shell.page(&format!("/ads/{id}"), &anchors, |doc| {
        doc.with_hidden(ad_detail::EDIT_BUTTON)
            .with_hidden(ad_detail::CLOSE_BUTTON)
            .with_anchor(ad_detail::WRITE_BUTTON)
            .with_hidden(ad_detail::REPORT_MODAL)
            .with_anchor(ad_detail::REPORT_REASON)
            .with_anchor(ad_detail::SUBMIT_REPORT)
    });
    let mounted = page.router.boot().await;
    (page, mounted)
}

fn missing(what: &str) -> anyhow::Error {
    anyhow!("{what} is not available on this page")
}

/// Busy and cancelled actions are not errors; the notifier already showed
/// any failure message.
fn settle<T>(outcome: Submission<T>) -> anyhow::Result<Option<T>> {
    match outcome {
        Submission::Done(value) => Ok(Some(value)),
        Submission::Busy => {
            tracing::info!("action already in flight");
            Ok(None)
        }
        Submission::Cancelled => {
            tracing::info!("action cancelled");
            Ok(None)
        }
        Submission::Failed(err) => Err(anyhow::Error::new(err).context("action failed")),
    }
}

fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(Upload::new(file_name, content_type.essence_str(), bytes))
}

fn print_page(doc: &Document) {
    for (anchor, el) in doc.snapshot() {
        if !el.visible || anchor.contains('/') {
            continue;
        }
        if !el.text.is_empty() {
            println!("{anchor}: {}", el.text);
        }
        if !el.html.is_empty() {
            println!("--- {anchor} ---\n{}", el.html);
        }
        if let Some(href) = &el.href {
            println!("{anchor} -> {href}");
        }
    }
    for location in doc.navigations() {
        println!("navigate: {location}");
    }
}
