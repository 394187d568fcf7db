//! Single ad view: fields, gallery, owner/staff actions, contact seller and
//! the report modal.

use askama::Template;
use bz_core::{validation, Ad, AdStatus, ClientError, Level, Result};
use uuid::Uuid;

use super::conversations::{ConversationPane, PaneLayout};
use crate::context::{Submission, ViewContext};
use crate::templates::{price_label, MediaThumb};

pub const TITLE: &str = "ad-title";
pub const PRICE: &str = "ad-price";
pub const CATEGORY: &str = "ad-category";
pub const DESCRIPTION: &str = "ad-description";
pub const SELLER: &str = "seller-name";
pub const DATE: &str = "ad-date";
pub const GALLERY: &str = "ad-gallery";
pub const EDIT_BUTTON: &str = "edit-ad-btn";
pub const CLOSE_BUTTON: &str = "close-ad-btn";
pub const WRITE_BUTTON: &str = "write-btn";
pub const REPORT_MODAL: &str = "report-modal";
pub const REPORT_REASON: &str = "report-reason";
pub const SUBMIT_REPORT: &str = "submit-report";

pub struct AdDetailPage {
    ctx: ViewContext,
    ad: Ad,
}

impl AdDetailPage {
    /// Fetches and renders the ad, then reveals the actions the stored
    /// identity may use. The backend still authorizes every action.
    pub async fn load(ctx: ViewContext, ad_id: Uuid) -> Result<Self> {
        let ad = ctx.api.get_ad(ad_id).await?;
        let surface = ctx.surface.as_ref();

        surface.set_text(TITLE, &ad.title);
        surface.set_text(PRICE, &price_label(ad.price));
        let category = ad
            .category_name
            .clone()
            .or_else(|| ad.category_id.map(|id| id.to_string()))
            .unwrap_or_else(|| "N/A".into());
        surface.set_text(CATEGORY, &category);
        let description = ad
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description provided".into());
        surface.set_text(DESCRIPTION, &description);
        let seller = ad
            .author_username
            .clone()
            .unwrap_or_else(|| "Unknown seller".into());
        surface.set_text(SELLER, &seller);
        if let Some(created) = ad.created_at {
            surface.set_text(DATE, &created.format("%b %-d, %Y").to_string());
        }

        match ctx.api.list_media(ad.id).await {
            Ok(media) => {
                let thumbs: askama::Result<Vec<String>> = media
                    .iter()
                    .map(|m| MediaThumb::new(m, false, false).render())
                    .collect();
                match thumbs {
                    Ok(thumbs) => surface.set_html(GALLERY, thumbs.concat()),
                    Err(err) => tracing::error!(error = %err, "gallery render failed"),
                }
            }
            Err(err) => tracing::warn!(ad_id = %ad.id, error = %err, "media list unavailable"),
        }

        let page = Self { ctx, ad };
        page.reveal_actions();
        Ok(page)
    }

    pub fn ad(&self) -> &Ad {
        &self.ad
    }

    fn can_manage(&self) -> bool {
        let session = self.ctx.session();
        if !session.is_authenticated() {
            return false;
        }
        let owner = session.user_id() == Some(self.ad.author_id);
        let staff = session.role().is_some_and(|r| r.is_staff());
        owner || staff
    }

    fn reveal_actions(&self) {
        let surface = self.ctx.surface.as_ref();
        let manage = self.can_manage();
        if manage {
            surface.set_link(EDIT_BUTTON, &format!("/ads/{}/edit", self.ad.id));
        }
        surface.set_visible(EDIT_BUTTON, manage);
        surface.set_visible(CLOSE_BUTTON, manage && self.ad.status == AdStatus::Active);
    }

    /// Closes the ad after confirmation and reloads the page.
    pub async fn close(&self) -> Submission<()> {
        if !self.ctx.dialogs.confirm("Close this ad? You can reopen it later.") {
            return Submission::Cancelled;
        }
        let ctx = &self.ctx;
        let location = ctx.surface.location();
        ctx.submit(CLOSE_BUTTON, "Failed to close ad", async {
            ctx.api.set_ad_status(self.ad.id, AdStatus::Closed).await?;
            ctx.success("Ad closed");
            ctx.surface.navigate(&location);
            Ok::<_, ClientError>(())
        })
        .await
    }

    /// Creates or resumes the conversation with the seller and opens it in
    /// the embedded pane.
    pub async fn contact_seller(&self) -> Submission<ConversationPane> {
        let ctx = &self.ctx;
        if !ctx.session().is_authenticated() {
            return self.require_login("Please login to message");
        }
        ctx.submit(WRITE_BUTTON, "Could not open conversation", async {
            let conversation = ctx.api.open_conversation(self.ad.id, self.ad.author_id).await?;
            let pane = ConversationPane::new(ctx.clone(), conversation.id, PaneLayout::Embedded);
            pane.refresh().await?;
            Ok::<_, ClientError>(pane)
        })
        .await
    }

    pub fn open_report(&self) {
        self.ctx.surface.set_visible(REPORT_MODAL, true);
    }

    /// Submits the report typed into the modal. A blank reason is rejected
    /// locally and nothing is sent.
    pub async fn submit_report(&self) -> Submission<()> {
        let ctx = &self.ctx;
        if !ctx.session().is_authenticated() {
            return self.require_login("Please login to submit a report");
        }
        ctx.clear_invalid(&[REPORT_REASON]);
        ctx.submit(SUBMIT_REPORT, "Submit failed", async {
            let reason = ctx.surface.value(REPORT_REASON);
            let reason = validation::required(REPORT_REASON, &reason, "Please enter a reason")?;
            ctx.api.create_report(self.ad.id, reason).await?;
            ctx.success("Report submitted");
            ctx.surface.set_visible(REPORT_MODAL, false);
            ctx.surface.set_value(REPORT_REASON, "");
            Ok::<_, ClientError>(())
        })
        .await
    }

    fn require_login<T>(&self, message: &str) -> Submission<T> {
        self.ctx.notifier.notify(Level::Error, message);
        self.ctx.surface.navigate("/login");
        Submission::Failed(ClientError::Unauthenticated {
            message: message.to_string(),
            code: None,
        })
    }
}
