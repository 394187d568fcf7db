//! Create and edit ad forms. Saving runs the ad save saga: core fields
//! first, then each picked file as its own upload. Upload failures are
//! reported one by one; the ad stays saved either way.

use askama::Template;
use async_trait::async_trait;
use bz_api::{AdSave, AdSaveReport, AdSaveSaga};
use bz_core::{validation, AdDraft, ClientError, Level, Media, Result};
use uuid::Uuid;

use super::optional;
use crate::binder::{Empty, ListBinder, ListSource, ListState, RowInput, RowOutcome};
use crate::context::{Submission, ViewContext};
use crate::templates::MediaThumb;

pub const CREATE_FORM: &str = "create-ad-form";
pub const EDIT_FORM: &str = "edit-ad-form";
pub const EDIT_ID: &str = "edit-ad-id";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const PRICE: &str = "price";
pub const CATEGORY: &str = "category_id";
pub const LOCATION: &str = "location";
pub const IMAGES: &str = "images";
pub const EXISTING_MEDIA: &str = "existing-media";

const FIELDS: [&str; 4] = [TITLE, DESCRIPTION, PRICE, CATEGORY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Uuid),
}

/// Media already attached to the ad being edited.
pub struct MediaSource {
    ad_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    Delete,
}

#[async_trait]
impl ListSource for MediaSource {
    type Item = Media;
    type Action = MediaAction;

    fn container(&self) -> &'static str {
        EXISTING_MEDIA
    }

    fn noun(&self) -> &'static str {
        "media"
    }

    fn empty(&self) -> Empty {
        Empty::Message("No media yet")
    }

    fn row_id(&self, item: &Media) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Media, busy: bool) -> askama::Result<String> {
        MediaThumb::new(item, true, busy).render()
    }

    fn fallback(&self, _action: MediaAction) -> &'static str {
        "Delete failed"
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Media>> {
        ctx.api.list_media(self.ad_id).await
    }

    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Media,
        action: MediaAction,
        _row: &RowInput<'_>,
    ) -> Result<RowOutcome<Media>> {
        match action {
            MediaAction::Delete => {
                ctx.api.delete_media(item.id).await?;
                ctx.success("Media deleted");
                Ok(RowOutcome::Removed)
            }
        }
    }
}

pub struct AdForm {
    ctx: ViewContext,
    mode: FormMode,
    media: Option<ListBinder<MediaSource>>,
}

impl AdForm {
    pub fn create(ctx: ViewContext) -> Self {
        Self {
            ctx,
            mode: FormMode::Create,
            media: None,
        }
    }

    /// Pre-fills the form from the stored ad and lists its media.
    pub async fn edit(ctx: ViewContext, ad_id: Uuid) -> Result<Self> {
        let surface = ctx.surface.as_ref();
        surface.set_value(EDIT_ID, &ad_id.to_string());

        let ad = ctx.api.get_ad(ad_id).await?;
        surface.set_value(TITLE, &ad.title);
        surface.set_value(DESCRIPTION, ad.description.as_deref().unwrap_or_default());
        surface.set_value(PRICE, &ad.price.to_string());
        surface.set_value(
            CATEGORY,
            &ad.category_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        if let Some(location) = &ad.location {
            surface.set_value(LOCATION, location);
        }

        let media = ListBinder::new(ctx.clone(), MediaSource { ad_id });
        media.load().await;
        Ok(Self {
            ctx,
            mode: FormMode::Edit(ad_id),
            media: Some(media),
        })
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn media(&self) -> Option<&ListBinder<MediaSource>> {
        self.media.as_ref()
    }

    pub async fn reload_media(&self) -> Option<ListState> {
        match &self.media {
            Some(media) => Some(media.load().await),
            None => None,
        }
    }

    fn trigger(&self) -> &'static str {
        match self.mode {
            FormMode::Create => CREATE_FORM,
            FormMode::Edit(_) => EDIT_FORM,
        }
    }

    /// Reads and checks the core fields. Empty price counts as zero.
    pub fn draft(&self) -> Result<AdDraft> {
        let surface = self.ctx.surface.as_ref();
        let title = surface.value(TITLE);
        let title = validation::required(TITLE, &title, "Title required")?;

        let price = surface.value(PRICE);
        let price = match price.trim() {
            "" => 0.0,
            raw => raw
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite() && *p >= 0.0)
                .ok_or_else(|| ClientError::invalid(PRICE, "Invalid price"))?,
        };

        let category_id = surface
            .value(CATEGORY)
            .parse()
            .map_err(|_| ClientError::invalid(CATEGORY, "Select category"))?;

        Ok(AdDraft {
            title: title.to_string(),
            description: surface.value(DESCRIPTION),
            price,
            category_id,
            location: optional(surface.value(LOCATION)),
        })
    }

    /// Saves the ad and uploads the picked files, then opens the ad page.
    pub async fn submit(&self) -> Submission<AdSaveReport> {
        let ctx = &self.ctx;
        ctx.clear_invalid(&FIELDS);
        let fallback = match self.mode {
            FormMode::Create => "Create failed",
            FormMode::Edit(_) => "Update failed",
        };

        let outcome = ctx
            .submit(self.trigger(), fallback, async {
                let draft = self.draft()?;
                let save = match self.mode {
                    FormMode::Create => AdSave::Create(draft),
                    FormMode::Edit(id) => AdSave::Update(id, draft),
                };
                let files = ctx.surface.files(IMAGES);
                let report = AdSaveSaga::new(&ctx.api).run(save, files).await?;
                ctx.surface.clear_files(IMAGES);
                Ok(report)
            })
            .await;

        if let Submission::Done(report) = &outcome {
            for (file, err) in report.failures() {
                ctx.notifier
                    .notify(Level::Error, &format!("Upload of {file} failed: {}", err.message()));
            }
            ctx.success(if report.created { "Ad created" } else { "Ad updated" });
            ctx.surface.navigate(&format!("/ads/{}", report.ad_id));
        }
        outcome
    }
}
