//! # AdSaveSaga
//!
//! Saving an ad is two phases: the core fields, then each attached file as an
//! independent upload, one at a time. A failed upload does not roll back the
//! ad or earlier uploads; the report records every step so the caller picks
//! the partial-failure policy.

use bz_core::{AdDraft, ClientError, Media, Result, Upload};
use uuid::Uuid;

use crate::endpoints::MarketApi;

#[derive(Debug, Clone)]
pub enum AdSave {
    Create(AdDraft),
    Update(Uuid, AdDraft),
}

#[derive(Debug)]
pub struct MediaStep {
    pub file_name: String,
    pub outcome: Result<Media>,
}

#[derive(Debug)]
pub struct AdSaveReport {
    pub ad_id: Uuid,
    pub created: bool,
    pub media: Vec<MediaStep>,
}

impl AdSaveReport {
    pub fn attached(&self) -> impl Iterator<Item = &Media> {
        self.media.iter().filter_map(|step| step.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ClientError)> {
        self.media.iter().filter_map(|step| match &step.outcome {
            Err(err) => Some((step.file_name.as_str(), err)),
            Ok(_) => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct AdSaveSaga<'a> {
    api: &'a MarketApi,
}

impl<'a> AdSaveSaga<'a> {
    pub fn new(api: &'a MarketApi) -> Self {
        Self { api }
    }

    /// Fails only when the core save fails; upload failures land in the report.
    pub async fn run(&self, save: AdSave, files: Vec<Upload>) -> Result<AdSaveReport> {
        let (ad_id, created) = match &save {
            AdSave::Create(draft) => (self.api.create_ad(draft).await?.id, true),
            AdSave::Update(id, draft) => {
                self.api.update_ad(*id, draft).await?;
                (*id, false)
            }
        };

        let mut media = Vec::with_capacity(files.len());
        for file in files {
            let file_name = file.file_name.clone();
            let outcome = self.api.upload_media(ad_id, file).await;
            if let Err(err) = &outcome {
                tracing::warn!(%ad_id, file = %file_name, error = %err, "media upload failed");
            }
            media.push(MediaStep { file_name, outcome });
        }

        Ok(AdSaveReport {
            ad_id,
            created,
            media,
        })
    }
}
