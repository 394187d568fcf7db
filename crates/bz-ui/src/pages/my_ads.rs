//! The signed-in user's own ads, with reopen for closed ones.

use askama::Template;
use async_trait::async_trait;
use bz_core::{Ad, AdQuery, AdStatus, ClientError, Result};
use uuid::Uuid;

use crate::binder::{Empty, Gate, ListSource, RowInput, RowOutcome};
use crate::context::ViewContext;
use crate::templates::MyAdCard;

pub const MY_ADS_LIST: &str = "my-ads-list";

/// Upper bound on how many of their own ads a user sees.
const PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyAdAction {
    Reopen,
}

pub struct MyAdsSource;

#[async_trait]
impl ListSource for MyAdsSource {
    type Item = Ad;
    type Action = MyAdAction;

    fn container(&self) -> &'static str {
        MY_ADS_LIST
    }

    fn noun(&self) -> &'static str {
        "your ads"
    }

    fn gate(&self) -> Gate {
        Gate::Authenticated
    }

    fn empty(&self) -> Empty {
        Empty::Message("No ads yet")
    }

    fn row_id(&self, item: &Ad) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Ad, busy: bool) -> askama::Result<String> {
        MyAdCard::new(item, busy).render()
    }

    fn fallback(&self, _action: MyAdAction) -> &'static str {
        "Failed to reopen"
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Ad>> {
        let Some(me) = ctx.session().user_id() else {
            return Err(ClientError::Unauthenticated {
                message: "Please login".into(),
                code: None,
            });
        };
        let query = AdQuery {
            author_id: Some(me),
            limit: Some(PAGE_LIMIT),
            ..AdQuery::default()
        };
        ctx.api.list_ads(&query).await
    }

    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Ad,
        action: MyAdAction,
        _row: &RowInput<'_>,
    ) -> Result<RowOutcome<Ad>> {
        match action {
            MyAdAction::Reopen => {
                ctx.api.set_ad_status(item.id, AdStatus::Active).await?;
                ctx.success("Ad reopened");
                Ok(RowOutcome::Refetch)
            }
        }
    }
}
