//! Ads list with text search and category filter, plus the category
//! `<select>` population shared with the ad forms.

use std::convert::Infallible;
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use bz_core::{Ad, AdQuery, Category, Result};
use uuid::Uuid;

use crate::binder::{Empty, ListBinder, ListSource, ListState, RowInput, RowOutcome};
use crate::context::ViewContext;
use crate::debounce::Debouncer;
use crate::templates::{AdCard, SelectOption, SelectOptions};

pub const ADS_LIST: &str = "ads-list";
pub const EMPTY_ADS: &str = "empty-ads";
pub const SEARCH_INPUT: &str = "search-input";
pub const CATEGORY_FILTER: &str = "category-filter";
pub const CATEGORY_SELECT: &str = "category_id";

/// Refills the category selects that are present on the page. Current
/// selections are kept.
pub async fn populate_categories(ctx: &ViewContext) -> Result<Vec<Category>> {
    let surface = ctx.surface.as_ref();
    if !surface.has(CATEGORY_SELECT) && !surface.has(CATEGORY_FILTER) {
        return Ok(Vec::new());
    }
    let categories = ctx.api.list_categories().await?;

    for (anchor, blank) in [(CATEGORY_SELECT, "Select category"), (CATEGORY_FILTER, "All categories")] {
        if !surface.has(anchor) {
            continue;
        }
        let current = surface.value(anchor);
        let options = std::iter::once(SelectOption::new("", blank, current.is_empty()))
            .chain(categories.iter().map(|c| {
                let id = c.id.to_string();
                let selected = id == current;
                SelectOption::new(id, c.name.clone(), selected)
            }))
            .collect();
        match (SelectOptions { options }).render() {
            Ok(html) => surface.set_html(anchor, html),
            Err(err) => tracing::error!(anchor, error = %err, "category options render failed"),
        }
    }
    Ok(categories)
}

/// Public ads matching the search box and category filter.
pub struct AdsSource;

#[async_trait]
impl ListSource for AdsSource {
    type Item = Ad;
    type Action = Infallible;

    fn container(&self) -> &'static str {
        ADS_LIST
    }

    fn noun(&self) -> &'static str {
        "ads"
    }

    fn empty(&self) -> Empty {
        Empty::Indicator(EMPTY_ADS)
    }

    fn row_id(&self, item: &Ad) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Ad, _busy: bool) -> askama::Result<String> {
        AdCard::from(item).render()
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Ad>> {
        let query = AdQuery {
            query: super::optional(ctx.surface.value(SEARCH_INPUT)),
            category_id: ctx.surface.value(CATEGORY_FILTER).parse().ok(),
            ..AdQuery::default()
        };
        ctx.api.list_ads(&query).await
    }

    async fn perform(
        &self,
        _ctx: &ViewContext,
        _item: &Ad,
        action: Infallible,
        _row: &RowInput<'_>,
    ) -> Result<RowOutcome<Ad>> {
        match action {}
    }
}

pub struct AdsPage {
    binder: ListBinder<AdsSource>,
    debouncer: Debouncer,
}

impl AdsPage {
    pub fn new(ctx: ViewContext, debounce: Duration) -> Self {
        Self {
            binder: ListBinder::new(ctx, AdsSource),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn binder(&self) -> &ListBinder<AdsSource> {
        &self.binder
    }

    pub async fn load(&self) -> ListState {
        self.binder.load().await
    }

    /// Search box input. Re-queries once typing pauses; returns `None` when a
    /// newer keystroke superseded this one.
    pub async fn on_search_input(&self) -> Option<ListState> {
        if self.debouncer.settle().await {
            Some(self.binder.load().await)
        } else {
            None
        }
    }

    /// Category filter change re-queries immediately.
    pub async fn on_category_change(&self) -> ListState {
        self.binder.load().await
    }
}
