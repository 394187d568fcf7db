//! Report lists. The same source backs the admin reports tab, the moderator
//! page and the read-only list; they differ only in anchor, role gate and
//! whether rows carry controls.

use askama::Template;
use async_trait::async_trait;
use bz_core::{ClientError, Report, ReportStatus, ReportUpdate, Result, Role};
use uuid::Uuid;

use crate::binder::{Empty, Gate, ListBinder, ListSource, RowInput, RowOutcome};
use crate::context::ViewContext;
use crate::templates::ReportRow;

pub const ADMIN_REPORTS: &str = "admin-report-list";
pub const MODERATOR_REPORTS: &str = "moderator-report-list";
pub const REPORT_LIST: &str = "report-list";

pub const STATUS_FIELD: &str = "status";
pub const BLOCK_FIELD: &str = "block";

const STAFF: &[Role] = &[Role::Admin, Role::Moderator];
const MODERATORS: &[Role] = &[Role::Moderator];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    Save,
}

pub struct ReportsSource {
    container: &'static str,
    roles: &'static [Role],
    editable: bool,
}

impl ReportsSource {
    pub fn admin() -> Self {
        Self {
            container: ADMIN_REPORTS,
            roles: STAFF,
            editable: true,
        }
    }

    pub fn moderator() -> Self {
        Self {
            container: MODERATOR_REPORTS,
            roles: MODERATORS,
            editable: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            container: REPORT_LIST,
            roles: STAFF,
            editable: false,
        }
    }
}

#[async_trait]
impl ListSource for ReportsSource {
    type Item = Report;
    type Action = ReportAction;

    fn container(&self) -> &'static str {
        self.container
    }

    fn noun(&self) -> &'static str {
        "reports"
    }

    fn gate(&self) -> Gate {
        Gate::Roles(self.roles)
    }

    fn empty(&self) -> Empty {
        Empty::Message("No reports")
    }

    fn row_id(&self, item: &Report) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Report, busy: bool) -> askama::Result<String> {
        ReportRow::new(item, self.editable, busy).render()
    }

    fn fields(&self, item: &Report) -> Vec<(&'static str, String)> {
        if !self.editable {
            return Vec::new();
        }
        vec![
            (STATUS_FIELD, item.status.as_str().to_string()),
            (BLOCK_FIELD, "false".to_string()),
        ]
    }

    fn confirmation(&self, _action: ReportAction, row: &RowInput<'_>) -> Option<&'static str> {
        row.checked(BLOCK_FIELD)
            .then_some("You are about to block the ad if resolved. Continue?")
    }

    fn fallback(&self, _action: ReportAction) -> &'static str {
        "Save failed"
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Report>> {
        ctx.api.list_reports(None).await
    }

    /// Resolved reports leave the list in place; any other status change
    /// re-fetches so ordering and counts follow the backend.
    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Report,
        action: ReportAction,
        row: &RowInput<'_>,
    ) -> Result<RowOutcome<Report>> {
        match action {
            ReportAction::Save => {
                let status: ReportStatus = row
                    .value(STATUS_FIELD)
                    .parse()
                    .map_err(|_| ClientError::invalid(row.anchor(STATUS_FIELD), "Unknown status"))?;
                let update = ReportUpdate {
                    status,
                    block_ad: row.checked(BLOCK_FIELD),
                };
                ctx.api.update_report(item.id, &update).await?;
                ctx.success("Saved");
                Ok(match status {
                    ReportStatus::Resolved => RowOutcome::Removed,
                    _ => RowOutcome::Refetch,
                })
            }
        }
    }
}

/// Moderator page: the editable report list, moderators only.
pub fn moderator_page(ctx: ViewContext) -> ListBinder<ReportsSource> {
    ListBinder::new(ctx, ReportsSource::moderator())
}
