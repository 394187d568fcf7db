//! Admin page: users, categories and reports tabs, each its own binder, plus
//! the create-category form. Admins only.

use askama::Template;
use async_trait::async_trait;
use bz_core::{validation, Category, CategoryDraft, ClientError, Result, Role, User, UserUpdate};
use uuid::Uuid;

use super::catalog::populate_categories;
use super::moderation::ReportsSource;
use crate::binder::{Empty, Frame, Gate, ListBinder, ListSource, ListState, RowInput, RowOutcome};
use crate::context::{Submission, ViewContext};
use crate::templates::{CategoryRow, Placeholder, UserRow};

pub const ADMIN_CONTENT: &str = "admin-content";
pub const USERS_LIST: &str = "users-list";
pub const CATEGORIES_LIST: &str = "categories-list";
pub const CREATE_CATEGORY_FORM: &str = "create-category-form";
pub const NEW_CATEGORY_NAME: &str = "new-category-name";

/// Tab panes inside `admin-content`.
pub const TABS: [&str; 3] = ["admin-users", "admin-categories", "admin-reports"];

const ADMINS: &[Role] = &[Role::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Save,
    Delete,
}

pub struct UsersSource;

#[async_trait]
impl ListSource for UsersSource {
    type Item = User;
    type Action = UserAction;

    fn container(&self) -> &'static str {
        USERS_LIST
    }

    fn noun(&self) -> &'static str {
        "users"
    }

    fn gate(&self) -> Gate {
        Gate::Roles(ADMINS)
    }

    fn empty(&self) -> Empty {
        Empty::Message("No users")
    }

    fn frame(&self) -> Frame {
        Frame::Table(&["Username", "Email", "Role", "Actions"])
    }

    fn row_id(&self, item: &User) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &User, busy: bool) -> askama::Result<String> {
        UserRow::new(item, busy).render()
    }

    fn fields(&self, item: &User) -> Vec<(&'static str, String)> {
        vec![
            ("username", item.username.clone()),
            ("email", item.email.clone()),
            ("role", item.role.as_str().to_string()),
        ]
    }

    fn confirmation(&self, action: UserAction, _row: &RowInput<'_>) -> Option<&'static str> {
        matches!(action, UserAction::Delete).then_some("Delete user?")
    }

    fn fallback(&self, action: UserAction) -> &'static str {
        match action {
            UserAction::Save => "Save failed",
            UserAction::Delete => "Delete failed",
        }
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<User>> {
        ctx.api.list_users().await
    }

    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &User,
        action: UserAction,
        row: &RowInput<'_>,
    ) -> Result<RowOutcome<User>> {
        match action {
            UserAction::Save => {
                row.clear_invalid(&["username", "email"]);
                let username = row.value("username");
                let username = validation::required(&row.anchor("username"), &username, "Username required")?;
                let email = row.value("email");
                let email = validation::email(&row.anchor("email"), &email, "Invalid email")?;
                let role: Role = row
                    .value("role")
                    .parse()
                    .map_err(|_| ClientError::invalid(row.anchor("role"), "Unknown role"))?;

                let update = UserUpdate {
                    username: username.to_string(),
                    email: email.to_string(),
                    role: Some(role),
                };
                let saved = ctx.api.update_user(item.id, &update).await?;
                ctx.success("Saved");
                Ok(RowOutcome::Updated(saved))
            }
            UserAction::Delete => {
                ctx.api.delete_user(item.id).await?;
                ctx.success("Deleted");
                Ok(RowOutcome::Removed)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryAction {
    Save,
    Delete,
}

pub struct CategoriesSource;

#[async_trait]
impl ListSource for CategoriesSource {
    type Item = Category;
    type Action = CategoryAction;

    fn container(&self) -> &'static str {
        CATEGORIES_LIST
    }

    fn noun(&self) -> &'static str {
        "categories"
    }

    fn gate(&self) -> Gate {
        Gate::Roles(ADMINS)
    }

    fn empty(&self) -> Empty {
        Empty::Message("No categories")
    }

    fn frame(&self) -> Frame {
        Frame::Table(&["Name", "Parent", "Actions"])
    }

    fn row_id(&self, item: &Category) -> Uuid {
        item.id
    }

    fn render_row(&self, item: &Category, busy: bool) -> askama::Result<String> {
        CategoryRow::new(item, busy).render()
    }

    fn fields(&self, item: &Category) -> Vec<(&'static str, String)> {
        vec![
            ("name", item.name.clone()),
            (
                "parent",
                item.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            ),
        ]
    }

    fn confirmation(&self, action: CategoryAction, _row: &RowInput<'_>) -> Option<&'static str> {
        matches!(action, CategoryAction::Delete).then_some("Delete category?")
    }

    fn fallback(&self, action: CategoryAction) -> &'static str {
        match action {
            CategoryAction::Save => "Save failed",
            CategoryAction::Delete => "Delete failed",
        }
    }

    async fn fetch(&self, ctx: &ViewContext) -> Result<Vec<Category>> {
        ctx.api.list_categories().await
    }

    /// Category changes also refresh the category selects on the page.
    async fn perform(
        &self,
        ctx: &ViewContext,
        item: &Category,
        action: CategoryAction,
        row: &RowInput<'_>,
    ) -> Result<RowOutcome<Category>> {
        let outcome = match action {
            CategoryAction::Save => {
                row.clear_invalid(&["name", "parent"]);
                let name = row.value("name");
                let name = validation::required(&row.anchor("name"), &name, "Name required")?;
                let parent_id = match super::optional(row.value("parent")) {
                    None => None,
                    Some(raw) => Some(
                        raw.parse::<Uuid>()
                            .map_err(|_| ClientError::invalid(row.anchor("parent"), "Invalid parent id"))?,
                    ),
                };

                let draft = CategoryDraft {
                    name: name.to_string(),
                    parent_id,
                };
                ctx.api.update_category(item.id, &draft).await?;
                ctx.success("Saved");
                RowOutcome::Updated(Category {
                    id: item.id,
                    name: draft.name,
                    parent_id: draft.parent_id,
                })
            }
            CategoryAction::Delete => {
                ctx.api.delete_category(item.id).await?;
                ctx.success("Deleted");
                RowOutcome::Removed
            }
        };
        if let Err(err) = populate_categories(ctx).await {
            tracing::warn!(error = %err, "category selects not refreshed");
        }
        Ok(outcome)
    }
}

pub struct AdminPage {
    ctx: ViewContext,
    users: ListBinder<UsersSource>,
    categories: ListBinder<CategoriesSource>,
    reports: ListBinder<ReportsSource>,
}

impl AdminPage {
    /// Checks the stored role before touching the backend; non-admins get a
    /// placeholder instead of the tabs.
    pub async fn mount(ctx: ViewContext) -> Option<Self> {
        let session = ctx.session();
        let placeholder = if !session.is_authenticated() {
            Some(Placeholder::muted("Please login").render())
        } else if !session.has_role(ADMINS) {
            Some(Placeholder::danger("Insufficient permissions").render())
        } else {
            None
        };
        if let Some(html) = placeholder {
            match html {
                Ok(html) => ctx.surface.set_html(ADMIN_CONTENT, html),
                Err(err) => tracing::error!(error = %err, "placeholder render failed"),
            }
            return None;
        }

        let page = Self {
            users: ListBinder::new(ctx.clone(), UsersSource),
            categories: ListBinder::new(ctx.clone(), CategoriesSource),
            reports: ListBinder::new(ctx.clone(), ReportsSource::admin()),
            ctx,
        };
        let _ = tokio::join!(page.users.load(), page.categories.load(), page.reports.load());
        page.select_tab(TABS[0]);
        Some(page)
    }

    pub fn users(&self) -> &ListBinder<UsersSource> {
        &self.users
    }

    pub fn categories(&self) -> &ListBinder<CategoriesSource> {
        &self.categories
    }

    pub fn reports(&self) -> &ListBinder<ReportsSource> {
        &self.reports
    }

    /// Shows one tab pane and hides the others.
    pub fn select_tab(&self, tab: &str) {
        for pane in TABS {
            self.ctx.surface.set_visible(pane, pane == tab);
        }
    }

    pub async fn create_category(&self) -> Submission<Uuid> {
        let ctx = &self.ctx;
        ctx.clear_invalid(&[NEW_CATEGORY_NAME]);
        let outcome = ctx
            .submit(CREATE_CATEGORY_FORM, "Create failed", async {
                let name = ctx.surface.value(NEW_CATEGORY_NAME);
                let name = validation::required(NEW_CATEGORY_NAME, &name, "Name required")?;
                let created = ctx
                    .api
                    .create_category(&CategoryDraft {
                        name: name.to_string(),
                        parent_id: None,
                    })
                    .await?;
                Ok::<_, ClientError>(created.id)
            })
            .await;

        if outcome.is_done() {
            ctx.success("Category created");
            ctx.surface.set_value(NEW_CATEGORY_NAME, "");
            self.categories.load().await;
            if let Err(err) = populate_categories(ctx).await {
                tracing::warn!(error = %err, "category selects not refreshed");
            }
        }
        outcome
    }

    pub async fn reload(&self) -> [ListState; 3] {
        let (users, categories, reports) =
            tokio::join!(self.users.load(), self.categories.load(), self.reports.load());
        [users, categories, reports]
    }
}
