//! Profile page: edit the signed-in user's username and email.

use bz_core::{validation, ClientError, Result, User, UserUpdate};
use uuid::Uuid;

use crate::context::{Submission, ViewContext};

pub const PROFILE_FORM: &str = "profile-form";
pub const USERNAME: &str = "profile-username";
pub const EMAIL: &str = "profile-email";

pub struct ProfilePage {
    ctx: ViewContext,
    user_id: Uuid,
}

impl ProfilePage {
    /// `None` when no identity is stored; the page then stays inert.
    pub fn mount(ctx: ViewContext) -> Option<Self> {
        let user_id = ctx.session().user_id()?;
        Some(Self { ctx, user_id })
    }

    pub async fn load(&self) -> Result<User> {
        let user = self.ctx.api.get_user(self.user_id).await?;
        self.ctx.surface.set_value(USERNAME, &user.username);
        self.ctx.surface.set_value(EMAIL, &user.email);
        Ok(user)
    }

    /// Saves and renames the session so the navigation bar follows.
    pub async fn save(&self) -> Submission<User> {
        let ctx = &self.ctx;
        ctx.clear_invalid(&[USERNAME, EMAIL]);
        ctx.submit(PROFILE_FORM, "Save failed", async {
            let username = ctx.surface.value(USERNAME);
            let username = validation::required(USERNAME, &username, "Required")?;
            let email = ctx.surface.value(EMAIL);
            let email = validation::email(EMAIL, &email, "Invalid")?;

            let update = UserUpdate {
                username: username.to_string(),
                email: email.to_string(),
                role: None,
            };
            let user = ctx.api.update_user(self.user_id, &update).await?;
            ctx.session().rename(&user.username)?;
            ctx.success("Saved");
            Ok::<_, ClientError>(user)
        })
        .await
    }
}
