//! Login, registration and logout.

use bz_core::{validation, ClientError, Identity};
use secrecy::SecretString;

use crate::context::{Submission, ViewContext};

pub const LOGIN_FORM: &str = "login-form";
pub const REGISTER_FORM: &str = "register-form";
pub const LOGOUT_BUTTON: &str = "logout-btn";
pub const EMAIL: &str = "email";
pub const PASSWORD: &str = "password";
pub const USERNAME: &str = "username";

pub struct LoginForm {
    ctx: ViewContext,
}

impl LoginForm {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    /// Stores the returned credential and identity, then goes home.
    pub async fn submit(&self) -> Submission<()> {
        let ctx = &self.ctx;
        ctx.clear_invalid(&[EMAIL, PASSWORD]);
        ctx.submit(LOGIN_FORM, "Login failed", async {
            let email = ctx.surface.value(EMAIL);
            let email = validation::required(EMAIL, &email, "Email required")?;
            let password = ctx.surface.value(PASSWORD);
            if password.is_empty() {
                return Err(ClientError::invalid(PASSWORD, "Password required"));
            }

            let grant = ctx.api.login(email, &password).await?;
            let session = ctx.session();
            session.set_session(
                SecretString::from(grant.access_token),
                grant.user.as_ref().map(Identity::from),
            )?;
            if let Some(refresh) = grant.refresh_token {
                session.set_refresh_token(SecretString::from(refresh))?;
            }
            tracing::info!(user = ?grant.user.as_ref().map(|u| &u.username), "logged in");
            ctx.surface.navigate("/");
            Ok::<_, ClientError>(())
        })
        .await
    }
}

pub struct RegisterForm {
    ctx: ViewContext,
}

impl RegisterForm {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    pub async fn submit(&self) -> Submission<()> {
        let ctx = &self.ctx;
        ctx.clear_invalid(&[USERNAME, EMAIL, PASSWORD]);
        ctx.submit(REGISTER_FORM, "Register failed", async {
            let username = ctx.surface.value(USERNAME);
            let username = validation::required(USERNAME, &username, "Username required")?;
            let email = ctx.surface.value(EMAIL);
            let email = validation::email(EMAIL, &email, "Invalid email")?;
            let password = ctx.surface.value(PASSWORD);
            if password.is_empty() {
                return Err(ClientError::invalid(PASSWORD, "Password required"));
            }

            ctx.api.register(username, email, &password).await?;
            ctx.surface.navigate("/login");
            Ok::<_, ClientError>(())
        })
        .await
    }
}

/// Drops the whole session and returns to the home page.
pub fn logout(ctx: &ViewContext) -> Submission<()> {
    match ctx.session().clear_session() {
        Ok(()) => {
            ctx.surface.navigate("/");
            Submission::Done(())
        }
        Err(err) => {
            let err = ClientError::from(err);
            ctx.report(&err, "Logout failed");
            Submission::Failed(err)
        }
    }
}
