//! Navigation bar. Rendered once on boot and again after every session
//! change (login, logout, profile rename).

use bz_core::{Identity, Role};
use tokio::task::JoinHandle;

use crate::context::ViewContext;
use crate::surface::Surface;

pub const LOGIN: &str = "nav-login";
pub const REGISTER: &str = "nav-register";
pub const USER: &str = "nav-user";
pub const USERNAME: &str = "nav-username";
pub const LOGOUT: &str = "nav-logout";
pub const ADMIN: &str = "nav-admin";
pub const MODERATOR: &str = "nav-moderator";
pub const MY_ADS: &str = "nav-myads";
pub const PROFILE: &str = "nav-profile";

pub fn render(surface: &dyn Surface, authenticated: bool, identity: Option<&Identity>) {
    surface.set_visible(LOGIN, !authenticated);
    surface.set_visible(REGISTER, !authenticated);
    for anchor in [USER, LOGOUT, MY_ADS, PROFILE] {
        surface.set_visible(anchor, authenticated);
    }

    let role = identity.filter(|_| authenticated).map(|who| who.role);
    surface.set_visible(ADMIN, role.is_some_and(|r| r.is_staff()));
    surface.set_visible(MODERATOR, role == Some(Role::Moderator));
    if let Some(who) = identity.filter(|_| authenticated) {
        surface.set_text(USERNAME, &who.username);
    }
}

/// Draws the bar and keeps it in sync with the session until aborted.
pub fn mount(ctx: &ViewContext) -> JoinHandle<()> {
    let session = ctx.session().clone();
    let surface = ctx.surface.clone();
    render(surface.as_ref(), session.is_authenticated(), session.identity().as_ref());

    let mut changes = session.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let identity = changes.borrow_and_update().clone();
            render(surface.as_ref(), session.is_authenticated(), identity.as_ref());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Document;
    use uuid::Uuid;

    fn doc() -> Document {
        Document::new("/").with_anchors(&[
            LOGIN, REGISTER, USER, USERNAME, LOGOUT, ADMIN, MODERATOR, MY_ADS, PROFILE,
        ])
    }

    fn who(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "kate".into(),
            role,
        }
    }

    #[test]
    fn anonymous_sees_login_and_register() {
        let doc = doc();
        render(&doc, false, None);
        assert!(doc.is_visible(LOGIN));
        assert!(doc.is_visible(REGISTER));
        assert!(!doc.is_visible(LOGOUT));
        assert!(!doc.is_visible(ADMIN));
        assert!(!doc.is_visible(MY_ADS));
    }

    #[test]
    fn moderator_sees_both_staff_links() {
        let doc = doc();
        render(&doc, true, Some(&who(Role::Moderator)));
        assert!(!doc.is_visible(LOGIN));
        assert!(doc.is_visible(ADMIN));
        assert!(doc.is_visible(MODERATOR));
        assert_eq!(doc.text(USERNAME), "kate");
    }

    #[test]
    fn admin_sees_admin_link_only() {
        let doc = doc();
        render(&doc, true, Some(&who(Role::Admin)));
        assert!(doc.is_visible(ADMIN));
        assert!(!doc.is_visible(MODERATOR));
    }
}
