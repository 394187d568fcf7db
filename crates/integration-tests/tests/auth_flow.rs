//! Login, registration and the credential header, end to end.

use bz_core::{AdQuery, ErrorKind, Role};
use bz_ui::pages::{auth, nav};
use bz_ui::Submission;
use integration_tests::{eventually, page, FakeMarket, Harness, PASSWORD};
use secrecy::ExposeSecret;

#[tokio::test]
async fn login_populates_session_and_goes_home() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let doc = page("/login", &[auth::LOGIN_FORM])
        .with_value(auth::EMAIL, &kate.email)
        .with_value(auth::PASSWORD, PASSWORD);
    let h = Harness::start(&market, doc).await;

    let mounted = h.router().boot().await;
    let outcome = mounted.login.as_ref().unwrap().submit().await;

    assert!(outcome.is_done());
    let session = h.session();
    assert!(session.is_authenticated());
    assert_eq!(session.identity().unwrap().username, "kate");
    assert_eq!(session.role(), Some(Role::User));
    assert!(session.refresh_token().is_some());
    assert_eq!(h.doc.navigations(), vec!["/".to_string()]);
    assert!(eventually(|| h.doc.is_visible(nav::LOGOUT) && !h.doc.is_visible(nav::LOGIN)).await);
    assert_eq!(h.doc.text(nav::USERNAME), "kate");
}

#[tokio::test]
async fn wrong_password_shows_backend_message() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let doc = page("/login", &[auth::LOGIN_FORM])
        .with_value(auth::EMAIL, &kate.email)
        .with_value(auth::PASSWORD, "nope");
    let h = Harness::start(&market, doc).await;

    let mounted = h.router().boot().await;
    let outcome = mounted.login.as_ref().unwrap().submit().await;

    assert_eq!(outcome.error().map(|e| e.kind()), Some(ErrorKind::Unauthenticated));
    assert_eq!(h.notes.errors(), vec!["Invalid email or password".to_string()]);
    assert!(!h.session().is_authenticated());
    assert!(h.doc.navigations().is_empty());
    assert!(!h.doc.is_disabled(auth::LOGIN_FORM));
}

#[tokio::test]
async fn missing_password_is_caught_before_any_request() {
    let market = FakeMarket::new();
    let doc = page("/login", &[auth::LOGIN_FORM, auth::PASSWORD]).with_value(auth::EMAIL, "kate@bazaar.test");
    let h = Harness::start(&market, doc).await;

    let mounted = h.router().boot().await;
    let outcome = mounted.login.as_ref().unwrap().submit().await;

    assert!(matches!(outcome, Submission::Failed(_)));
    assert_eq!(market.count("POST", "/auth/login"), 0);
    assert_eq!(h.doc.invalid(auth::PASSWORD).as_deref(), Some("Password required"));
}

#[tokio::test]
async fn register_then_duplicate_is_rejected() {
    let market = FakeMarket::new();
    let doc = page("/register", &[auth::REGISTER_FORM])
        .with_value(auth::USERNAME, "olga")
        .with_value(auth::EMAIL, "olga@bazaar.test")
        .with_value(auth::PASSWORD, "pw");
    let h = Harness::start(&market, doc).await;
    let mounted = h.router().boot().await;
    let form = mounted.register.as_ref().unwrap();

    assert!(form.submit().await.is_done());
    assert_eq!(h.doc.navigations(), vec!["/login".to_string()]);

    let again = form.submit().await;
    assert_eq!(again.error().map(|e| e.kind()), Some(ErrorKind::Conflict));
    assert_eq!(h.notes.errors(), vec!["User already exists".to_string()]);
    assert_eq!(market.lock().accounts.len(), 1);
}

#[tokio::test]
async fn credential_header_follows_the_session() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let h = Harness::start(&market, page("/", &[])).await;
    let api = &h.ctx.api;

    api.list_ads(&AdQuery::default()).await.unwrap();
    h.sign_in(&kate);
    let token = h.session().access_token().unwrap().expose_secret().to_string();
    api.list_ads(&AdQuery::default()).await.unwrap();
    assert!(auth::logout(&h.ctx).is_done());
    api.list_ads(&AdQuery::default()).await.unwrap();

    let seen: Vec<Option<String>> = market
        .requests()
        .into_iter()
        .filter(|r| r.path == "/api/ads")
        .map(|r| r.authorization)
        .collect();
    assert_eq!(seen, vec![None, Some(format!("Bearer {token}")), None]);
}

#[tokio::test]
async fn protected_call_without_credential_is_unauthenticated() {
    let market = FakeMarket::new();
    let h = Harness::start(&market, page("/", &[])).await;

    let err = h.ctx.api.list_conversations().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert_eq!(err.message(), "Missing Authorization Header");
}
