//! Report lists for moderators and admins.

use bz_core::{AdStatus, Identity, ReportStatus, Role};
use bz_ui::pages::moderation::{self, ReportAction, ReportsSource, BLOCK_FIELD, STATUS_FIELD};
use bz_ui::{row_field, ListBinder, ListState, Submission, Surface};
use secrecy::SecretString;
use integration_tests::{page, FakeMarket, Harness};

#[tokio::test]
async fn anonymous_moderator_page_asks_for_login_without_a_request() {
    let market = FakeMarket::new();
    let h = Harness::start(&market, page("/moderator", &[moderation::MODERATOR_REPORTS])).await;

    let mounted = h.router().boot().await;

    assert!(mounted.moderator.is_some());
    assert!(h
        .doc
        .html(moderation::MODERATOR_REPORTS)
        .contains("Please login to view reports"));
    assert_eq!(market.count("GET", "/reports"), 0);
}

#[tokio::test]
async fn rejected_token_shows_login_placeholder_without_an_error_toast() {
    let market = FakeMarket::new();
    let mod_user = market.add_user("mona", Role::Moderator);
    let h = Harness::start(&market, page("/moderator", &[moderation::MODERATOR_REPORTS])).await;
    h.session()
        .set_session(
            SecretString::from("revoked-token".to_string()),
            Some(Identity::from(&mod_user)),
        )
        .unwrap();

    let list = ListBinder::new(h.ctx.clone(), ReportsSource::moderator());
    let state = list.load().await;

    assert_eq!(state, ListState::Unauthenticated);
    assert_eq!(market.count("GET", "/reports"), 1);
    assert!(h
        .doc
        .html(moderation::MODERATOR_REPORTS)
        .contains("Please login to view reports"));
    assert!(h.notes.errors().is_empty());
    assert!(list.rows().is_empty());
}

#[tokio::test]
async fn plain_user_sees_insufficient_permissions() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let h = Harness::start(&market, page("/reports", &[moderation::REPORT_LIST])).await;
    h.sign_in(&kate);

    h.router().boot().await;

    assert!(h.doc.html(moderation::REPORT_LIST).contains("Insufficient permissions"));
    assert_eq!(market.count("GET", "/reports"), 0);
}

struct Queue {
    market: FakeMarket,
    h: Harness,
    report: uuid::Uuid,
    ad: uuid::Uuid,
}

async fn moderator_queue() -> Queue {
    let market = FakeMarket::new();
    let moderator = market.add_user("mod", Role::Moderator);
    let seller = market.add_user("kate", Role::User);
    let buyer = market.add_user("olga", Role::User);
    let bikes = market.add_category("Bikes");
    let ad = market.add_ad(&seller, "Road bike", &bikes, AdStatus::Active);
    let report = market.add_report(&ad, &buyer, "Looks stolen");

    let h = Harness::start(&market, page("/moderator", &[moderation::MODERATOR_REPORTS])).await;
    h.sign_in(&moderator);
    Queue {
        market,
        h,
        report: report.id,
        ad: ad.id,
    }
}

#[tokio::test]
async fn resolving_removes_the_row_without_refetching() {
    let q = moderator_queue().await;
    let mounted = q.h.router().boot().await;
    let list = mounted.moderator.as_ref().unwrap();
    assert_eq!(list.rows().len(), 1);
    assert!(q.h.doc.html(moderation::MODERATOR_REPORTS).contains("Looks stolen"));

    let status = row_field(moderation::MODERATOR_REPORTS, q.report, STATUS_FIELD);
    assert_eq!(q.h.doc.value(&status), "new");
    q.h.doc.set_value(&status, "resolved");

    assert!(list.dispatch(q.report, ReportAction::Save).await.is_done());

    assert!(list.rows().is_empty());
    assert_eq!(q.market.report(q.report).unwrap().status, ReportStatus::Resolved);
    assert_eq!(q.market.ad(q.ad).unwrap().status, AdStatus::Active);
    assert_eq!(q.market.count("GET", "/reports"), 1);
    assert!(q.h.doc.html(moderation::MODERATOR_REPORTS).contains("No reports"));
    assert!(q.h.dialogs.prompts().is_empty());
}

#[tokio::test]
async fn other_status_changes_refetch_the_list() {
    let q = moderator_queue().await;
    let mounted = q.h.router().boot().await;
    let list = mounted.moderator.as_ref().unwrap();

    q.h.doc
        .set_value(&row_field(moderation::MODERATOR_REPORTS, q.report, STATUS_FIELD), "reviewing");
    assert!(list.dispatch(q.report, ReportAction::Save).await.is_done());

    assert_eq!(q.market.count("GET", "/reports"), 2);
    assert_eq!(list.rows()[0].status, ReportStatus::Reviewing);
    assert_eq!(q.h.notes.successes(), vec!["Saved".to_string()]);
}

#[tokio::test]
async fn blocking_asks_for_confirmation_and_bans_the_ad() {
    let q = moderator_queue().await;
    let mounted = q.h.router().boot().await;
    let list = mounted.moderator.as_ref().unwrap();
    q.h.doc
        .set_value(&row_field(moderation::MODERATOR_REPORTS, q.report, STATUS_FIELD), "resolved");
    q.h.doc
        .set_value(&row_field(moderation::MODERATOR_REPORTS, q.report, BLOCK_FIELD), "true");

    q.h.dialogs.set_answer(false);
    assert!(matches!(
        list.dispatch(q.report, ReportAction::Save).await,
        Submission::Cancelled
    ));
    assert_eq!(q.market.count("PUT", "/reports"), 0);
    assert!(!list.is_busy(q.report));

    q.h.dialogs.set_answer(true);
    assert!(list.dispatch(q.report, ReportAction::Save).await.is_done());
    assert_eq!(
        q.h.dialogs.prompts(),
        vec!["You are about to block the ad if resolved. Continue?".to_string(); 2]
    );
    assert_eq!(q.market.ad(q.ad).unwrap().status, AdStatus::Banned);
}
