//! Creating and editing ads: core fields first, then one upload per file.

use bz_core::{AdStatus, Role, Upload};
use bz_ui::pages::ad_detail::{self, AdDetailPage};
use bz_ui::pages::ad_form::{self, FormMode};
use bz_ui::{Submission, Surface};
use integration_tests::{page, FakeMarket, Harness};

const FORM_FIELDS: [&str; 6] = [
    ad_form::TITLE,
    ad_form::DESCRIPTION,
    ad_form::PRICE,
    ad_form::CATEGORY,
    ad_form::LOCATION,
    ad_form::IMAGES,
];

fn png(name: &str) -> Upload {
    Upload::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

#[tokio::test]
async fn partial_upload_failure_keeps_the_ad_and_the_good_files() {
    let market = FakeMarket::new();
    let seller = market.add_user("kate", Role::User);
    let bikes = market.add_category("Bikes");

    let mut anchors = vec![ad_form::CREATE_FORM];
    anchors.extend(FORM_FIELDS);
    let h = Harness::start(&market, page("/ads/new", &anchors)).await;
    h.sign_in(&seller);
    let mounted = h.router().boot().await;

    h.doc.set_value(ad_form::TITLE, "Road bike");
    h.doc.set_value(ad_form::PRICE, "250");
    h.doc.set_value(ad_form::CATEGORY, &bikes.id.to_string());
    h.doc.pick_files(ad_form::IMAGES, vec![png("front.png"), png("bad.png"), png("side.png")]);

    let form = mounted.ad_form.as_ref().unwrap();
    assert_eq!(form.mode(), FormMode::Create);
    let report = form.submit().await.done().unwrap();

    assert!(report.created);
    assert_eq!(report.attached().count(), 2);
    let failed: Vec<&str> = report.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["bad.png"]);

    let saved = market.ad(report.ad_id).unwrap();
    assert_eq!(saved.title, "Road bike");
    assert_eq!(saved.price, 250.0);
    assert_eq!(market.media_of(report.ad_id).len(), 2);
    assert_eq!(market.count("POST", &format!("/ads/{}/media", report.ad_id)), 3);

    assert_eq!(
        h.notes.errors(),
        vec!["Upload of bad.png failed: Unsupported file type".to_string()]
    );
    assert_eq!(h.notes.successes(), vec!["Ad created".to_string()]);
    assert_eq!(h.doc.navigations(), vec![format!("/ads/{}", report.ad_id)]);
    assert!(h.doc.element(ad_form::IMAGES).unwrap().files.is_empty());
}

#[tokio::test]
async fn rejected_save_keeps_picked_files_for_the_retry() {
    let market = FakeMarket::new();
    let seller = market.add_user("kate", Role::User);
    let bikes = market.add_category("Bikes");

    let mut anchors = vec![ad_form::CREATE_FORM];
    anchors.extend(FORM_FIELDS);
    let h = Harness::start(&market, page("/ads/new", &anchors)).await;
    h.sign_in(&seller);
    let mounted = h.router().boot().await;
    let form = mounted.ad_form.as_ref().unwrap();

    h.doc.set_value(ad_form::TITLE, "Road bike");
    h.doc.set_value(ad_form::CATEGORY, &uuid::Uuid::new_v4().to_string());
    h.doc.pick_files(ad_form::IMAGES, vec![png("a.png"), png("b.png")]);

    let outcome = form.submit().await;
    assert!(matches!(outcome, Submission::Failed(_)));
    assert_eq!(h.notes.errors(), vec!["Unknown category".to_string()]);
    assert!(market.ads_by(seller.id).is_empty());
    assert_eq!(h.doc.element(ad_form::IMAGES).unwrap().files.len(), 2);
    assert!(!h.doc.is_disabled(ad_form::CREATE_FORM));

    h.doc.set_value(ad_form::CATEGORY, &bikes.id.to_string());
    let report = form.submit().await.done().unwrap();

    assert!(report.is_complete());
    assert_eq!(report.attached().count(), 2);
    assert_eq!(market.media_of(report.ad_id).len(), 2);
    assert!(h.doc.element(ad_form::IMAGES).unwrap().files.is_empty());
}

#[tokio::test]
async fn created_ad_reads_back_on_its_detail_page() {
    let market = FakeMarket::new();
    let seller = market.add_user("kate", Role::User);
    let lamps = market.add_category("Lamps");

    let mut anchors = vec![ad_form::CREATE_FORM];
    anchors.extend(FORM_FIELDS);
    let h = Harness::start(&market, page("/ads/new", &anchors)).await;
    h.sign_in(&seller);
    let mounted = h.router().boot().await;
    h.doc.set_value(ad_form::TITLE, "Brass lamp");
    h.doc.set_value(ad_form::DESCRIPTION, "Works fine");
    h.doc.set_value(ad_form::CATEGORY, &lamps.id.to_string());
    let report = mounted.ad_form.as_ref().unwrap().submit().await.done().unwrap();

    let detail = Harness::start(
        &market,
        page(
            &format!("/ads/{}", report.ad_id),
            &[
                ad_detail::TITLE,
                ad_detail::PRICE,
                ad_detail::CATEGORY,
                ad_detail::DESCRIPTION,
                ad_detail::SELLER,
            ],
        ),
    )
    .await;
    let page = AdDetailPage::load(detail.ctx.clone(), report.ad_id).await.unwrap();

    assert_eq!(page.ad().status, AdStatus::Active);
    assert_eq!(detail.doc.text(ad_detail::TITLE), "Brass lamp");
    assert_eq!(detail.doc.text(ad_detail::PRICE), "$0.00");
    assert_eq!(detail.doc.text(ad_detail::CATEGORY), "Lamps");
    assert_eq!(detail.doc.text(ad_detail::DESCRIPTION), "Works fine");
    assert_eq!(detail.doc.text(ad_detail::SELLER), "kate");
}

#[tokio::test]
async fn unselected_category_sends_nothing() {
    let market = FakeMarket::new();
    let seller = market.add_user("kate", Role::User);
    market.add_category("Bikes");

    let mut anchors = vec![ad_form::CREATE_FORM];
    anchors.extend(FORM_FIELDS);
    let h = Harness::start(&market, page("/ads/new", &anchors)).await;
    h.sign_in(&seller);
    let mounted = h.router().boot().await;
    h.doc.set_value(ad_form::TITLE, "Road bike");

    let outcome = mounted.ad_form.as_ref().unwrap().submit().await;

    assert!(matches!(outcome, Submission::Failed(_)));
    assert_eq!(market.count("POST", "/ads"), 0);
    assert_eq!(h.doc.invalid(ad_form::CATEGORY).as_deref(), Some("Select category"));
    assert!(h.doc.html(ad_form::CATEGORY).contains("Bikes"));
}

#[tokio::test]
async fn edit_form_prefills_and_updates_in_place() {
    let market = FakeMarket::new();
    let seller = market.add_user("kate", Role::User);
    let bikes = market.add_category("Bikes");
    let ad = market.add_ad(&seller, "Old bike", &bikes, AdStatus::Active);

    let mut anchors = vec![ad_form::EDIT_FORM, ad_form::EDIT_ID, ad_form::EXISTING_MEDIA];
    anchors.extend(FORM_FIELDS);
    let h = Harness::start(&market, page(&format!("/ads/{}/edit", ad.id), &anchors)).await;
    h.sign_in(&seller);
    let mounted = h.router().boot().await;

    let form = mounted.ad_form.as_ref().unwrap();
    assert_eq!(form.mode(), FormMode::Edit(ad.id));
    assert_eq!(h.doc.element(ad_form::TITLE).unwrap().value, "Old bike");
    assert_eq!(h.doc.element(ad_form::CATEGORY).unwrap().value, bikes.id.to_string());
    assert!(h.doc.html(ad_form::EXISTING_MEDIA).contains("No media yet"));

    h.doc.set_value(ad_form::TITLE, "Restored bike");
    let report = form.submit().await.done().unwrap();

    assert!(!report.created);
    assert_eq!(report.ad_id, ad.id);
    assert_eq!(market.ad(ad.id).unwrap().title, "Restored bike");
    assert_eq!(market.ads_by(seller.id).len(), 1);
    assert_eq!(h.notes.successes(), vec!["Ad updated".to_string()]);
}
