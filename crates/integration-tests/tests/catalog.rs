//! Public ad list with search and category filter.

use bz_core::{AdStatus, Role};
use bz_ui::pages::catalog::{ADS_LIST, CATEGORY_FILTER, EMPTY_ADS, SEARCH_INPUT};
use bz_ui::{ListState, Surface};
use integration_tests::{page, FakeMarket, Harness};

fn catalog_page() -> bz_ui::Document {
    page("/", &[ADS_LIST, SEARCH_INPUT, CATEGORY_FILTER]).with_hidden(EMPTY_ADS)
}

#[tokio::test]
async fn home_lists_active_ads_and_fills_the_filter() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let bikes = market.add_category("Bikes");
    market.add_ad(&kate, "Road bike", &bikes, AdStatus::Active);
    market.add_ad(&kate, "Sold bike", &bikes, AdStatus::Closed);

    let h = Harness::start(&market, catalog_page()).await;
    let mounted = h.router().boot().await;

    assert_eq!(mounted.ads.as_ref().unwrap().binder().rows().len(), 1);
    let html = h.doc.html(ADS_LIST);
    assert!(html.contains("Road bike"));
    assert!(!html.contains("Sold bike"));
    assert!(!h.doc.is_visible(EMPTY_ADS));
    let options = h.doc.html(CATEGORY_FILTER);
    assert!(options.contains("All categories"));
    assert!(options.contains("Bikes"));
}

#[tokio::test]
async fn search_and_category_narrow_the_list() {
    let market = FakeMarket::new();
    let kate = market.add_user("kate", Role::User);
    let bikes = market.add_category("Bikes");
    let lamps = market.add_category("Lamps");
    market.add_ad(&kate, "Road bike", &bikes, AdStatus::Active);
    market.add_ad(&kate, "Brass lamp", &lamps, AdStatus::Active);

    let h = Harness::start(&market, catalog_page()).await;
    let mounted = h.router().boot().await;
    let ads = mounted.ads.as_ref().unwrap();

    h.doc.set_value(SEARCH_INPUT, "LAMP");
    assert_eq!(ads.on_search_input().await, Some(ListState::Rendered(1)));
    assert!(h.doc.html(ADS_LIST).contains("Brass lamp"));

    h.doc.set_value(CATEGORY_FILTER, &bikes.id.to_string());
    assert_eq!(ads.on_category_change().await, ListState::Empty);
    assert!(h.doc.is_visible(EMPTY_ADS));

    h.doc.set_value(SEARCH_INPUT, "");
    assert_eq!(ads.on_category_change().await, ListState::Rendered(1));
    assert!(!h.doc.is_visible(EMPTY_ADS));
    assert!(h.doc.html(ADS_LIST).contains("Road bike"));
}
