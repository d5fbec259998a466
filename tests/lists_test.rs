mod common;

use chrono::NaiveDate;
use common::{setup, url, FakeBridge, SHOP};
use never_miss::controller::{ListState, Tone};
use never_miss::download::DirectorySink;
use never_miss::error::{ApiError, BridgeError, PageError};
use never_miss::gid::ProductId;
use never_miss::pages::coming_soon::ComingSoonList;
use never_miss::pages::pre_order::PreOrderPage;
use never_miss::pages::reports::ReportsPage;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn subscriptions(n: usize, page: u32) -> Value {
    let rows: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "email": format!("user{i}@example.com"),
                "product_id": 500 + i,
                "product_title": "Hat",
                "created_at": "2024-01-05T12:00:00Z"
            })
        })
        .collect();
    json!({ "subscriptions": rows, "pagination": { "page": page, "limit": 10 } })
}

#[tokio::test]
async fn coming_soon_list_missing_map_is_empty() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(404, "").await;

    let mut list = ComingSoonList::new(api);
    list.refresh().await;
    assert_eq!(list.state(), &ListState::Ready(Vec::new()));
    assert_eq!(transport.sent().await[0].url, url("config/coming_soon"));
}

#[tokio::test]
async fn coming_soon_add_returns_existing_for_duplicate() {
    let (api, transport, bridge) = setup(FakeBridge::with_token("tok"));
    transport
        .respond_json(
            200,
            json!({
                "product_12": { "product_title": "Scarf", "start_date": "2024-01-01" }
            }),
        )
        .await;
    bridge
        .queue_pick(Ok(json!({ "selection": [{ "id": "gid://shopify/Product/12", "title": "Scarf" }] })))
        .await;
    bridge
        .queue_pick(Ok(json!([{ "id": "gid://shopify/Product/13", "title": "Gloves" }])))
        .await;

    let mut list = ComingSoonList::new(api);
    list.refresh().await;
    assert_eq!(list.entries().len(), 1);

    let existing = list.add_product().await.unwrap().unwrap();
    assert_eq!(existing.product, ProductId::new(12));
    assert!(existing.existing.is_some());
    assert_eq!(list.entries().len(), 1);

    let fresh = list.add_product().await.unwrap().unwrap();
    assert_eq!(fresh.product, ProductId::new(13));
    assert_eq!(fresh.title, "Gloves");
    assert!(fresh.existing.is_none());
    assert_eq!(list.entries().len(), 2);

    assert!(bridge.pick_calls().await.iter().all(|o| !o.multiple));
    // queue is empty: the picker reports a cancel
    assert!(list.add_product().await.unwrap().is_none());
}

#[tokio::test]
async fn coming_soon_unknown_picker_payload_is_an_error() {
    let (api, transport, bridge) = setup(FakeBridge::with_token("tok"));
    transport.respond(404, "").await;
    bridge.queue_pick(Ok(json!({ "items": [] }))).await;

    let mut list = ComingSoonList::new(api);
    list.refresh().await;
    let err = list.add_product().await.unwrap_err();
    assert!(matches!(
        err,
        PageError::Api(ApiError::UnrecognizedPickerPayload(_))
    ));
}

#[tokio::test]
async fn pre_order_pick_skips_already_selected() {
    let (api, transport, bridge) = setup(FakeBridge::with_token("tok"));
    transport
        .respond_json(
            200,
            json!({ "products": [{ "product_id": 1, "title": "Hat" }] }),
        )
        .await;
    bridge
        .queue_pick(Ok(json!({
            "selection": [
                { "id": "gid://shopify/Product/1", "title": "Hat" },
                { "id": "gid://shopify/Product/2", "title": "Scarf",
                  "images": [{ "originalSrc": "https://cdn/scarf.png" }] }
            ]
        })))
        .await;

    let mut page = PreOrderPage::new(api);
    page.load().await;
    assert_eq!(page.pick_products().await.unwrap(), 1);
    assert_eq!(page.selected().len(), 2);
    assert_eq!(
        page.selected()[1].image_url.as_deref(),
        Some("https://cdn/scarf.png")
    );
    assert!(bridge.pick_calls().await[0].multiple);

    page.save().await.unwrap();
    let sent = transport.sent().await;
    assert_eq!(sent[1].method, Method::PUT);
    assert_eq!(sent[1].url, url("config/pre_order"));
    assert_eq!(sent[1].body.as_ref().unwrap()["products"][1]["product_id"], 2);
}

#[tokio::test]
async fn pre_order_cancelled_picker_changes_nothing() {
    let (api, transport, bridge) = setup(FakeBridge::with_token("tok"));
    transport.respond(404, "").await;
    bridge.queue_pick(Err(BridgeError::PickerCancelled)).await;

    let mut page = PreOrderPage::new(api);
    page.load().await;
    assert_eq!(page.pick_products().await.unwrap(), 0);
    assert!(!page.page().is_dirty());
}

#[tokio::test]
async fn pre_order_catalog_failure_shows_banner_and_no_products() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(404, "").await;
    transport.respond(401, "unauthorized").await;

    let mut page = PreOrderPage::new(api);
    page.load().await;
    page.load_catalog().await;

    assert!(page.catalog().is_empty());
    let banner = page.page_mut().banner().unwrap();
    assert_eq!(banner.tone, Tone::Critical);
}

#[tokio::test]
async fn pre_order_catalog_search_and_toggle() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(404, "").await;
    transport
        .respond_json(
            200,
            json!({
                "products": [
                    { "id": 1, "title": "Winter Hat" },
                    { "id": 2, "title": "Summer HAT" },
                    { "id": 3, "title": "Scarf" }
                ]
            }),
        )
        .await;

    let mut page = PreOrderPage::new(api);
    page.load().await;
    page.load_catalog().await;

    let hats: Vec<_> = page.filtered_catalog("hat").iter().map(|p| p.id.get()).collect();
    assert_eq!(hats, vec![1, 2]);
    assert_eq!(page.filtered_catalog("").len(), 3);

    assert!(page.toggle(ProductId::new(3)));
    assert_eq!(page.selected()[0].title, "Scarf");
    assert!(page.toggle(ProductId::new(3)));
    assert!(page.selected().is_empty());
    assert!(!page.toggle(ProductId::new(99)));
    assert!(!page.remove(ProductId::new(3)));
}

#[tokio::test]
async fn reports_pagination_follows_row_count() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond_json(200, subscriptions(10, 1)).await;
    transport.respond_json(200, subscriptions(4, 2)).await;
    transport.respond_json(200, subscriptions(10, 1)).await;

    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));

    page.load(1).await;
    assert_eq!(page.rows().len(), 10);
    assert!(page.has_next());
    assert!(!page.has_previous());

    assert!(page.next_page().await);
    assert_eq!(page.pagination().page, 2);
    assert!(!page.has_next());
    assert!(page.has_previous());
    assert!(!page.next_page().await);

    assert!(page.previous_page().await);
    assert_eq!(page.pagination().page, 1);

    let urls: Vec<_> = transport.sent().await.into_iter().map(|r| r.url).collect();
    assert!(urls[1].ends_with("subscriptions?page=2&limit=10"));
    assert_eq!(
        page.product_admin_url(&page.rows()[0]),
        Some(format!("https://{SHOP}/admin/products/500"))
    );
}

#[tokio::test]
async fn reports_keep_rows_for_deleted_products() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport
        .respond_json(
            200,
            json!({
                "subscriptions": [
                    { "email": "a@b.c", "product_id": 7, "product_title": "Hat",
                      "created_at": "2024-01-05T12:00:00Z" },
                    { "email": "gone@b.c", "product_id": null, "product_title": null,
                      "created_at": "2024-01-06T12:00:00Z" }
                ],
                "pagination": { "page": 1, "limit": 10 }
            }),
        )
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));
    page.load(1).await;

    assert_eq!(page.rows().len(), 2);
    assert_eq!(page.rows()[1].email, "gone@b.c");
    assert_eq!(page.rows()[1].product_title, "");
    assert_eq!(page.product_admin_url(&page.rows()[1]), None);
    assert_eq!(
        page.product_admin_url(&page.rows()[0]),
        Some(format!("https://{SHOP}/admin/products/7"))
    );
}

#[tokio::test]
async fn coming_soon_list_survives_one_bad_entry() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport
        .respond_json(
            200,
            json!({
                "product_1": { "product_title": "One", "enable_notify_me": true },
                "product_2": { "product_title": "Two", "enable_notify_me": null },
                "product_3": { "end_date": ["bad"] }
            }),
        )
        .await;

    let mut list = ComingSoonList::new(api);
    list.refresh().await;
    let titles: Vec<_> = list.entries().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two"]);
}

#[tokio::test]
async fn reports_failure_resets_pagination() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(500, "boom").await;

    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));
    page.load(3).await;

    assert!(page.rows().is_empty());
    assert_eq!(page.pagination().page, 1);
    assert_eq!(page.pagination().limit, 10);
}

#[tokio::test]
async fn export_writes_named_csv() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(200, "email\na@b.c\n").await;

    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));
    assert_eq!(page.export_range().start(), day("2024-01-01"));

    page.set_export_range("2024-01-01", "2024-01-31").unwrap();
    let path = page.export().await.unwrap();

    assert_eq!(
        path,
        tmp.path()
            .join("notify-me-subscriptions-2024-01-01-to-2024-01-31.csv")
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "email\na@b.c\n");
    assert_eq!(page.banner().unwrap().tone, Tone::Success);
    assert_eq!(
        transport.sent().await[0].body,
        Some(json!({ "start_date": "2024-01-01", "end_date": "2024-01-31" }))
    );
}

#[tokio::test]
async fn export_failure_shows_critical_banner() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    transport.respond(500, "boom").await;

    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));

    assert!(page.export().await.is_err());
    assert_eq!(page.banner().unwrap().tone, Tone::Critical);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn export_range_rejects_end_before_start() {
    let (api, transport, _) = setup(FakeBridge::with_token("tok"));
    let tmp = tempfile::tempdir().unwrap();
    let sink = Arc::new(DirectorySink::new(tmp.path()));
    let mut page = ReportsPage::new(api, sink, 10, day("2024-01-20"));

    assert!(page.set_export_range("2024-02-10", "2024-02-01").is_err());
    assert_eq!(page.export_range().end(), day("2024-01-20"));
    assert!(transport.sent().await.is_empty());
}
