//! End-to-end poll cycles.
//!
//! A stub storefront and a stub Bot API run on one axum server; the
//! monitor persists to a temp directory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde_json::{Value, json};
use stockwatch::models::{Config, ProductId, VariantSet};
use stockwatch::pipeline::Monitor;
use stockwatch::services::{HttpCatalogFetcher, TelegramNotifier};
use stockwatch::storage::{LocalSnapshotStore, SnapshotStore};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Stub {
    feed: Arc<Mutex<Value>>,
    sent: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

impl Stub {
    fn set_feed(&self, products: Value) {
        *self.feed.lock().unwrap() = json!({ "products": products });
    }

    fn take_sent(&self) -> Vec<(String, HashMap<String, String>)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

async fn feed(State(stub): State<Stub>) -> String {
    stub.feed.lock().unwrap().to_string()
}

async fn bot(
    State(stub): State<Stub>,
    Path((_token, method)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> &'static str {
    stub.sent.lock().unwrap().push((method, form));
    r#"{"ok":true}"#
}

async fn start_server(stub: Stub) -> String {
    let app = Router::new()
        .route("/api/category", get(feed))
        .route("/:token/:method", post(bot))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base: &str) -> Arc<Config> {
    let mut config = Config::default();
    config.feed.url = format!("{base}/api/category");
    config.feed.site_origin = "https://shop.test".to_string();
    config.notifier.api_base = base.to_string();
    config.notifier.bot_token = Some("TESTTOKEN".to_string());
    config.notifier.chat_id = Some("@deals".to_string());
    Arc::new(config)
}

async fn monitor(base: &str, snapshot_path: &std::path::Path) -> Monitor {
    let config = config(base);
    let fetcher = HttpCatalogFetcher::from_config(&config.feed).unwrap();
    let notifier = TelegramNotifier::from_config(&config.notifier).unwrap();
    let store = LocalSnapshotStore::new(snapshot_path);
    Monitor::start(config, Box::new(fetcher), Arc::new(notifier), Box::new(store))
        .await
        .unwrap()
}

fn tee(sizes: Value) -> Value {
    json!({
        "code": "443019876",
        "name": "Oversized Tee",
        "offerPrice": { "value": 449, "formattedValue": "₹449" },
        "url": "/p/443019876",
        "images": [{ "url": "https://img.test/443019876.jpg" }],
        "variantOptions": sizes,
    })
}

fn jacket(sizes: Value) -> Value {
    json!({
        "code": "443019877",
        "name": "Denim Jacket",
        "price": { "value": 1299 },
        "url": "/p/443019877",
        "variantOptions": sizes,
    })
}

#[tokio::test]
async fn cycles_announce_changes_and_persist() {
    let stub = Stub::default();
    let base = start_server(stub.clone()).await;
    let tmp = TempDir::new().unwrap();
    let snapshot_path = tmp.path().join("snapshot.json");

    stub.set_feed(json!([tee(json!([
        { "scDisplaySize": "M" },
        { "scDisplaySize": "L", "inStock": false },
    ]))]));
    let mut watcher = monitor(&base, &snapshot_path).await;

    // First sighting: one photo post.
    let report = watcher.run_cycle().await.unwrap();
    assert_eq!(report.new_products, 1);
    let sent = stub.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "sendPhoto");
    let caption = &sent[0].1["caption"];
    assert!(caption.contains("NEW PRODUCT"));
    assert!(caption.contains("₹449"));
    assert!(caption.contains("Sizes: M"));
    assert!(caption.contains("https://shop.test/p/443019876"));

    // L comes back, M sells out; the jacket appears as text.
    stub.set_feed(json!([
        tee(json!([
            { "scDisplaySize": "M", "inStock": false },
            { "scDisplaySize": "L", "inStock": true },
        ])),
        jacket(json!([{ "size": "XL" }])),
    ]));
    let report = watcher.run_cycle().await.unwrap();
    assert_eq!(
        (report.new_products, report.restocked, report.sold_out),
        (1, 1, 1)
    );
    let sent = stub.take_sent();
    assert_eq!(sent.len(), 3);
    let texts: Vec<&str> = sent
        .iter()
        .filter(|(method, _)| method == "sendMessage")
        .map(|(_, form)| form["text"].as_str())
        .collect();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Denim Jacket"));
    assert!(texts[0].contains("₹1299"));

    let captions: Vec<&str> = sent
        .iter()
        .filter_map(|(_, form)| form.get("caption").map(String::as_str))
        .collect();
    assert!(captions.iter().any(|c| c.contains("Back in stock: L")));
    assert!(captions.iter().any(|c| c.contains("Sold out: M")));

    // Unchanged page: silence.
    let report = watcher.run_cycle().await.unwrap();
    assert_eq!(report.event_count(), 0);
    assert!(stub.take_sent().is_empty());

    let stored = LocalSnapshotStore::new(&snapshot_path).load().await.unwrap();
    let tee_sizes: VariantSet = ["L".to_string()].into_iter().collect();
    assert_eq!(
        stored.variants(&ProductId::new("443019876").unwrap()),
        Some(&tee_sizes)
    );
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn restart_resumes_from_persisted_snapshot() {
    let stub = Stub::default();
    let base = start_server(stub.clone()).await;
    let tmp = TempDir::new().unwrap();
    let snapshot_path = tmp.path().join("snapshot.json");

    stub.set_feed(json!([jacket(json!([{ "size": "S" }, { "size": "M" }]))]));
    monitor(&base, &snapshot_path)
        .await
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(stub.take_sent().len(), 1);

    let mut restarted = monitor(&base, &snapshot_path).await;
    assert_eq!(restarted.snapshot().len(), 1);
    let report = restarted.run_cycle().await.unwrap();
    assert_eq!(report.event_count(), 0);
    assert!(stub.take_sent().is_empty());
}

#[tokio::test]
async fn delisted_product_restocks_on_return() {
    let stub = Stub::default();
    let base = start_server(stub.clone()).await;
    let tmp = TempDir::new().unwrap();
    let mut watcher = monitor(&base, &tmp.path().join("snapshot.json")).await;

    stub.set_feed(json!([
        jacket(json!([{ "size": "M" }])),
        tee(json!([{ "scDisplaySize": "S" }])),
    ]));
    watcher.run_cycle().await.unwrap();
    stub.take_sent();

    // Jacket leaves the page; nothing is said and it is remembered.
    stub.set_feed(json!([tee(json!([{ "scDisplaySize": "S" }]))]));
    let report = watcher.run_cycle().await.unwrap();
    assert_eq!(report.event_count(), 0);
    assert_eq!(watcher.snapshot().len(), 2);

    // It returns with a new size: restock, not a new product.
    stub.set_feed(json!([jacket(json!([{ "size": "M" }, { "size": "L" }]))]));
    let report = watcher.run_cycle().await.unwrap();
    assert_eq!((report.new_products, report.restocked), (0, 1));
}
