//! Telegram notifier integration tests.
//!
//! Runs a stub Bot API with axum and checks the posted forms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Router};
use stockwatch::error::AppError;
use stockwatch::models::{NotificationEvent, ProductId, ProductRecord, VoucherConfig};
use stockwatch::services::{MAX_CAPTION_UNITS, Notifier, TelegramNotifier, render_event};

type Calls = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

async fn bot_method(
    State(calls): State<Calls>,
    Path((token, method)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if token != "botTESTTOKEN" {
        return (
            StatusCode::UNAUTHORIZED,
            r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        );
    }
    if form.get("chat_id").map(String::as_str) == Some("@missing") {
        return (
            StatusCode::BAD_REQUEST,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        );
    }
    calls.lock().unwrap().push((method, form));
    (StatusCode::OK, r#"{"ok":true,"result":{}}"#)
}

async fn start_server() -> (String, Calls) {
    let calls = Calls::default();
    let app = Router::new()
        .route("/:token/:method", post(bot_method))
        .with_state(calls.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), calls)
}

fn notifier(base: &str, token: &str, chat: &str) -> TelegramNotifier {
    TelegramNotifier::new(reqwest::Client::new(), base, token, chat, "HTML")
}

#[tokio::test]
async fn send_text_posts_message_form() {
    let (base, calls) = start_server().await;
    notifier(&base, "TESTTOKEN", "@deals")
        .send_text("<b>hello</b>")
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    let (method, form) = &calls[0];
    assert_eq!(method, "sendMessage");
    assert_eq!(form["chat_id"], "@deals");
    assert_eq!(form["text"], "<b>hello</b>");
    assert_eq!(form["parse_mode"], "HTML");
    assert_eq!(form["disable_web_page_preview"], "true");
}

#[tokio::test]
async fn send_photo_posts_photo_and_caption() {
    let (base, calls) = start_server().await;
    notifier(&base, "TESTTOKEN", "@deals")
        .send_photo("caption", "https://img.test/p1.jpg")
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    let (method, form) = &calls[0];
    assert_eq!(method, "sendPhoto");
    assert_eq!(form["photo"], "https://img.test/p1.jpg");
    assert_eq!(form["caption"], "caption");
}

#[tokio::test]
async fn long_product_caption_keeps_markup_well_formed() {
    let (base, calls) = start_server().await;
    let bot = notifier(&base, "TESTTOKEN", "@deals");
    let product = ProductRecord {
        id: ProductId::new("443019876").unwrap(),
        name: "Tee & Shorts <Co-ord> Set ".repeat(80),
        display_price: "₹799".to_string(),
        price_value: Some(799.0),
        link: "https://shop.test/p/443019876?src=feed&page=0".to_string(),
        image: Some("https://img.test/443019876.jpg".to_string()),
        variants: ["M".to_string(), "L".to_string()].into_iter().collect(),
    };
    let message = render_event(
        &NotificationEvent::NewProduct { product },
        &VoucherConfig::default(),
    );

    bot.deliver(&message).await.unwrap();

    let calls = calls.lock().unwrap();
    let (method, form) = &calls[0];
    assert_eq!(method, "sendPhoto");
    let caption = &form["caption"];

    let tags = regex::Regex::new(r"<[^>]+>").unwrap();
    let entities = regex::Regex::new(r"&(amp|lt|gt|quot);").unwrap();
    assert!(!entities.replace_all(caption, "").contains('&'));
    let visible = html_escape::decode_html_entities(&tags.replace_all(caption, "")).into_owned();
    assert!(visible.encode_utf16().count() <= MAX_CAPTION_UNITS);
    assert!(caption.ends_with(
        "<a href=\"https://shop.test/p/443019876?src=feed&amp;page=0\">Open Product</a>"
    ));
}

#[tokio::test]
async fn api_rejection_surfaces_description() {
    let (base, calls) = start_server().await;
    let err = notifier(&base, "TESTTOKEN", "@missing")
        .send_text("hi")
        .await
        .unwrap_err();

    match err {
        AppError::Notify { operation, message } => {
            assert_eq!(operation, "sendMessage");
            assert_eq!(message, "Bad Request: chat not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn error_message_hides_token() {
    // Nothing listens on port 9; the connection is refused.
    let bot = notifier("http://127.0.0.1:9", "SECRET123", "@deals");
    let err = bot.send_text("hi").await.unwrap_err();
    assert!(!err.to_string().contains("SECRET123"));
}
