//! HTTP-level tests for the storefront routes, run against the in-memory store.

use std::str::FromStr;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use uuid::Uuid;

use storefront::domain::catalog::Product;
use storefront::handlers;
use storefront::infrastructure::InMemoryStore;
use storefront::AppState;

fn product(name: &str, price: &str, digital: bool) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price: BigDecimal::from_str(price).expect("valid decimal"),
        digital,
        image: None,
    }
}

struct Catalog {
    book: Product,
    ebook: Product,
}

fn catalog() -> (Arc<InMemoryStore>, Catalog) {
    let book = product("Mount of Olives Book", "12.50", false);
    let ebook = product("Project Source Code", "20.00", true);
    let store = Arc::new(InMemoryStore::with_products(vec![
        book.clone(),
        ebook.clone(),
    ]));
    (store, Catalog { book, ebook })
}

async fn app(
    store: Arc<InMemoryStore>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let state = AppState::new(store, chrono::Duration::hours(1), false);
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(handlers::configure),
    )
    .await
}

fn session_from(resp: &ServiceResponse) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "sessionid")
        .map(|c| c.into_owned())
        .expect("session cookie set")
}

fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn body_text(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(resp: ServiceResponse) -> Value {
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).expect("json body")
}

async fn register<S>(app: &S, username: &str, email: &str) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/register/")
        .set_form([
            ("username", username),
            ("email", email),
            ("password1", "correct-horse"),
            ("password2", "correct-horse"),
        ])
        .to_request();
    test::call_service(app, req).await
}

async fn update_item<S>(app: &S, session: Option<&Cookie<'static>>, body: Value) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut req = test::TestRequest::post().uri("/update_item/").set_json(body);
    if let Some(session) = session {
        req = req.cookie(session.clone());
    }
    test::call_service(app, req.to_request()).await
}

#[actix_web::test]
async fn anonymous_update_item_is_unauthorized() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;

    let resp = update_item(
        &app,
        None,
        json!({ "productId": catalog.book.id, "action": "add" }),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({ "error": "User not authenticated" }));
    assert_eq!(store.order_item_count(), 0);
}

#[actix_web::test]
async fn signed_in_update_item_adds_and_removes() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    let add = json!({ "productId": catalog.book.id, "action": "add" });
    let remove = json!({ "productId": catalog.book.id, "action": "remove" });

    let resp = update_item(&app, Some(&session), add.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({}));
    update_item(&app, Some(&session), add).await;

    let cart = test::TestRequest::get()
        .uri("/cart/")
        .cookie(session.clone())
        .to_request();
    let html = body_text(test::call_service(&app, cart).await).await;
    assert!(html.contains("Mount of Olives Book"));
    assert!(html.contains("25.00"));

    update_item(&app, Some(&session), remove.clone()).await;
    assert_eq!(store.order_item_count(), 1);
    update_item(&app, Some(&session), remove).await;
    assert_eq!(store.order_item_count(), 0);
}

#[actix_web::test]
async fn update_item_reports_unknown_product_and_bad_action() {
    let (store, catalog) = catalog();
    let app = app(store).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);

    let resp = update_item(
        &app,
        Some(&session),
        json!({ "productId": Uuid::new_v4(), "action": "add" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await, json!({ "error": "Product not found" }));

    let resp = update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.book.id, "action": "delete" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({ "error": "Error updating cart" }));
}

#[actix_web::test]
async fn process_order_completes_when_total_matches() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.book.id, "action": "add" }),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/process_order/")
        .cookie(session.clone())
        .set_json(json!({
            "form": { "total": "12.50", "name": "alice", "email": "alice@example.com" },
            "shipping": { "address": "1 Main St", "city": "Springfield", "state": "IL", "zipcode": "62701" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!("Payment complete"));
    let orders = store.orders();
    assert_eq!(orders.len(), 1);
    assert!(orders[0].complete);
    assert_eq!(store.shipping_addresses().len(), 1);
}

#[actix_web::test]
async fn process_order_keeps_order_open_on_total_mismatch() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.ebook.id, "action": "add" }),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/process_order/")
        .cookie(session.clone())
        .set_json(json!({
            "form": { "total": 1.0, "name": null, "email": null },
            "shipping": { "address": null, "city": null, "state": null, "zipcode": null }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let orders = store.orders();
    assert!(orders.iter().all(|o| !o.complete));
    assert!(orders.iter().all(|o| o.transaction_id.is_some()));
}

#[actix_web::test]
async fn process_order_rejects_over_long_address_without_completing() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.book.id, "action": "add" }),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/process_order/")
        .cookie(session.clone())
        .set_json(json!({
            "form": { "total": "12.50" },
            "shipping": { "address": "x".repeat(201), "city": "Springfield", "state": "IL", "zipcode": "62701" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(store.orders().iter().all(|o| !o.complete));
    assert!(store.shipping_addresses().is_empty());
}

#[actix_web::test]
async fn anonymous_process_order_writes_nothing() {
    let (store, _) = catalog();
    let app = app(Arc::clone(&store)).await;

    let req = test::TestRequest::post()
        .uri("/process_order/")
        .set_json(json!({ "form": { "total": "0" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!("Payment complete"));
    assert!(store.orders().is_empty());
}

#[actix_web::test]
async fn anonymous_cart_page_reads_cookie_and_skips_unknown_products() {
    let (store, catalog) = catalog();
    let app = app(store).await;
    let (book, ebook, missing) = (
        catalog.book.id.to_string(),
        catalog.ebook.id.to_string(),
        Uuid::new_v4().to_string(),
    );
    let cart = json!({
        book: { "quantity": 2, "checked": true },
        ebook: { "quantity": 1 },
        missing: { "quantity": 5 },
        "not-a-uuid": { "quantity": 1 },
    });

    let req = test::TestRequest::get()
        .uri("/cart/")
        .cookie(Cookie::new("cart", cart.to_string()))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Mount of Olives Book"));
    assert!(html.contains("Project Source Code"));
    assert!(html.contains("45.00"), "total should be 2 x 12.50 + 20.00");
    assert!(html.contains("<strong>3</strong>"));
}

#[actix_web::test]
async fn huge_cookie_quantities_do_not_break_pages() {
    let (store, catalog) = catalog();
    let app = app(store).await;
    let (book, ebook) = (catalog.book.id.to_string(), catalog.ebook.id.to_string());
    let cart = json!({
        book: { "quantity": i32::MAX },
        ebook: { "quantity": i32::MAX },
    })
    .to_string();

    for uri in ["/", "/cart/"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .cookie(Cookie::new("cart", cart.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert!(body_text(resp).await.contains(&i32::MAX.to_string()), "{uri}");
    }
}

#[actix_web::test]
async fn garbage_cart_cookie_renders_empty_cart() {
    let (store, _) = catalog();
    let app = app(store).await;

    let req = test::TestRequest::get()
        .uri("/cart/")
        .cookie(Cookie::new("cart", "not json"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("<strong>0</strong>"));
}

#[actix_web::test]
async fn duplicate_email_registration_is_rejected() {
    let (store, _) = catalog();
    let app = app(Arc::clone(&store)).await;
    let first = register(&app, "alice", "shared@example.com").await;
    assert_eq!(first.status(), StatusCode::FOUND);

    let resp = register(&app, "bob", "shared@example.com").await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("This email is already registered."));
    assert_eq!(store.user_count(), 1);
}

#[actix_web::test]
async fn login_redirects_to_local_next_only() {
    let (store, _) = catalog();
    let app = app(store).await;
    register(&app, "alice", "alice@example.com").await;

    let bad = test::TestRequest::post()
        .uri("/login/")
        .set_form([("username", "alice"), ("password", "wrong-horse")])
        .to_request();
    let resp = test::call_service(&app, bad).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("Invalid username or password."));

    let good = test::TestRequest::post()
        .uri("/login/?next=/checkout/")
        .set_form([("username", "alice"), ("password", "correct-horse")])
        .to_request();
    let resp = test::call_service(&app, good).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/checkout/");

    let offsite = test::TestRequest::post()
        .uri("/login/?next=//evil.example/")
        .set_form([("username", "alice"), ("password", "correct-horse")])
        .to_request();
    let resp = test::call_service(&app, offsite).await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn gated_pages_redirect_anonymous_visitors() {
    let (store, _) = catalog();
    let app = app(store).await;

    for (path, target) in [
        ("/checkout/", "/login/?next=/checkout/"),
        ("/profile/", "/login/?next=/profile/"),
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), target);
    }
}

#[actix_web::test]
async fn logout_ends_the_session() {
    let (store, _) = catalog();
    let app = app(store).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);

    let req = test::TestRequest::get()
        .uri("/logout/")
        .cookie(session.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let req = test::TestRequest::get()
        .uri("/profile/")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/login/?next=/profile/");
}

#[actix_web::test]
async fn profile_lists_completed_orders() {
    let (store, catalog) = catalog();
    let app = app(store).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.ebook.id, "action": "add" }),
    )
    .await;
    let checkout = test::TestRequest::post()
        .uri("/process_order/")
        .cookie(session.clone())
        .set_json(json!({ "form": { "total": 20 } }))
        .to_request();
    test::call_service(&app, checkout).await;

    let req = test::TestRequest::get()
        .uri("/profile/")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("alice@example.com"));
    assert!(html.contains("Complete"));
    assert!(html.contains("20.00"));
}

#[actix_web::test]
async fn product_detail_renders_or_404s() {
    let (store, catalog) = catalog();
    let app = app(store).await;

    let uri = format!("/product/{}/", catalog.book.id);
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("12.50"));

    for uri in [format!("/product/{}/", Uuid::new_v4()), "/product/abc/".to_string()] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn clear_cart_empties_signed_in_order_and_expires_cookie_otherwise() {
    let (store, catalog) = catalog();
    let app = app(Arc::clone(&store)).await;
    let session = session_from(&register(&app, "alice", "alice@example.com").await);
    update_item(
        &app,
        Some(&session),
        json!({ "productId": catalog.book.id, "action": "add" }),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/clear-cart/")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.order_item_count(), 0);

    let req = test::TestRequest::post().uri("/clear-cart/").to_request();
    let resp = test::call_service(&app, req).await;
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == "cart")
        .expect("cart cookie removed");
    assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn store_page_and_health_respond() {
    let (store, _) = catalog();
    let app = app(store).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("Mount of Olives Book"));
    assert!(html.contains("Project Source Code"));

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(body_json(resp).await, json!({ "status": "ok" }));
}
