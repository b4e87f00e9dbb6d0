pub mod account;
pub mod api;
pub mod session;
pub mod store;

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{error, web, HttpRequest, HttpResponse, ResponseError};
use askama::Template;
use utoipa::OpenApi;

use crate::application::account_service::AccountService;
use crate::application::cart_service::CartService;
use crate::domain::account::User;
use crate::domain::ports::StoreRepository;
use crate::errors::AppError;

/// Shared per-worker state. Services hold the repository behind a trait
/// object so tests can swap in the in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub carts: CartService<dyn StoreRepository>,
    pub accounts: AccountService<dyn StoreRepository>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn StoreRepository>,
        session_ttl: chrono::Duration,
        secure_cookies: bool,
    ) -> Self {
        Self {
            carts: CartService::new(Arc::clone(&repo)),
            accounts: AccountService::new(repo, session_ttl),
            secure_cookies,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(api::update_item, api::process_order, store::health),
    components(schemas(api::UpdateItemRequest, api::ProcessOrderRequest, api::CheckoutForm, api::ShippingRequest)),
    tags(
        (name = "cart", description = "Cart and checkout endpoints"),
        (name = "health", description = "Liveness probe")
    )
)]
pub struct ApiDoc;

/// Register every storefront route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config("Invalid request body"))
        .route("/", web::get().to(store::store))
        .route("/cart/", web::get().to(store::cart))
        .route("/checkout/", web::get().to(store::checkout))
        .route("/product/{id}/", web::get().to(store::product_detail))
        .route("/clear-cart/", web::post().to(store::clear_cart))
        .route("/health", web::get().to(store::health))
        .service(
            web::resource("/update_item/")
                .app_data(json_config("Error updating cart"))
                .route(web::post().to(api::update_item)),
        )
        .route("/process_order/", web::post().to(api::process_order))
        .service(
            web::resource("/register/")
                .route(web::get().to(account::register_page))
                .route(web::post().to(account::register)),
        )
        .service(
            web::resource("/login/")
                .route(web::get().to(account::login_page))
                .route(web::post().to(account::login)),
        )
        .route("/logout/", web::get().to(account::logout))
        .route("/profile/", web::get().to(account::profile));
}

/// JSON body errors become a 400 with `message` in the usual error shape.
fn json_config(message: &'static str) -> web::JsonConfig {
    web::JsonConfig::default().error_handler(move |err, _req| {
        log::warn!("Rejected JSON body: {err}");
        let response = AppError::BadRequest(message.to_string()).error_response();
        error::InternalError::from_response(err, response).into()
    })
}

/// The signed-in user for this request, if the session cookie is valid.
pub(crate) async fn current_user(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<Option<User>, AppError> {
    let Some(token) = session::session_token(req) else {
        return Ok(None);
    };
    let accounts = state.accounts.clone();
    let user = web::block(move || accounts.current_user(&token)).await??;
    Ok(user)
}

pub(crate) fn render<T: Template>(page: &T, status: StatusCode) -> Result<HttpResponse, AppError> {
    let body = page
        .render()
        .map_err(|e| AppError::Internal(format!("template error: {e}")))?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn redirect_with_cookie(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}
