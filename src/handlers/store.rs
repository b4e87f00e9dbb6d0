use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::domain::cart::CART_COOKIE;
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::views::{CartPage, CheckoutPage, Nav, NotFoundPage, ProductCard, ProductDetailPage, StorePage};

use super::session::{cart_cookie, removal_cookie};
use super::{current_user, redirect, render, AppState};

/// GET /
pub async fn store(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = current_user(&state, &req).await?;
    let cookie = cart_cookie(&req);
    let carts = state.carts.clone();
    let signed_in = user.clone();

    let (products, cart) = web::block(move || -> Result<_, DomainError> {
        let products = carts.products()?;
        let cart = carts.cart_data(signed_in.as_ref(), cookie.as_deref())?;
        Ok((products, cart))
    })
    .await??;

    let page = StorePage::new(Nav::new(user.as_ref(), cart.cart_items), &products);
    render(&page, StatusCode::OK)
}

/// GET /cart/
pub async fn cart(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = current_user(&state, &req).await?;
    let cookie = cart_cookie(&req);
    let carts = state.carts.clone();
    let signed_in = user.clone();

    let cart = web::block(move || carts.cart_data(signed_in.as_ref(), cookie.as_deref())).await??;

    let page = CartPage::new(Nav::new(user.as_ref(), cart.cart_items), &cart);
    render(&page, StatusCode::OK)
}

/// GET /checkout/
pub async fn checkout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, &req).await? else {
        return Ok(redirect("/login/?next=/checkout/"));
    };
    let carts = state.carts.clone();
    let signed_in = user.clone();

    let cart = web::block(move || carts.cart_data(Some(&signed_in), None)).await??;

    let page = CheckoutPage::new(Nav::new(Some(&user), cart.cart_items), &user, &cart);
    render(&page, StatusCode::OK)
}

/// GET /product/{id}/
pub async fn product_detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = current_user(&state, &req).await?;
    let cookie = cart_cookie(&req);
    let carts = state.carts.clone();
    let signed_in = user.clone();
    let id = Uuid::parse_str(&path.into_inner()).ok();

    let (product, cart) = web::block(move || -> Result<_, DomainError> {
        let product = match id {
            Some(id) => carts.product(id).map(Some).or_else(|e| match e {
                DomainError::NotFound(_) => Ok(None),
                other => Err(other),
            })?,
            None => None,
        };
        let cart = carts.cart_data(signed_in.as_ref(), cookie.as_deref())?;
        Ok((product, cart))
    })
    .await??;

    let nav = Nav::new(user.as_ref(), cart.cart_items);
    match product {
        Some(product) => render(
            &ProductDetailPage {
                nav,
                product: ProductCard::from(&product),
            },
            StatusCode::OK,
        ),
        None => render(
            &NotFoundPage {
                nav,
                message: "That product does not exist.".to_string(),
            },
            StatusCode::NOT_FOUND,
        ),
    }
}

/// POST /clear-cart/
///
/// Signed-in customers lose the line items of their open order; anonymous
/// visitors get their cart cookie expired.
pub async fn clear_cart(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let user = current_user(&state, &req).await?;
    let mut response = HttpResponse::SeeOther();
    response.insert_header((header::LOCATION, "/"));

    match user {
        Some(user) => {
            let carts = state.carts.clone();
            let username = user.username.clone();
            let removed = web::block(move || carts.clear_cart(Some(&user))).await??;
            log::info!("Cleared {removed} item(s) from the cart of {username}");
        }
        None => {
            response.cookie(removal_cookie(CART_COOKIE));
        }
    }
    Ok(response.finish())
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
