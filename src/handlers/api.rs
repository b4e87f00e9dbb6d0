use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{CartAction, Checkout, CheckoutOutcome, ShippingInfo};
use crate::errors::AppError;

use super::{current_user, AppState};

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub product_id: Uuid,
    pub action: CartAction,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutForm {
    /// Cart total as the client computed it, either a number or a decimal string.
    #[schema(value_type = String, example = "25.00")]
    pub total: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Shipping fields are `null` when the order is digital-only.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShippingRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

impl ShippingRequest {
    fn into_info(self) -> Option<ShippingInfo> {
        let provided = [&self.address, &self.city, &self.state, &self.zipcode]
            .iter()
            .any(|f| f.as_deref().is_some_and(|v| !v.trim().is_empty()));
        if !provided {
            return None;
        }
        Some(ShippingInfo {
            address: self.address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            zipcode: self.zipcode.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessOrderRequest {
    pub form: CheckoutForm,
    #[serde(default)]
    pub shipping: Option<ShippingRequest>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /update_item/
///
/// Adds or removes one unit of a product in the signed-in customer's open
/// order. Items whose quantity drops to zero are deleted.
#[utoipa::path(
    post,
    path = "/update_item/",
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Cart updated"),
        (status = 400, description = "Malformed request or update failure"),
        (status = 401, description = "User not authenticated"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    apply_update(&state, &req, body.into_inner())
        .await
        .map_err(update_error)?;
    Ok(HttpResponse::Ok().json(json!({})))
}

async fn apply_update(
    state: &web::Data<AppState>,
    req: &HttpRequest,
    body: UpdateItemRequest,
) -> Result<(), AppError> {
    let user = current_user(state, req).await?;
    let carts = state.carts.clone();
    web::block(move || carts.update_item(user.as_ref(), body.product_id, body.action)).await??;
    Ok(())
}

/// Callers only learn about authentication and unknown products; every
/// other failure is a generic 400.
fn update_error(e: AppError) -> AppError {
    match e {
        AppError::Unauthorized(_) => e,
        AppError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
        other => {
            log::error!("Error updating cart: {other}");
            AppError::BadRequest("Error updating cart".to_string())
        }
    }
}

/// POST /process_order/
///
/// Records the transaction for the signed-in customer's open order and marks
/// it complete when the declared total matches the cart total.
#[utoipa::path(
    post,
    path = "/process_order/",
    request_body = ProcessOrderRequest,
    responses(
        (status = 200, description = "Payment processed"),
        (status = 400, description = "Invalid total or missing shipping details"),
    ),
    tag = "cart"
)]
pub async fn process_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProcessOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let checkout = Checkout {
        total: body.form.total,
        shipping: body.shipping.and_then(ShippingRequest::into_info),
    };

    let outcome = complete_checkout(&state, &req, checkout)
        .await
        .map_err(checkout_error)?;
    if let CheckoutOutcome::Processed { order_id, complete } = outcome {
        log::debug!("Checkout for order {order_id} processed (complete: {complete})");
    }

    Ok(HttpResponse::Ok().json("Payment complete"))
}

async fn complete_checkout(
    state: &web::Data<AppState>,
    req: &HttpRequest,
    checkout: Checkout,
) -> Result<CheckoutOutcome, AppError> {
    let user = current_user(state, req).await?;
    let carts = state.carts.clone();
    let outcome = web::block(move || carts.process_order(user.as_ref(), checkout)).await??;
    Ok(outcome)
}

fn checkout_error(e: AppError) -> AppError {
    match e {
        AppError::Internal(detail) => {
            log::error!("Error processing order: {detail}");
            AppError::BadRequest("Error processing order".to_string())
        }
        other => other,
    }
}
