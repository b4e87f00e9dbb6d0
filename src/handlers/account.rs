use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::domain::account::{FormErrors, LoginForm, RegisterForm};
use crate::domain::errors::DomainError;
use crate::errors::AppError;
use crate::views::{LoginPage, Nav, ProfilePage, RegisterPage};

use super::session::{removal_cookie, safe_next, session_cookie, session_token, SESSION_COOKIE};
use super::{current_user, redirect, redirect_with_cookie, render, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct NextParam {
    #[serde(default)]
    pub next: Option<String>,
}

impl NextParam {
    fn target(&self) -> &str {
        safe_next(self.next.as_deref()).unwrap_or("/")
    }
}

/// GET /register/
pub async fn register_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, &req).await?.is_some() {
        return Ok(redirect("/"));
    }
    let page = RegisterPage::new(Nav::default(), "", "", &FormErrors::default());
    render(&page, StatusCode::OK)
}

/// POST /register/
pub async fn register(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, &req).await?.is_some() {
        return Ok(redirect("/"));
    }
    let form = form.into_inner();
    let accounts = state.accounts.clone();
    let submitted = form.clone();

    match web::block(move || accounts.register(&submitted)).await? {
        Ok((_, session)) => Ok(redirect_with_cookie(
            "/",
            session_cookie(&session, state.secure_cookies),
        )),
        Err(DomainError::Validation(errors)) => {
            let page = RegisterPage::new(Nav::default(), &form.username, &form.email, &errors);
            render(&page, StatusCode::BAD_REQUEST)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /login/
pub async fn login_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NextParam>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, &req).await?.is_some() {
        return Ok(redirect(query.target()));
    }
    let next = safe_next(query.next.as_deref());
    let page = LoginPage::new(Nav::default(), "", next, &FormErrors::default());
    render(&page, StatusCode::OK)
}

/// POST /login/
pub async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<NextParam>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    if current_user(&state, &req).await?.is_some() {
        return Ok(redirect(query.target()));
    }
    let form = form.into_inner();
    let accounts = state.accounts.clone();
    let submitted = form.clone();

    match web::block(move || accounts.login(&submitted)).await? {
        Ok((_, session)) => Ok(redirect_with_cookie(
            query.target(),
            session_cookie(&session, state.secure_cookies),
        )),
        Err(DomainError::Validation(errors)) => {
            let next = safe_next(query.next.as_deref());
            let page = LoginPage::new(Nav::default(), &form.username, next, &errors);
            render(&page, StatusCode::BAD_REQUEST)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /logout/
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    if let Some(token) = session_token(&req) {
        let accounts = state.accounts.clone();
        web::block(move || accounts.logout(&token)).await??;
        log::info!("User logged out");
    }
    Ok(redirect_with_cookie("/", removal_cookie(SESSION_COOKIE)))
}

/// GET /profile/
pub async fn profile(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let Some(user) = current_user(&state, &req).await? else {
        return Ok(redirect("/login/?next=/profile/"));
    };
    let accounts = state.accounts.clone();
    let carts = state.carts.clone();
    let signed_in = user.clone();

    let (profile, cart) = web::block(move || -> Result<_, DomainError> {
        let profile = accounts.profile(&signed_in)?;
        let cart = carts.cart_data(Some(&signed_in), None)?;
        Ok((profile, cart))
    })
    .await??;

    let page = ProfilePage::new(Nav::new(Some(&user), cart.cart_items), &profile);
    render(&page, StatusCode::OK)
}
