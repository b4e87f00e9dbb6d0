use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::Utc;

use crate::domain::account::Session;
use crate::domain::cart::CART_COOKIE;

pub const SESSION_COOKIE: &str = "sessionid";

pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn cart_cookie(req: &HttpRequest) -> Option<String> {
    req.cookie(CART_COOKIE).map(|c| c.value().to_string())
}

pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age))
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// Only same-site paths are honoured as post-login redirects.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}
