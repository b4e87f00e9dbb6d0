//! Askama page models. Values are pre-formatted so templates stay logic-free.

use askama::Template;
use bigdecimal::BigDecimal;

use crate::application::account_service::Profile;
use crate::domain::account::{FormErrors, User};
use crate::domain::cart::{Cart, CartLine};
use crate::domain::catalog::Product;
use crate::domain::order::OrderWithLines;

/// Two decimal places, as prices are shown everywhere.
pub fn money(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

/// Header state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub cart_items: i32,
}

impl Nav {
    pub fn new(user: Option<&User>, cart_items: i32) -> Self {
        Self {
            signed_in: user.is_some(),
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            cart_items,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image_url: String,
    pub digital: bool,
}

impl From<&Product> for ProductCard {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            price: money(&p.price),
            image_url: p.image_url().to_string(),
            digital: p.digital,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartRow {
    pub product: ProductCard,
    pub quantity: i32,
    pub total: String,
}

impl From<&CartLine> for CartRow {
    fn from(line: &CartLine) -> Self {
        Self {
            product: ProductCard::from(&line.product),
            quantity: line.quantity,
            total: money(&line.total()),
        }
    }
}

#[derive(Template)]
#[template(path = "store.html")]
pub struct StorePage {
    pub nav: Nav,
    pub products: Vec<ProductCard>,
}

impl StorePage {
    pub fn new(nav: Nav, products: &[Product]) -> Self {
        Self {
            nav,
            products: products.iter().map(ProductCard::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "cart.html")]
pub struct CartPage {
    pub nav: Nav,
    pub items: Vec<CartRow>,
    pub cart_total: String,
    pub cart_items: i32,
}

impl CartPage {
    pub fn new(nav: Nav, cart: &Cart) -> Self {
        Self {
            nav,
            items: cart.items.iter().map(CartRow::from).collect(),
            cart_total: money(&cart.order.cart_total),
            cart_items: cart.cart_items,
        }
    }
}

#[derive(Template)]
#[template(path = "checkout.html")]
pub struct CheckoutPage {
    pub nav: Nav,
    pub items: Vec<CartRow>,
    pub cart_total: String,
    pub cart_items: i32,
    pub shipping: bool,
    pub name: String,
    pub email: String,
}

impl CheckoutPage {
    pub fn new(nav: Nav, user: &User, cart: &Cart) -> Self {
        Self {
            nav,
            items: cart.items.iter().map(CartRow::from).collect(),
            cart_total: money(&cart.order.cart_total),
            cart_items: cart.cart_items,
            shipping: cart.order.shipping,
            name: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "product_detail.html")]
pub struct ProductDetailPage {
    pub nav: Nav,
    pub product: ProductCard,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub nav: Nav,
    pub message: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub errors: Vec<String>,
    pub username_errors: Vec<String>,
    pub email_errors: Vec<String>,
    pub password1_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

impl RegisterPage {
    pub fn new(nav: Nav, username: &str, email: &str, errors: &FormErrors) -> Self {
        Self {
            nav,
            username: username.to_string(),
            email: email.to_string(),
            errors: errors.non_field_errors().to_vec(),
            username_errors: errors.field("username").to_vec(),
            email_errors: errors.field("email").to_vec(),
            password1_errors: errors.field("password1").to_vec(),
            password2_errors: errors.field("password2").to_vec(),
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub nav: Nav,
    pub username: String,
    pub next: String,
    pub errors: Vec<String>,
    pub username_errors: Vec<String>,
    pub password_errors: Vec<String>,
}

impl LoginPage {
    pub fn new(nav: Nav, username: &str, next: Option<&str>, errors: &FormErrors) -> Self {
        Self {
            nav,
            username: username.to_string(),
            next: next.unwrap_or_default().to_string(),
            errors: errors.non_field_errors().to_vec(),
            username_errors: errors.field("username").to_vec(),
            password_errors: errors.field("password").to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub date_ordered: String,
    pub complete: bool,
    pub transaction_id: String,
    pub cart_items: i32,
    pub cart_total: String,
}

impl From<&OrderWithLines> for OrderRow {
    fn from(o: &OrderWithLines) -> Self {
        Self {
            id: o.order.id.to_string(),
            date_ordered: o.order.date_ordered.format("%Y-%m-%d %H:%M").to_string(),
            complete: o.order.complete,
            transaction_id: o.order.transaction_id.clone().unwrap_or_default(),
            cart_items: o.cart_items(),
            cart_total: money(&o.cart_total()),
        }
    }
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub nav: Nav,
    pub name: String,
    pub email: String,
    pub orders: Vec<OrderRow>,
}

impl ProfilePage {
    pub fn new(nav: Nav, profile: &Profile) -> Self {
        Self {
            nav,
            name: profile.customer.name.clone(),
            email: profile.customer.email.clone(),
            orders: profile.orders.iter().map(OrderRow::from).collect(),
        }
    }
}
