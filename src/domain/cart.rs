use std::collections::{BTreeMap, HashMap};

use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::catalog::Product;
use super::order::OrderWithLines;

/// Name of the client-maintained cart cookie.
pub const CART_COOKIE: &str = "cart";

#[derive(Debug, Error)]
pub enum CookieEntryError {
    #[error("'{0}' is not a product id")]
    InvalidProductId(String),
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i32),
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    quantity: i32,
    #[serde(default)]
    checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieCartEntry {
    pub product_id: Uuid,
    pub quantity: i32,
    pub checked: bool,
}

/// The anonymous cart as sent by the browser: product-id string mapped to
/// `{quantity, checked}`. Nothing here is trusted.
#[derive(Debug, Clone, Default)]
pub struct CookieCart {
    raw: BTreeMap<String, Value>,
}

impl CookieCart {
    /// A missing or undecodable cookie is an empty cart.
    pub fn parse(cookie: Option<&str>) -> Self {
        let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) else {
            return Self::default();
        };
        match serde_json::from_str::<BTreeMap<String, Value>>(cookie) {
            Ok(raw) => Self { raw },
            Err(e) => {
                log::warn!("Ignoring undecodable cart cookie: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Result<CookieCartEntry, CookieEntryError>)> {
        self.raw
            .iter()
            .map(|(key, value)| (key.as_str(), Self::decode(key, value)))
    }

    /// Ids of every entry that decodes; used to batch the product lookup.
    pub fn product_ids(&self) -> Vec<Uuid> {
        self.entries()
            .filter_map(|(_, entry)| entry.ok().map(|e| e.product_id))
            .collect()
    }

    fn decode(key: &str, value: &Value) -> Result<CookieCartEntry, CookieEntryError> {
        let product_id = Uuid::parse_str(key.trim())
            .map_err(|_| CookieEntryError::InvalidProductId(key.to_string()))?;
        let raw = RawEntry::deserialize(value)?;
        if raw.quantity <= 0 {
            return Err(CookieEntryError::NonPositiveQuantity(raw.quantity));
        }
        Ok(CookieCartEntry {
            product_id,
            quantity: raw.quantity,
            checked: raw.checked,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
    pub checked: bool,
}

impl CartLine {
    pub fn total(&self) -> BigDecimal {
        &self.product.price * &BigDecimal::from(self.quantity)
    }
}

/// Order-shaped totals shared by cookie carts and database carts.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSummary {
    /// `None` for anonymous carts, which have no order row.
    pub order_id: Option<Uuid>,
    pub cart_total: BigDecimal,
    pub cart_items: i32,
    pub shipping: bool,
}

impl CartSummary {
    pub fn empty() -> Self {
        Self {
            order_id: None,
            cart_total: BigDecimal::zero(),
            cart_items: 0,
            shipping: false,
        }
    }
}

/// The uniform cart view handed to pages and checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub cart_items: i32,
    pub order: CartSummary,
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn empty() -> Self {
        Self {
            cart_items: 0,
            order: CartSummary::empty(),
            items: Vec::new(),
        }
    }

    fn from_lines(order_id: Option<Uuid>, mut items: Vec<CartLine>) -> Self {
        items.sort_by(|a, b| a.product.name.cmp(&b.product.name));

        let mut order = CartSummary {
            order_id,
            ..CartSummary::empty()
        };
        for item in &items {
            order.cart_total += item.total();
            order.cart_items = order.cart_items.saturating_add(item.quantity);
            order.shipping |= item.product.requires_shipping();
        }

        Self {
            cart_items: order.cart_items,
            order,
            items,
        }
    }

    pub fn from_order(order: &OrderWithLines) -> Self {
        let items = order
            .lines
            .iter()
            .map(|line| CartLine {
                product: line.product.clone(),
                quantity: line.quantity,
                checked: true,
            })
            .collect();
        Self::from_lines(Some(order.order.id), items)
    }

    /// Resolve a cookie cart against known products. Entries that fail to
    /// decode or whose product no longer exists are dropped and logged.
    pub fn from_cookie(cookie: &CookieCart, products: &HashMap<Uuid, Product>) -> Self {
        let mut items = Vec::new();
        let mut count: i32 = 0;
        for (key, entry) in cookie.entries() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping cart cookie entry '{}': {}", key, e);
                    continue;
                }
            };
            let Some(product) = products.get(&entry.product_id) else {
                log::warn!("Skipping cart cookie entry '{}': product not found", key);
                continue;
            };
            let Some(next) = count.checked_add(entry.quantity) else {
                log::warn!("Skipping cart cookie entry '{}': item count overflow", key);
                continue;
            };
            count = next;
            items.push(CartLine {
                product: product.clone(),
                quantity: entry.quantity,
                checked: entry.checked,
            });
        }
        Self::from_lines(None, items)
    }
}
