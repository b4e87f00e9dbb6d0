use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::Product;
use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub date_ordered: DateTime<Utc>,
    pub complete: bool,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// An order item joined with its product.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub item_id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

impl OrderLine {
    pub fn total(&self) -> BigDecimal {
        &self.product.price * &BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderWithLines {
    pub fn cart_total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |acc, line| acc + line.total())
    }

    pub fn cart_items(&self) -> i32 {
        self.lines
            .iter()
            .fold(0i32, |acc, line| acc.saturating_add(line.quantity))
    }

    pub fn shipping(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.product.requires_shipping())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Remove,
}

impl CartAction {
    /// Quantity after applying this action once.
    pub fn apply(self, quantity: i32) -> i32 {
        match self {
            CartAction::Add => quantity.saturating_add(1),
            CartAction::Remove => quantity.saturating_sub(1),
        }
    }
}

/// Outcome of a single `add` / `remove` against the open order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUpdate {
    Quantity(i32),
    Removed,
}

impl ItemUpdate {
    pub fn from_quantity(quantity: i32) -> Self {
        if quantity <= 0 {
            ItemUpdate::Removed
        } else {
            ItemUpdate::Quantity(quantity)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

/// Column width of every shipping address field.
pub const SHIPPING_FIELD_MAX_CHARS: usize = 200;

impl ShippingInfo {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipcode", &self.zipcode),
        ];
        for (name, value) in fields {
            if value.chars().count() > SHIPPING_FIELD_MAX_CHARS {
                return Err(DomainError::InvalidInput(format!(
                    "{name} must be at most {SHIPPING_FIELD_MAX_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewShippingAddress {
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub info: ShippingInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingAddress {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
}

/// Checkout data as declared by the client.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub total: Value,
    pub shipping: Option<ShippingInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Anonymous visitors get the confirmation without any write.
    Ignored,
    Processed { order_id: Uuid, complete: bool },
}

/// Accepts the client's total as either a JSON number or a numeric string.
pub fn parse_declared_total(total: &Value) -> Result<BigDecimal, DomainError> {
    let raw = match total {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(DomainError::InvalidInput(format!(
                "total must be a number, got {other}"
            )))
        }
    };
    BigDecimal::from_str(&raw)
        .map_err(|e| DomainError::InvalidInput(format!("Invalid total '{raw}': {e}")))
}

/// Transaction identifiers are the completion time as fractional UNIX seconds.
pub fn transaction_id(now: DateTime<Utc>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::domain::cart::Cart;

    fn line(price: &str, quantity: i32, digital: bool) -> OrderLine {
        OrderLine {
            item_id: Uuid::new_v4(),
            product: Product {
                id: Uuid::new_v4(),
                name: "Item".to_string(),
                price: BigDecimal::from_str(price).expect("valid decimal"),
                digital,
                image: None,
            },
            quantity,
        }
    }

    fn order_with(lines: Vec<OrderLine>) -> OrderWithLines {
        OrderWithLines {
            order: Order {
                id: Uuid::new_v4(),
                customer_id: Uuid::new_v4(),
                date_ordered: Utc::now(),
                complete: false,
                transaction_id: None,
            },
            lines,
        }
    }

    #[test]
    fn totals_sum_over_lines() {
        let order = order_with(vec![line("9.99", 2, true), line("0.50", 3, true)]);

        assert_eq!(order.cart_items(), 5);
        assert_eq!(
            order.cart_total(),
            BigDecimal::from_str("21.48").expect("valid decimal")
        );
        assert!(!order.shipping());
    }

    #[test]
    fn empty_order_has_zero_totals() {
        let order = order_with(vec![]);
        assert_eq!(order.cart_items(), 0);
        assert!(order.cart_total().is_zero());
        assert!(!order.shipping());
    }

    #[test]
    fn item_count_saturates_instead_of_overflowing() {
        let order = order_with(vec![line("1.00", i32::MAX, true), line("1.00", 5, true)]);
        assert_eq!(order.cart_items(), i32::MAX);
        assert_eq!(Cart::from_order(&order).cart_items, i32::MAX);
    }

    #[test]
    fn any_physical_line_requires_shipping() {
        let order = order_with(vec![line("1.00", 1, true), line("2.00", 1, false)]);
        assert!(order.shipping());
    }

    #[test]
    fn actions_move_quantity_by_one() {
        assert_eq!(CartAction::Add.apply(0), 1);
        assert_eq!(CartAction::Add.apply(1), 2);
        assert_eq!(CartAction::Remove.apply(1), 0);
        assert_eq!(CartAction::Remove.apply(0), -1);
    }

    #[test]
    fn non_positive_quantity_means_removed() {
        assert_eq!(ItemUpdate::from_quantity(2), ItemUpdate::Quantity(2));
        assert_eq!(ItemUpdate::from_quantity(0), ItemUpdate::Removed);
        assert_eq!(ItemUpdate::from_quantity(-1), ItemUpdate::Removed);
    }

    #[test]
    fn shipping_fields_must_fit_their_columns() {
        let mut info = ShippingInfo {
            address: "a".repeat(SHIPPING_FIELD_MAX_CHARS),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
        };
        assert!(info.validate().is_ok());

        info.zipcode = "9".repeat(SHIPPING_FIELD_MAX_CHARS + 1);
        assert!(matches!(
            info.validate(),
            Err(DomainError::InvalidInput(ref m)) if m.starts_with("zipcode")
        ));
    }

    #[test]
    fn action_deserializes_lowercase_only() {
        let add: CartAction = serde_json::from_value(json!("add")).expect("add parses");
        assert_eq!(add, CartAction::Add);
        assert!(serde_json::from_value::<CartAction>(json!("delete")).is_err());
    }

    #[test]
    fn declared_total_accepts_numbers_and_strings() {
        let expected = BigDecimal::from_str("12.5").expect("valid decimal");
        assert_eq!(parse_declared_total(&json!(12.5)).expect("number"), expected);
        assert_eq!(parse_declared_total(&json!("12.50")).expect("string"), expected);
        assert!(parse_declared_total(&json!("twelve")).is_err());
        assert!(parse_declared_total(&json!(null)).is_err());
    }

    #[test]
    fn transaction_id_is_fractional_unix_seconds() {
        let now = Utc
            .timestamp_opt(1_700_000_000, 123_456_000)
            .single()
            .expect("valid timestamp");
        assert_eq!(transaction_id(now), "1700000000.123456");
    }
}
