use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::User;
use crate::domain::cart::{Cart, CookieCart};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    parse_declared_total, transaction_id, CartAction, Checkout, CheckoutOutcome, Customer,
    ItemUpdate, NewShippingAddress, Order, OrderWithLines,
};
use crate::domain::ports::{CatalogRepository, CustomerRepository, OrderRepository};

/// Catalog browsing, cart reconciliation and checkout.
pub struct CartService<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for CartService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> CartService<R>
where
    R: CatalogRepository + CustomerRepository + OrderRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn products(&self) -> Result<Vec<Product>, DomainError> {
        self.repo.list_products()
    }

    pub fn product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.repo
            .find_product(id)?
            .ok_or(DomainError::NotFound("Product"))
    }

    /// The cart for this request: the customer's open order when signed in,
    /// otherwise whatever the `cart` cookie resolves to.
    pub fn cart_data(&self, user: Option<&User>, cart_cookie: Option<&str>) -> Result<Cart, DomainError> {
        match user {
            Some(user) => {
                let (_, order) = self.open_order_for(user)?;
                Ok(Cart::from_order(&order))
            }
            None => self.cookie_cart(cart_cookie),
        }
    }

    fn cookie_cart(&self, cart_cookie: Option<&str>) -> Result<Cart, DomainError> {
        let cookie = CookieCart::parse(cart_cookie);
        if cookie.is_empty() {
            return Ok(Cart::empty());
        }
        let products: HashMap<Uuid, Product> = self
            .repo
            .find_products(&cookie.product_ids())?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok(Cart::from_cookie(&cookie, &products))
    }

    fn customer_for(&self, user: &User) -> Result<Customer, DomainError> {
        self.repo.get_or_create_customer(user)
    }

    fn open_order_for(&self, user: &User) -> Result<(Customer, OrderWithLines), DomainError> {
        let customer = self.customer_for(user)?;
        let order = self.repo.get_or_create_open_order(customer.id)?;
        let lines = self.repo.order_lines(order.id)?;
        Ok((customer, OrderWithLines { order, lines }))
    }

    /// Move one unit of `product_id` into or out of the signed-in customer's
    /// open order. Items that reach zero are deleted.
    pub fn update_item(
        &self,
        user: Option<&User>,
        product_id: Uuid,
        action: CartAction,
    ) -> Result<ItemUpdate, DomainError> {
        let user = user.ok_or(DomainError::Unauthenticated)?;
        let customer = self.customer_for(user)?;
        let product = self.product(product_id)?;
        let order = self.repo.get_or_create_open_order(customer.id)?;
        let item = self.repo.get_or_create_item(order.id, product.id)?;

        let quantity = action.apply(item.quantity);
        log::info!(
            "Cart update - action: {:?}, product: {}, new quantity: {}",
            action,
            product.name,
            quantity
        );

        let update = ItemUpdate::from_quantity(quantity);
        match update {
            ItemUpdate::Quantity(q) => self.repo.set_item_quantity(item.id, q)?,
            ItemUpdate::Removed => {
                self.repo.delete_item(item.id)?;
                log::info!("Item deleted from cart - product: {}", product.name);
            }
        }
        Ok(update)
    }

    /// Complete the open order when the client's declared total matches the
    /// server total exactly. Shipping details are recorded whenever the order
    /// contains a physical product, complete or not.
    pub fn process_order(
        &self,
        user: Option<&User>,
        checkout: Checkout,
    ) -> Result<CheckoutOutcome, DomainError> {
        let Some(user) = user else {
            log::warn!("Unauthenticated user attempted checkout");
            return Ok(CheckoutOutcome::Ignored);
        };

        let (customer, open) = self.open_order_for(user)?;
        let declared = parse_declared_total(&checkout.total)?;
        let shipping = open.shipping();

        let shipping_info = match (shipping, checkout.shipping) {
            (true, Some(info)) => {
                info.validate()?;
                Some(info)
            }
            (true, None) => {
                return Err(DomainError::InvalidInput(
                    "shipping details are required for this order".to_string(),
                ))
            }
            (false, _) => None,
        };

        let complete = declared == open.cart_total();
        let order = Order {
            complete,
            transaction_id: Some(transaction_id(Utc::now())),
            ..open.order.clone()
        };
        let address = shipping_info.map(|info| NewShippingAddress {
            customer_id: customer.id,
            order_id: order.id,
            info,
        });
        self.repo.record_checkout(&order, address)?;

        if complete {
            log::info!("Order {} completed successfully", order.id);
        } else {
            log::warn!(
                "Order {} left open: declared total {} does not match cart total {}",
                order.id,
                declared,
                open.cart_total()
            );
        }

        Ok(CheckoutOutcome::Processed {
            order_id: order.id,
            complete,
        })
    }

    /// Empty the signed-in customer's open order. Returns the number of line
    /// items removed; anonymous carts live in the browser and are untouched.
    pub fn clear_cart(&self, user: Option<&User>) -> Result<usize, DomainError> {
        let Some(user) = user else {
            return Ok(0);
        };
        let customer = self.customer_for(user)?;
        let order = self.repo.get_or_create_open_order(customer.id)?;
        self.repo.clear_items(order.id)
    }
}
