//! In-process implementation of the repository ports.
//!
//! Backs the service and HTTP tests so they run without PostgreSQL. It keeps
//! the same uniqueness rules the database schema enforces.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::account::{NewUser, Session, User};
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Customer, NewShippingAddress, Order, OrderItem, OrderLine, OrderWithLines, ShippingAddress,
};
use crate::domain::ports::{
    AccountRepository, CatalogRepository, CustomerRepository, OrderRepository,
};

#[derive(Default)]
struct State {
    products: Vec<Product>,
    users: Vec<(User, String)>,
    sessions: HashMap<String, Session>,
    customers: Vec<Customer>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    addresses: Vec<ShippingAddress>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let store = Self::default();
        store.lock().products = products;
        store
    }

    pub fn remove_product(&self, id: Uuid) {
        let mut state = self.lock();
        state.products.retain(|p| p.id != id);
        state.items.retain(|i| i.product_id != id);
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn order_item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn shipping_addresses(&self) -> Vec<ShippingAddress> {
        self.lock().addresses.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not poison the store for the assertions after it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl State {
    fn lines(&self, order_id: Uuid) -> Vec<OrderLine> {
        self.items
            .iter()
            .filter(|item| item.order_id == order_id)
            .filter_map(|item| {
                let product = self.products.iter().find(|p| p.id == item.product_id)?;
                Some(OrderLine {
                    item_id: item.id,
                    product: product.clone(),
                    quantity: item.quantity,
                })
            })
            .collect()
    }
}

impl CatalogRepository for InMemoryStore {
    fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        let mut products = self.lock().products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

impl CustomerRepository for InMemoryStore {
    fn get_or_create_customer(&self, user: &User) -> Result<Customer, DomainError> {
        let mut state = self.lock();
        if let Some(customer) = state.customers.iter().find(|c| c.user_id == user.id) {
            return Ok(customer.clone());
        }
        let customer = Customer {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: user.username.clone(),
            email: user.email.clone(),
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }
}

impl OrderRepository for InMemoryStore {
    fn get_or_create_open_order(&self, customer_id: Uuid) -> Result<Order, DomainError> {
        let mut state = self.lock();
        if let Some(order) = state
            .orders
            .iter()
            .find(|o| o.customer_id == customer_id && !o.complete)
        {
            return Ok(order.clone());
        }
        let order = Order {
            id: Uuid::new_v4(),
            customer_id,
            date_ordered: Utc::now(),
            complete: false,
            transaction_id: None,
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, DomainError> {
        Ok(self.lock().lines(order_id))
    }

    fn get_or_create_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<OrderItem, DomainError> {
        let mut state = self.lock();
        if let Some(item) = state
            .items
            .iter()
            .find(|i| i.order_id == order_id && i.product_id == product_id)
        {
            return Ok(item.clone());
        }
        let item = OrderItem {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            quantity: 0,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    fn set_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let mut state = self.lock();
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(DomainError::NotFound("Order item"))?;
        item.quantity = quantity;
        Ok(())
    }

    fn delete_item(&self, item_id: Uuid) -> Result<(), DomainError> {
        self.lock().items.retain(|i| i.id != item_id);
        Ok(())
    }

    fn clear_items(&self, order_id: Uuid) -> Result<usize, DomainError> {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|i| i.order_id != order_id);
        Ok(before - state.items.len())
    }

    fn record_checkout(
        &self,
        order: &Order,
        shipping: Option<NewShippingAddress>,
    ) -> Result<Option<ShippingAddress>, DomainError> {
        let mut state = self.lock();
        let stored = state
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or(DomainError::NotFound("Order"))?;
        stored.complete = order.complete;
        stored.transaction_id = order.transaction_id.clone();

        let Some(address) = shipping else {
            return Ok(None);
        };
        let stored = ShippingAddress {
            id: Uuid::new_v4(),
            customer_id: address.customer_id,
            order_id: address.order_id,
            address: address.info.address,
            city: address.info.city,
            state: address.info.state,
            zipcode: address.info.zipcode,
        };
        state.addresses.push(stored.clone());
        Ok(Some(stored))
    }

    fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<OrderWithLines>, DomainError> {
        let state = self.lock();
        let mut orders: Vec<OrderWithLines> = state
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .map(|order| OrderWithLines {
                order: order.clone(),
                lines: state.lines(order.id),
            })
            .collect();
        orders.sort_by(|a, b| b.order.date_ordered.cmp(&a.order.date_ordered));
        Ok(orders)
    }
}

impl AccountRepository for InMemoryStore {
    fn username_taken(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.lock().users.iter().any(|(u, _)| u.username == username))
    }

    fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.lock().users.iter().any(|(u, _)| u.email == email))
    }

    fn create_user(&self, user: NewUser) -> Result<User, DomainError> {
        let mut state = self.lock();
        if state
            .users
            .iter()
            .any(|(u, _)| u.username == user.username || u.email == user.email)
        {
            return Err(DomainError::Conflict(format!(
                "user '{}' already exists",
                user.username
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>, DomainError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(u, _)| u.username == username)
            .cloned())
    }

    fn create_session(&self, session: &Session) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state.sessions.contains_key(&session.token) {
            return Err(DomainError::Conflict("session token reused".to_string()));
        }
        state
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, DomainError> {
        let state = self.lock();
        let Some(session) = state.sessions.get(token) else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == session.user_id)
            .map(|(u, _)| (session.clone(), u.clone())))
    }

    fn delete_session(&self, token: &str) -> Result<(), DomainError> {
        self.lock().sessions.remove(token);
        Ok(())
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired(now));
        Ok(before - state.sessions.len())
    }
}
