use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::account::{NewUser, Session, User};
use super::catalog::Product;
use super::errors::DomainError;
use super::order::{
    Customer, NewShippingAddress, Order, OrderItem, OrderLine, OrderWithLines, ShippingAddress,
};

pub trait CatalogRepository: Send + Sync + 'static {
    fn list_products(&self) -> Result<Vec<Product>, DomainError>;
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Unknown ids are simply absent from the result.
    fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
}

pub trait CustomerRepository: Send + Sync + 'static {
    fn get_or_create_customer(&self, user: &User) -> Result<Customer, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// The customer's single incomplete order, created on first use.
    fn get_or_create_open_order(&self, customer_id: Uuid) -> Result<Order, DomainError>;
    fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, DomainError>;
    /// New items start at quantity 0.
    fn get_or_create_item(&self, order_id: Uuid, product_id: Uuid)
        -> Result<OrderItem, DomainError>;
    fn set_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), DomainError>;
    fn delete_item(&self, item_id: Uuid) -> Result<(), DomainError>;
    fn clear_items(&self, order_id: Uuid) -> Result<usize, DomainError>;
    /// Stores the order's completion state and its shipping address as one
    /// unit: either both are written or neither is.
    fn record_checkout(
        &self,
        order: &Order,
        shipping: Option<NewShippingAddress>,
    ) -> Result<Option<ShippingAddress>, DomainError>;
    /// Newest first, with lines.
    fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<OrderWithLines>, DomainError>;
}

pub trait AccountRepository: Send + Sync + 'static {
    fn username_taken(&self, username: &str) -> Result<bool, DomainError>;
    fn email_taken(&self, email: &str) -> Result<bool, DomainError>;
    /// Fails with `DomainError::Conflict` when username or email is taken.
    fn create_user(&self, user: NewUser) -> Result<User, DomainError>;
    /// The user together with their stored password hash.
    fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>, DomainError>;
    fn create_session(&self, session: &Session) -> Result<(), DomainError>;
    fn find_session(&self, token: &str) -> Result<Option<(Session, User)>, DomainError>;
    fn delete_session(&self, token: &str) -> Result<(), DomainError>;
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}

/// Everything the storefront needs from persistence.
pub trait StoreRepository:
    CatalogRepository + CustomerRepository + OrderRepository + AccountRepository
{
}

impl<T> StoreRepository for T where
    T: CatalogRepository + CustomerRepository + OrderRepository + AccountRepository
{
}
