use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::account::User;
use crate::domain::catalog::Product;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Customer, NewShippingAddress, Order, OrderItem, OrderLine, OrderWithLines, ShippingAddress,
};
use crate::domain::ports::{CustomerRepository, OrderRepository};
use crate::schema::{customers, order_items, orders, products, shipping_addresses};

use super::models::{
    CustomerRow, NewOrderItemRow, NewOrderRow, NewShippingAddressRow, OrderItemRow, OrderRow,
    ProductRow, ShippingAddressRow,
};
use super::DieselStore;

fn to_line((item, product): (OrderItemRow, ProductRow)) -> OrderLine {
    OrderLine {
        item_id: item.id,
        product: Product::from(product),
        quantity: item.quantity,
    }
}

fn find_open_order(conn: &mut PgConnection, customer_id: Uuid) -> QueryResult<Option<OrderRow>> {
    orders::table
        .filter(orders::customer_id.eq(customer_id))
        .filter(orders::complete.eq(false))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()
}

impl CustomerRepository for DieselStore {
    fn get_or_create_customer(&self, user: &User) -> Result<Customer, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let inserted = diesel::insert_into(customers::table)
                .values(&CustomerRow {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    name: user.username.clone(),
                    email: user.email.clone(),
                })
                .on_conflict(customers::user_id)
                .do_nothing()
                .execute(conn)?;
            if inserted > 0 {
                log::info!("Created Customer for user {}", user.username);
            }

            let row = customers::table
                .filter(customers::user_id.eq(user.id))
                .select(CustomerRow::as_select())
                .first(conn)?;
            Ok(Customer::from(row))
        })
    }
}

impl OrderRepository for DieselStore {
    fn get_or_create_open_order(&self, customer_id: Uuid) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            if let Some(row) = find_open_order(conn, customer_id)? {
                return Ok(Order::from(row));
            }

            // The partial unique index turns a concurrent insert into a no-op.
            diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: Uuid::new_v4(),
                    customer_id,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;

            find_open_order(conn, customer_id)?
                .map(Order::from)
                .ok_or_else(|| DomainError::Internal("open order vanished after insert".into()))
        })
    }

    fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_items::table
            .inner_join(products::table)
            .filter(order_items::order_id.eq(order_id))
            .select((OrderItemRow::as_select(), ProductRow::as_select()))
            .order(order_items::date_added.asc())
            .load::<(OrderItemRow, ProductRow)>(&mut conn)?;

        Ok(rows.into_iter().map(to_line).collect())
    }

    fn get_or_create_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
    ) -> Result<OrderItem, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(order_items::table)
                .values(&NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id,
                    quantity: 0,
                })
                .on_conflict((order_items::order_id, order_items::product_id))
                .do_nothing()
                .execute(conn)?;

            let row = order_items::table
                .filter(order_items::order_id.eq(order_id))
                .filter(order_items::product_id.eq(product_id))
                .select(OrderItemRow::as_select())
                .first(conn)?;
            Ok(OrderItem::from(row))
        })
    }

    fn set_item_quantity(&self, item_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(order_items::table.filter(order_items::id.eq(item_id)))
            .set(order_items::quantity.eq(quantity))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::NotFound("Order item"));
        }
        Ok(())
    }

    fn delete_item(&self, item_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::delete(order_items::table.filter(order_items::id.eq(item_id)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn clear_items(&self, order_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(order_items::table.filter(order_items::order_id.eq(order_id)))
            .execute(&mut conn)?;
        Ok(deleted)
    }

    fn record_checkout(
        &self,
        order: &Order,
        shipping: Option<NewShippingAddress>,
    ) -> Result<Option<ShippingAddress>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let updated = diesel::update(orders::table.filter(orders::id.eq(order.id)))
                .set((
                    orders::complete.eq(order.complete),
                    orders::transaction_id.eq(order.transaction_id.as_deref()),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(DomainError::NotFound("Order"));
            }

            let Some(address) = shipping else {
                return Ok(None);
            };
            let row = diesel::insert_into(shipping_addresses::table)
                .values(&NewShippingAddressRow {
                    id: Uuid::new_v4(),
                    customer_id: address.customer_id,
                    order_id: address.order_id,
                    address: address.info.address,
                    city: address.info.city,
                    state: address.info.state,
                    zipcode: address.info.zipcode,
                })
                .returning(ShippingAddressRow::as_returning())
                .get_result(conn)?;

            Ok(Some(ShippingAddress::from(row)))
        })
    }

    fn orders_for_customer(&self, customer_id: Uuid) -> Result<Vec<OrderWithLines>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_rows: Vec<OrderRow> = orders::table
                .filter(orders::customer_id.eq(customer_id))
                .select(OrderRow::as_select())
                .order(orders::date_ordered.desc())
                .load(conn)?;

            let lines = OrderItemRow::belonging_to(&order_rows)
                .inner_join(products::table)
                .select((OrderItemRow::as_select(), ProductRow::as_select()))
                .order(order_items::date_added.asc())
                .load::<(OrderItemRow, ProductRow)>(conn)?;

            let grouped = lines.grouped_by(&order_rows);
            Ok(order_rows
                .into_iter()
                .zip(grouped)
                .map(|(order, lines)| OrderWithLines {
                    order: Order::from(order),
                    lines: lines.into_iter().map(to_line).collect(),
                })
                .collect())
        })
    }
}
