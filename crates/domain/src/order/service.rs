//! Order service providing the purchase order operations.

use common::{OrderId, OrderStatus};
use store::{OrderRow, Store, UnitOfWork};

use crate::error::DomainError;

use super::{CreateOrder, Order, OrderError, OrderItemInput};

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}

async fn load<T: UnitOfWork>(tx: &mut T, order_id: OrderId) -> Result<Order, DomainError> {
    let row = tx
        .get_order(order_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Order", order_id))?;
    let items = tx.list_order_items(order_id).await?;
    Ok(Order::from_parts(row, items))
}

/// Service for managing purchase orders.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a purchase order.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        let new = cmd.validate()?;
        let mut tx = self.store.begin().await?;
        let row = tx.insert_order(new).await?;
        tx.commit().await?;

        tracing::info!(order_id = %row.id, tender = %row.tender_number, "Order created");
        metrics::counter!("orders_created_total").increment(1);
        Ok(Order::from_parts(row, Vec::new()))
    }

    /// Adds an item to an open order.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        item: OrderItemInput,
    ) -> Result<Order, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut order = load(&mut tx, order_id).await?;

        let new = order.prepare_item(&item)?;
        let row = tx.insert_order_item(new).await?;
        order.push_item(row);

        tx.commit().await?;
        Ok(order)
    }

    /// Moves an order to a new status.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut tx = self.store.begin().await?;
        let mut order = load(&mut tx, order_id).await?;

        order.change_status(status)?;
        tx.update_order(order.row()).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, status = %status, "Order status changed");
        Ok(order)
    }

    /// Loads an order with its items and derived total.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let mut tx = self.store.begin().await?;
        load(&mut tx, order_id).await
    }

    /// Lists order headers by order date.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderRow>, DomainError> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_orders().await?)
    }
}
