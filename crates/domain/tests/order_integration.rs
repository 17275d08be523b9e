//! Integration tests for the purchase order aggregate.
//!
//! These tests verify the order lifecycle against the in-memory store,
//! including item sequencing, derived totals and status rules.

use chrono::NaiveDate;
use common::{OrderId, OrderStatus};
use domain::{
    CreateOrder, DomainError, OrderError, OrderItemInput, OrderService, ValidationError,
};
use rust_decimal_macros::dec;
use store::InMemoryStore;

/// Helper to create a test order service
fn create_service() -> OrderService<InMemoryStore> {
    OrderService::new(InMemoryStore::new())
}

fn order_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

fn create_cmd() -> CreateOrder {
    CreateOrder::new("Secretaria Municipal de Saúde", "PE 12/2024", order_date())
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_order_lifecycle() {
        let service = create_service();

        let order = service.create_order(create_cmd()).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Open);
        assert_eq!(order.item_count(), 0);

        service
            .add_item(
                order.id(),
                OrderItemInput::new("Luva de procedimento", "CX", dec!(10), dec!(23.90)),
            )
            .await
            .unwrap();
        let order = service
            .add_item(
                order.id(),
                OrderItemInput::new("Seringa 10ml", "UN", dec!(200), dec!(0.45)),
            )
            .await
            .unwrap();

        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total(), dec!(329.00));

        let order = service
            .change_status(order.id(), OrderStatus::Fulfilled)
            .await
            .unwrap();
        assert_eq!(order.status(), OrderStatus::Fulfilled);

        let loaded = service.get_order(order.id()).await.unwrap();
        assert_eq!(loaded.status(), OrderStatus::Fulfilled);
        assert_eq!(loaded.total(), dec!(329.00));
    }

    #[tokio::test]
    async fn order_created_with_explicit_status() {
        let service = create_service();
        let mut cmd = create_cmd();
        cmd.status = Some(OrderStatus::Cancelled);
        cmd.commitment_number = Some(" 2024NE000123 ".to_string());

        let order = service.create_order(cmd).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(
            order.row().commitment_number.as_deref(),
            Some("2024NE000123")
        );
    }
}

mod items {
    use super::*;

    #[tokio::test]
    async fn explicit_sequence_is_kept() {
        let service = create_service();
        let order = service.create_order(create_cmd()).await.unwrap();

        let mut item = OrderItemInput::new("Álcool 70%", "L", dec!(5), dec!(8.00));
        item.sequence = Some(7);
        service.add_item(order.id(), item).await.unwrap();

        let order = service
            .add_item(order.id(), OrderItemInput::new("Gaze", "PCT", dec!(1), dec!(3.10)))
            .await
            .unwrap();

        let sequences: Vec<_> = order.items().iter().map(|i| i.sequence).collect();
        assert_eq!(sequences, vec![7, 8]);
    }

    #[tokio::test]
    async fn duplicate_sequence_is_rejected() {
        let service = create_service();
        let order = service.create_order(create_cmd()).await.unwrap();
        service
            .add_item(order.id(), OrderItemInput::new("Gaze", "PCT", dec!(1), dec!(3.10)))
            .await
            .unwrap();

        let mut item = OrderItemInput::new("Atadura", "UN", dec!(1), dec!(1.00));
        item.sequence = Some(1);
        let err = service.add_item(order.id(), item).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::DuplicateItemSequence(1))
        ));
        assert_eq!(service.get_order(order.id()).await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn closed_order_rejects_items() {
        let service = create_service();
        let order = service.create_order(create_cmd()).await.unwrap();
        service
            .change_status(order.id(), OrderStatus::Cancelled)
            .await
            .unwrap();

        let err = service
            .add_item(order.id(), OrderItemInput::new("Gaze", "PCT", dec!(1), dec!(3.10)))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Order(OrderError::Closed { .. })));
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn terminal_status_cannot_change() {
        let service = create_service();
        let order = service.create_order(create_cmd()).await.unwrap();
        service
            .change_status(order.id(), OrderStatus::Fulfilled)
            .await
            .unwrap();

        let err = service
            .change_status(order.id(), OrderStatus::Open)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Order(OrderError::InvalidStateTransition {
                current_state: OrderStatus::Fulfilled,
                target: OrderStatus::Open,
            })
        ));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let service = create_service();

        let err = service
            .add_item(
                OrderId::new(99),
                OrderItemInput::new("Gaze", "PCT", dec!(1), dec!(3.10)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { entity: "Order", .. }));
    }

    #[tokio::test]
    async fn invalid_header_is_rejected() {
        let service = create_service();
        let cmd = CreateOrder::new("", "PE 1", order_date());

        let err = service.create_order(cmd).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::Required { .. })
        ));
        assert!(service.list_orders().await.unwrap().is_empty());
    }
}
