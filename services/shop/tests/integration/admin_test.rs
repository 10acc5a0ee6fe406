use bazaar_auth_types::identity::Identity;
use bazaar_domain::order::{AdminActions, AdminDecision, FulfilmentStep, OrderStatus};
use bazaar_domain::payment::{PaymentMethod, PaymentStatus};
use bazaar_shop::domain::repository::CartRepository;
use bazaar_shop::domain::types::{NewOrder, OrderSource, User};
use bazaar_shop::error::ShopServiceError;
use bazaar_shop::usecase::admin::{
    AdminOrderDetailUseCase, AdvanceOrderUseCase, DecideOrderInput, DecideOrderUseCase,
    ListOrdersByStatusUseCase, ListPendingOrdersUseCase,
};
use bazaar_shop::usecase::order::CreateOrderUseCase;

use crate::helpers::{MockMailer, MockStore, admin_user, test_address, test_product, test_user};

fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    }
}

struct Fixture {
    store: MockStore,
    admin: Identity,
    buyer: Identity,
    order_number: String,
}

async fn fixture() -> Fixture {
    let admin = admin_user("root@example.com");
    let buyer = test_user("ana@example.com");
    let address = test_address(buyer.id);
    let mug = test_product("Mug", 250, 5);
    let store = MockStore::new()
        .with_user(admin.clone())
        .with_user(buyer.clone())
        .with_address(address.clone())
        .with_product(mug.clone());
    store.add_item(buyer.id, mug.id, 1).await.unwrap();

    let detail = CreateOrderUseCase {
        addresses: store.clone(),
        products: store.clone(),
        orders: store.clone(),
        users: store.clone(),
        mailer: MockMailer::new(),
    }
    .execute(NewOrder {
        user_id: buyer.id,
        address_id: address.id,
        method: PaymentMethod::BankTransfer,
        source: OrderSource::Cart,
    })
    .await
    .unwrap();

    Fixture {
        store,
        admin: identity_of(&admin),
        buyer: identity_of(&buyer),
        order_number: detail.order.order_number,
    }
}

fn decide_uc(
    store: &MockStore,
    mailer: &MockMailer,
) -> DecideOrderUseCase<MockStore, MockMailer> {
    DecideOrderUseCase {
        orders: store.clone(),
        mailer: mailer.clone(),
    }
}

fn decision(order_number: &str, decision: AdminDecision) -> DecideOrderInput {
    DecideOrderInput {
        order_number: order_number.to_string(),
        decision,
        admin_notes: Some("UTR matched bank statement".to_string()),
    }
}

// ── DecideOrder ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_confirm_order_and_verify_payment() {
    let fx = fixture().await;
    let mailer = MockMailer::new();

    let detail = decide_uc(&fx.store, &mailer)
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Confirmed))
        .await
        .unwrap();

    assert_eq!(detail.order.status, OrderStatus::Confirmed);
    assert_eq!(detail.payment.status, PaymentStatus::Verified);
    assert_eq!(
        detail.payment.admin_notes.as_deref(),
        Some("UTR matched bank statement")
    );

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["ana@example.com".to_string()]);
    assert!(sent[0].subject.contains(&fx.order_number));
}

#[tokio::test]
async fn should_cancel_order_and_fail_payment() {
    let fx = fixture().await;

    let detail = decide_uc(&fx.store, &MockMailer::new())
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Cancelled))
        .await
        .unwrap();

    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert_eq!(detail.payment.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn should_reject_second_decision() {
    let fx = fixture().await;
    let uc = decide_uc(&fx.store, &MockMailer::new());
    uc.execute(&fx.admin, decision(&fx.order_number, AdminDecision::Confirmed))
        .await
        .unwrap();

    let result = uc
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Cancelled))
        .await;

    assert!(
        matches!(result, Err(ShopServiceError::InvalidState(_))),
        "expected InvalidState, got {result:?}"
    );
}

#[tokio::test]
async fn should_forbid_decision_by_customer() {
    let fx = fixture().await;

    let result = decide_uc(&fx.store, &MockMailer::new())
        .execute(&fx.buyer, decision(&fx.order_number, AdminDecision::Confirmed))
        .await;

    assert!(
        matches!(result, Err(ShopServiceError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}

#[tokio::test]
async fn should_report_unknown_order() {
    let fx = fixture().await;

    let result = decide_uc(&fx.store, &MockMailer::new())
        .execute(&fx.admin, decision("ORD000000000000", AdminDecision::Confirmed))
        .await;

    assert!(
        matches!(result, Err(ShopServiceError::OrderNotFound)),
        "expected OrderNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_keep_decision_when_purchaser_email_fails() {
    let fx = fixture().await;

    let detail = decide_uc(&fx.store, &MockMailer::failing())
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Confirmed))
        .await
        .unwrap();

    assert_eq!(detail.order.status, OrderStatus::Confirmed);
}

// ── AdvanceOrder ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_ship_deliver_and_refund_confirmed_order() {
    let fx = fixture().await;
    decide_uc(&fx.store, &MockMailer::new())
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Confirmed))
        .await
        .unwrap();
    let uc = AdvanceOrderUseCase {
        orders: fx.store.clone(),
    };

    let shipped = uc
        .execute(&fx.admin, &fx.order_number, FulfilmentStep::Shipped)
        .await
        .unwrap();
    assert_eq!(shipped.order.status, OrderStatus::Shipped);
    assert_eq!(shipped.payment.status, PaymentStatus::Verified);

    let refunded = uc
        .execute(&fx.admin, &fx.order_number, FulfilmentStep::Refunded)
        .await
        .unwrap();
    assert_eq!(refunded.order.status, OrderStatus::Refunded);
    assert_eq!(refunded.payment.status, PaymentStatus::Refunded);

    let result = uc
        .execute(&fx.admin, &fx.order_number, FulfilmentStep::Delivered)
        .await;
    assert!(
        matches!(result, Err(ShopServiceError::InvalidState(_))),
        "expected InvalidState, got {result:?}"
    );
}

#[tokio::test]
async fn should_not_ship_unverified_order() {
    let fx = fixture().await;

    let result = AdvanceOrderUseCase {
        orders: fx.store.clone(),
    }
    .execute(&fx.admin, &fx.order_number, FulfilmentStep::Shipped)
    .await;

    assert!(
        matches!(result, Err(ShopServiceError::InvalidState(_))),
        "expected InvalidState, got {result:?}"
    );
}

// ── Admin reads ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_orders_by_status() {
    let fx = fixture().await;
    let uc = ListOrdersByStatusUseCase {
        orders: fx.store.clone(),
    };

    let pending = uc
        .execute(&fx.admin, OrderStatus::PendingVerification)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].customer_email, "ana@example.com");

    let shipped = uc.execute(&fx.admin, OrderStatus::Shipped).await.unwrap();
    assert!(shipped.is_empty());

    let result = uc.execute(&fx.buyer, OrderStatus::Shipped).await;
    assert!(
        matches!(result, Err(ShopServiceError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}

#[tokio::test]
async fn should_drop_decided_orders_from_pending_queue() {
    let fx = fixture().await;
    let pending = ListPendingOrdersUseCase {
        orders: fx.store.clone(),
    };
    assert_eq!(pending.execute(&fx.admin).await.unwrap().len(), 1);

    decide_uc(&fx.store, &MockMailer::new())
        .execute(&fx.admin, decision(&fx.order_number, AdminDecision::Cancelled))
        .await
        .unwrap();

    assert!(pending.execute(&fx.admin).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_show_admin_actions_for_status() {
    let fx = fixture().await;
    let uc = AdminOrderDetailUseCase {
        orders: fx.store.clone(),
    };

    let detail = uc.execute(&fx.admin, &fx.order_number).await.unwrap();
    assert_eq!(detail.customer.email, "ana@example.com");
    let actions = AdminActions::from(detail.order.status);
    assert!(actions.can_approve && actions.can_cancel);
    assert!(!actions.can_update);

    let result = uc.execute(&fx.buyer, &fx.order_number).await;
    assert!(
        matches!(result, Err(ShopServiceError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}
