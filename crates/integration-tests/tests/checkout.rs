//! End-to-end checkout tests on both identity paths.
//!
//! Run with: cargo test -p bazaar-integration-tests

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_core::{OrderPaymentStatus, OrderStatus, PaymentMethod, PaymentStatus};
use bazaar_integration_tests::{BarrierCatalog, MemoryCatalog, TestShop, checkout};
use bazaar_storefront::services::{CartService, OrderService, ServiceError};

#[tokio::test]
async fn test_cash_on_delivery_checkout_totals() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "999.00", 5);
    let user = shop.register("alice@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 2)
        .await
        .unwrap();

    let placed = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("COD"))
        .await
        .unwrap();
    let order = &placed.order;

    assert_eq!(order.subtotal.to_string(), "1998.00");
    assert_eq!(order.shipping_cost.to_string(), "0.00");
    assert_eq!(order.tax.to_string(), "359.64");
    assert_eq!(order.total_amount.to_string(), "2357.64");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, OrderPaymentStatus::Pending);
    assert!(order.order_number.starts_with("ORD"));

    let payment = &placed.payment;
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.method, PaymentMethod::Cod);
    assert!(payment.transaction_id.is_none());
    assert_eq!(payment.amount, order.total_amount);
    assert_eq!(order.payment_id.as_ref(), Some(&payment.id));

    assert_eq!(shop.catalog.stock_of(&product), 3);
    assert_eq!(shop.database.order_count(), 1);
    assert_eq!(shop.database.order(&order.id).unwrap(), *order);

    let cart = CartService::new(&shop.storage).get_cart(&user).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_items, 0);
}

#[tokio::test]
async fn test_card_checkout_on_demo_path_confirms_order() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "999.00", 5);
    let user = shop.demo_user().await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 2)
        .await
        .unwrap();

    let placed = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("credit_card"))
        .await
        .unwrap();

    assert_eq!(placed.order.total_amount.to_string(), "2357.64");
    assert_eq!(placed.order.status, OrderStatus::Confirmed);
    assert_eq!(placed.order.payment_status, OrderPaymentStatus::Completed);
    assert!(placed.order.id.as_str().starts_with("demo-order-"));

    let payment = &placed.payment;
    assert!(payment.id.as_str().starts_with("demo-payment-"));
    let txn = payment.transaction_id.as_deref().unwrap();
    assert!(txn.starts_with("TXN"));
    assert_eq!(txn.len(), 15);
    assert_eq!(payment.card_last4.as_deref(), Some("4242"));
    assert_eq!(payment.card_brand.as_deref(), Some("VISA"));

    // demo orders never reach the database, but stock is shared
    assert_eq!(shop.database.order_count(), 0);
    assert_eq!(shop.catalog.stock_of(&product), 3);

    let orders = OrderService::new(&shop.storage, &shop.pricing)
        .list_orders(&user)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, placed.order.id);
}

#[tokio::test]
async fn test_small_order_pays_flat_shipping() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let user = shop.register("bob@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 1)
        .await
        .unwrap();
    let placed = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("UPI"))
        .await
        .unwrap();

    assert_eq!(placed.order.shipping_cost.to_string(), "50.00");
    assert_eq!(placed.order.tax.to_string(), "18.00");
    assert_eq!(placed.order.total_amount.to_string(), "168.00");
    assert!(placed.payment.transaction_id.is_some());
    assert!(placed.payment.card_last4.is_none());
}

#[tokio::test]
async fn test_unknown_payment_method_falls_back_to_cod() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let user = shop.demo_user().await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 1)
        .await
        .unwrap();
    let placed = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("bitcoin"))
        .await
        .unwrap();

    assert_eq!(placed.payment.method, PaymentMethod::Cod);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.payment_status, OrderPaymentStatus::Pending);
}

#[tokio::test]
async fn test_empty_cart_and_incomplete_address_are_rejected() {
    let shop = TestShop::new();
    let user = shop.register("carol@example.com").await;
    let service = OrderService::new(&shop.storage, &shop.pricing);

    let err = service
        .create_order(&user, checkout("COD"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmptyCart));

    let mut request = checkout("COD");
    request.shipping_address.city = "  ".to_owned();
    let err = service.create_order(&user, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("city")));
}

#[tokio::test]
async fn test_stock_is_rechecked_at_checkout() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let user = shop.register("dave@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 3)
        .await
        .unwrap();

    let mut shrunk = shop.catalog.product(&product).unwrap();
    shrunk.stock_quantity = 2;
    shop.catalog.insert(shrunk);

    let err = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("COD"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    assert_eq!(shop.catalog.stock_of(&product), 2);
    assert_eq!(shop.database.order_count(), 0);
}

#[tokio::test]
async fn test_failed_stock_write_releases_earlier_lines() {
    let shop = TestShop::new();
    let first = shop.add_product("p-a", "100.00", 5);
    let second = shop.add_product("p-b", "200.00", 5);
    let user = shop.register("erin@example.com").await;

    let cart = CartService::new(&shop.storage);
    cart.add_item(&user, &first, 2).await.unwrap();
    cart.add_item(&user, &second, 1).await.unwrap();

    shop.catalog.fail_saves_of(&second);

    let err = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("COD"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repository(_)));

    assert_eq!(shop.catalog.stock_of(&first), 5);
    assert_eq!(shop.catalog.stock_of(&second), 5);
    assert_eq!(shop.database.order_count(), 0);
    assert_eq!(cart.get_cart(&user).await.unwrap().items.len(), 2);
}

#[tokio::test]
async fn test_failed_payment_cancels_order_and_restores_stock() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "300.00", 4);
    let user = shop.register("frank@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 2)
        .await
        .unwrap();
    shop.database.fail_payment_saves();

    let err = OrderService::new(&shop.storage, &shop.pricing)
        .create_order(&user, checkout("CREDIT_CARD"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repository(_)));

    assert_eq!(shop.catalog.stock_of(&product), 4);
    let orders = OrderService::new(&shop.storage, &shop.pricing)
        .list_orders(&user)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Cancelled);

    let cart = CartService::new(&shop.storage).get_cart(&user).await.unwrap();
    assert_eq!(cart.total_items, 2);
}

#[tokio::test]
async fn test_cancel_restores_exact_stock() {
    let shop = TestShop::new();
    let first = shop.add_product("p-a", "100.00", 10);
    let second = shop.add_product("p-b", "50.00", 3);
    let user = shop.demo_user().await;

    let cart = CartService::new(&shop.storage);
    cart.add_item(&user, &first, 4).await.unwrap();
    cart.add_item(&user, &second, 3).await.unwrap();

    let orders = OrderService::new(&shop.storage, &shop.pricing);
    let placed = orders.create_order(&user, checkout("COD")).await.unwrap();
    assert_eq!(shop.catalog.stock_of(&first), 6);
    assert_eq!(shop.catalog.stock_of(&second), 0);

    let cancelled = orders.cancel_order(&user, &placed.order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(shop.catalog.stock_of(&first), 10);
    assert_eq!(shop.catalog.stock_of(&second), 3);

    let err = orders
        .cancel_order(&user, &placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(shop.catalog.stock_of(&first), 10);
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let user = shop.register("gina@example.com").await;
    let admin = shop.register_admin("ops@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&user, &product, 1)
        .await
        .unwrap();
    let orders = OrderService::new(&shop.storage, &shop.pricing);
    let placed = orders.create_order(&user, checkout("CARD")).await.unwrap();
    orders
        .update_status(&admin, &placed.order.id, "SHIPPED")
        .await
        .unwrap();

    let err = orders
        .cancel_order(&user, &placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(shop.catalog.stock_of(&product), 4);
}

#[tokio::test]
async fn test_only_the_owner_can_cancel() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let owner = shop.register("hana@example.com").await;
    let other = shop.register("ivan@example.com").await;

    CartService::new(&shop.storage)
        .add_item(&owner, &product, 1)
        .await
        .unwrap();
    let orders = OrderService::new(&shop.storage, &shop.pricing);
    let placed = orders.create_order(&owner, checkout("COD")).await.unwrap();

    let err = orders
        .cancel_order(&other, &placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = orders
        .get_order(&other, &placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

/// Two checkouts of the last unit both pass the stock check before either
/// writes. Both succeed and the unit is sold twice. Stock is only checked,
/// not locked, between the read and the write.
#[tokio::test]
async fn test_concurrent_checkouts_can_oversell_last_unit() {
    let memory = Arc::new(MemoryCatalog::new());
    let barrier = Arc::new(BarrierCatalog::new(Arc::clone(&memory), 2));
    let shop = TestShop::with_catalog(barrier.clone(), memory);
    let product = shop.add_product("p-last", "100.00", 1);

    let first = shop.register("j1@example.com").await;
    let second = shop.register("j2@example.com").await;
    let cart = CartService::new(&shop.storage);
    cart.add_item(&first, &product, 1).await.unwrap();
    cart.add_item(&second, &product, 1).await.unwrap();

    barrier.arm();
    let orders = OrderService::new(&shop.storage, &shop.pricing);
    let (a, b) = tokio::join!(
        orders.create_order(&first, checkout("COD")),
        orders.create_order(&second, checkout("COD")),
    );
    barrier.disarm();

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(shop.database.order_count(), 2);
    assert_eq!(shop.catalog.stock_of(&product), 0);
}
