//! Admin account management: listing, enabling and disabling, roles.

#![allow(clippy::unwrap_used)]

use bazaar_core::{Role, UserId};
use bazaar_integration_tests::TestShop;
use bazaar_storefront::services::{OrderService, ServiceError, UserService};
use bazaar_storefront::store::PageRequest;

#[tokio::test]
async fn test_disabled_accounts_are_locked_out_until_reenabled() {
    let shop = TestShop::new();
    let admin = shop.register_admin("ops@example.com").await;
    let shopper = shop.register("ravi@example.com").await;
    let users = UserService::new(&shop.storage);

    let disabled = users.set_active(&admin, &shopper.id, false).await.unwrap();
    assert!(!disabled.active);
    let err = users.current_user("ravi@example.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    users.set_active(&admin, &shopper.id, true).await.unwrap();
    let back = users.current_user("ravi@example.com").await.unwrap();
    assert!(back.active);
}

#[tokio::test]
async fn test_admins_cannot_disable_or_demote_themselves() {
    let shop = TestShop::new();
    let admin = shop.register_admin("ops@example.com").await;
    let users = UserService::new(&shop.storage);

    let err = users.set_active(&admin, &admin.id, false).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    let err = users.set_role(&admin, &admin.id, "USER").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));

    let still = users.get_user(&admin, &admin.id).await.unwrap();
    assert!(still.active);
    assert!(still.is_admin());
}

#[tokio::test]
async fn test_role_changes_keep_user_role() {
    let shop = TestShop::new();
    let admin = shop.register_admin("ops@example.com").await;
    let shopper = shop.register("sita@example.com").await;
    let users = UserService::new(&shop.storage);

    let promoted = users.set_role(&admin, &shopper.id, "admin").await.unwrap();
    assert!(promoted.roles.contains(&Role::Admin));
    assert!(promoted.roles.contains(&Role::User));

    // the promoted account now passes admin checks
    OrderService::new(&shop.storage, &shop.pricing)
        .list_all_orders(&promoted, PageRequest::default())
        .await
        .unwrap();

    let demoted = users.set_role(&admin, &shopper.id, "USER").await.unwrap();
    assert_eq!(demoted.roles.len(), 1);
    assert!(!demoted.is_admin());

    let err = users
        .set_role(&admin, &shopper.id, "SUPERUSER")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_account_management_requires_admin() {
    let shop = TestShop::new();
    let shopper = shop.register("tom@example.com").await;
    let other = shop.register("uri@example.com").await;
    let users = UserService::new(&shop.storage);

    let err = users
        .list_users(&shopper, PageRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = users.set_active(&shopper, &other.id, false).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = users.set_role(&shopper, &shopper.id, "ADMIN").await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_listing_covers_registered_accounts_only() {
    let shop = TestShop::new();
    let admin = shop.register_admin("ops@example.com").await;
    for i in 0..4 {
        shop.register(&format!("buyer{i}@example.com")).await;
    }
    let demo = shop.demo_user().await;
    let users = UserService::new(&shop.storage);

    let first = users.list_users(&admin, PageRequest::new(0, 3)).await.unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.items.len(), 3);
    let second = users.list_users(&admin, PageRequest::new(1, 3)).await.unwrap();
    assert_eq!(second.items.len(), 2);
    assert!(
        first
            .items
            .iter()
            .chain(&second.items)
            .all(|user| user.id != demo.id)
    );

    let err = users.get_user(&admin, &demo.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
    let err = users
        .set_active(&admin, &UserId::new("missing"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}
