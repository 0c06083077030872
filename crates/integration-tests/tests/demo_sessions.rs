//! Demo identity isolation, user resolution, carts and wishlists.

#![allow(clippy::unwrap_used)]

use bazaar_core::{IdentityKind, ProductId};
use bazaar_integration_tests::TestShop;
use bazaar_storefront::models::{Cart, Product};
use bazaar_storefront::services::{
    CartService, ProfileUpdate, ServiceError, UserService, WishlistService,
};
use bazaar_storefront::store::PersistedStore;
use chrono::Utc;
use proptest::prelude::*;

#[tokio::test]
async fn test_demo_email_resolves_to_stable_session() {
    let shop = TestShop::new();
    let users = UserService::new(&shop.storage);

    let first = users.current_user("demo+abc@bazaar.local").await.unwrap();
    let again = users.current_user("demo+abc@bazaar.local").await.unwrap();
    assert_eq!(first.id.as_str(), "demo-abc");
    assert_eq!(first.id, again.id);
    assert_eq!(first.display_name(), "Demo User");

    let legacy = users.current_user("Demo@Bazaar.Local").await.unwrap();
    assert_eq!(legacy.id.as_str(), "demo-legacy");
    assert_eq!(shop.storage.demo_sessions().session_count().await, 2);
}

#[tokio::test]
async fn test_demo_lookalike_with_unsafe_token_is_rejected_as_input() {
    let shop = TestShop::new();
    let users = UserService::new(&shop.storage);

    let err = users.current_user("demo+a b@bazaar.local").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(shop.storage.demo_sessions().session_count().await, 0);
}

#[tokio::test]
async fn test_persisted_email_lookup() {
    let shop = TestShop::new();
    let users = UserService::new(&shop.storage);
    let alice = shop.register("alice@example.com").await;

    let found = users.current_user("ALICE@example.com").await.unwrap();
    assert_eq!(found.id, alice.id);

    let err = users.current_user("nobody@example.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let mut disabled = shop.register("gone@example.com").await;
    disabled.active = false;
    shop.storage.persisted().save_user(&disabled).await.unwrap();
    let err = users.current_user("gone@example.com").await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_demo_login_mints_fresh_identities() {
    let shop = TestShop::new();
    let a = shop.demo_user().await;
    let b = shop.demo_user().await;
    assert_ne!(a.id, b.id);
    assert!(IdentityKind::of_user_id(&a.id).is_demo());
    assert!(IdentityKind::of_email(a.email.as_str()).is_demo());
}

#[tokio::test]
async fn test_demo_carts_are_isolated() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "250.00", 10);
    let carts = CartService::new(&shop.storage);

    let a = shop.demo_user().await;
    let b = shop.demo_user().await;
    let persisted = shop.register("beth@example.com").await;

    carts.add_item(&a, &product, 2).await.unwrap();
    carts.add_item(&persisted, &product, 1).await.unwrap();

    assert_eq!(carts.get_cart(&a).await.unwrap().total_items, 2);
    assert!(carts.get_cart(&b).await.unwrap().is_empty());
    assert_eq!(carts.get_cart(&persisted).await.unwrap().total_items, 1);

    // dropping the session drops its data
    shop.storage.demo_sessions().invalidate(&a.id).await;
    assert!(carts.get_cart(&a).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_demo_profile_edits_stay_in_session() {
    let shop = TestShop::new();
    let users = UserService::new(&shop.storage);
    let demo = shop.demo_user().await;

    let updated = users
        .update_profile(
            &demo,
            ProfileUpdate {
                first_name: Some("Priya".to_owned()),
                phone: Some(String::new()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.first_name.as_deref(), Some("Priya"));
    assert!(updated.phone.is_none());

    let reloaded = users.current_user(demo.email.as_str()).await.unwrap();
    assert_eq!(reloaded.first_name.as_deref(), Some("Priya"));
    assert!(
        shop.storage
            .persisted()
            .find_user(&demo.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_persisted_profile_edits_are_saved() {
    let shop = TestShop::new();
    let users = UserService::new(&shop.storage);
    let user = shop.register("cleo@example.com").await;

    users
        .update_profile(
            &user,
            ProfileUpdate {
                last_name: Some("Menon".to_owned()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    let stored = shop.storage.persisted().find_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_name.as_deref(), Some("Menon"));
    assert_eq!(stored.first_name.as_deref(), Some("Test"));
}

#[tokio::test]
async fn test_cart_rules() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "40.00", 3);
    let user = shop.demo_user().await;
    let carts = CartService::new(&shop.storage);

    let cart = carts.add_item(&user, &product, 1).await.unwrap();
    let cart_id = cart.id.clone();
    let cart = carts.add_item(&user, &product, 2).await.unwrap();
    assert_eq!(cart.id, cart_id);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 3);
    assert_eq!(cart.total_price.to_string(), "120.00");

    let err = carts.add_item(&user, &product, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    let err = carts.add_item(&user, &product, 0).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    let err = carts
        .add_item(&user, &ProductId::new("ghost"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    let err = carts.update_quantity(&user, &product, 4).await.unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));
    let cart = carts.update_quantity(&user, &product, 1).await.unwrap();
    assert_eq!(cart.total_price.to_string(), "40.00");

    let cart = carts.update_quantity(&user, &product, 0).await.unwrap();
    assert!(cart.is_empty());
    let err = carts.remove_item(&user, &product).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_inactive_products_cannot_be_added() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "40.00", 3);
    let mut stored = shop.catalog.product(&product).unwrap();
    stored.active = false;
    shop.catalog.insert(stored);

    let user = shop.register("dina@example.com").await;
    let err = CartService::new(&shop.storage)
        .add_item(&user, &product, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_wishlist_on_both_paths() {
    let shop = TestShop::new();
    let kept = shop.add_product("p-1", "10.00", 5);
    let moved = shop.add_product("p-2", "20.00", 5);
    let wishlists = WishlistService::new(&shop.storage);

    for user in [shop.demo_user().await, shop.register("eli@example.com").await] {
        wishlists.add(&user, &kept).await.unwrap();
        wishlists.add(&user, &kept).await.unwrap();
        wishlists.add(&user, &moved).await.unwrap();
        assert_eq!(wishlists.list(&user).await.unwrap().len(), 2);

        let cart = wishlists.move_to_cart(&user, &moved).await.unwrap();
        assert_eq!(cart.quantity_of(&moved), 1);
        assert!(!wishlists.contains(&user, &moved).await.unwrap());
        assert!(wishlists.contains(&user, &kept).await.unwrap());

        let err = wishlists
            .add(&user, &ProductId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        wishlists.clear(&user).await.unwrap();
        assert!(wishlists.list(&user).await.unwrap().is_empty());
    }
}

fn product(index: u8, cents: i64) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(format!("p-{index}")),
        name: format!("Product {index}"),
        description: None,
        price: bazaar_core::Money::from_minor(cents),
        image: None,
        category_id: None,
        stock_quantity: 1_000,
        active: true,
        average_rating: 0.0,
        review_count: 0,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #[test]
    fn prop_cart_totals_track_lines(
        ops in prop::collection::vec((0u8..4, 1i64..100_000, 0u32..5, 0u8..3), 1..40)
    ) {
        let mut cart = Cart::new("c-1".into(), "demo-prop".into());
        for (index, cents, quantity, op) in ops {
            let product = product(index, cents);
            match op {
                0 if quantity > 0 => cart.add(&product, quantity),
                1 => {
                    cart.set_quantity(&product.id, quantity);
                }
                _ => {
                    cart.remove(&product.id);
                }
            }
            let items: u32 = cart.items.iter().map(|item| item.quantity).sum();
            let price: bazaar_core::Money = cart.items.iter().map(|item| item.subtotal).sum();
            prop_assert_eq!(cart.total_items, items);
            prop_assert_eq!(cart.total_price, price);
            prop_assert!(cart.items.iter().all(|item| item.quantity > 0));
        }
    }
}
