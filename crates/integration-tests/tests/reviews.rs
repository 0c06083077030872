//! Review eligibility, verification and rating aggregation.

#![allow(clippy::unwrap_used)]

use bazaar_core::ProductId;
use bazaar_integration_tests::{TestShop, checkout};
use bazaar_storefront::models::User;
use bazaar_storefront::services::{
    CartService, OrderService, ReviewChanges, ReviewDraft, ReviewService, ServiceError,
};

fn draft(product_id: &ProductId, rating: u8) -> ReviewDraft {
    ReviewDraft {
        product_id: product_id.clone(),
        rating,
        title: Some("Nice".to_owned()),
        comment: None,
    }
}

#[tokio::test]
async fn test_aggregate_is_mean_of_persisted_reviews() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let reviews = ReviewService::new(&shop.storage);

    for (i, rating) in [5, 3, 4].into_iter().enumerate() {
        let user = shop.register(&format!("r{i}@example.com")).await;
        reviews.create(&user, draft(&product, rating)).await.unwrap();
    }

    let stored = shop.catalog.product(&product).unwrap();
    assert_eq!(stored.review_count, 3);
    assert!((stored.average_rating - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_one_review_per_user_on_both_paths() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let reviews = ReviewService::new(&shop.storage);

    let persisted = shop.register("sam@example.com").await;
    let demo = shop.demo_user().await;

    for user in [&persisted, &demo] {
        reviews.create(user, draft(&product, 4)).await.unwrap();
        let err = reviews.create(user, draft(&product, 2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateReview));
    }
    assert_eq!(shop.database.review_count(), 1);
}

#[tokio::test]
async fn test_rating_and_product_are_validated() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let user = shop.register("tara@example.com").await;
    let reviews = ReviewService::new(&shop.storage);

    for rating in [0, 6] {
        let err = reviews.create(&user, draft(&product, rating)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
    let err = reviews
        .create(&user, draft(&ProductId::new("nope"), 3))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

async fn buy(shop: &TestShop, user: &User, product: &ProductId) -> bazaar_core::OrderId {
    CartService::new(&shop.storage)
        .add_item(user, product, 1)
        .await
        .unwrap();
    OrderService::new(&shop.storage, &shop.pricing)
        .create_order(user, checkout("COD"))
        .await
        .unwrap()
        .order
        .id
}

#[tokio::test]
async fn test_verified_only_after_delivery() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let other = shop.add_product("p-2", "100.00", 5);
    let admin = shop.register_admin("ops@example.com").await;
    let buyer = shop.register("uma@example.com").await;
    let reviews = ReviewService::new(&shop.storage);

    let order_id = buy(&shop, &buyer, &product).await;
    // placed but not delivered
    let review = reviews.create(&buyer, draft(&other, 5)).await.unwrap();
    assert!(!review.verified);

    OrderService::new(&shop.storage, &shop.pricing)
        .update_status(&admin, &order_id, "DELIVERED")
        .await
        .unwrap();
    let review = reviews.create(&buyer, draft(&product, 5)).await.unwrap();
    assert!(review.verified);
}

#[tokio::test]
async fn test_demo_reviews_stay_out_of_the_aggregate() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let reviews = ReviewService::new(&shop.storage);

    let persisted = shop.register("vic@example.com").await;
    reviews.create(&persisted, draft(&product, 2)).await.unwrap();

    let demo = shop.demo_user().await;
    buy(&shop, &demo, &product).await;
    let demo_review = reviews.create(&demo, draft(&product, 5)).await.unwrap();
    assert!(!demo_review.verified);
    assert!(demo_review.id.as_str().starts_with("demo-review-"));

    let stored = shop.catalog.product(&product).unwrap();
    assert_eq!(stored.review_count, 1);
    assert!((stored.average_rating - 2.0).abs() < f64::EPSILON);
    assert_eq!(shop.database.review_count(), 1);

    // the demo author sees their own review, nobody else does
    let seen_by_demo = reviews.list_for_product(Some(&demo), &product).await.unwrap();
    assert_eq!(seen_by_demo.len(), 2);
    assert_eq!(seen_by_demo[0].id, demo_review.id);

    let other_demo = shop.demo_user().await;
    let seen_by_other = reviews
        .list_for_product(Some(&other_demo), &product)
        .await
        .unwrap();
    assert_eq!(seen_by_other.len(), 1);
    let anonymous = reviews.list_for_product(None, &product).await.unwrap();
    assert_eq!(anonymous.len(), 1);
}

#[tokio::test]
async fn test_update_and_delete_permissions() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let author = shop.register("wes@example.com").await;
    let stranger = shop.register("xia@example.com").await;
    let admin = shop.register_admin("ops@example.com").await;
    let reviews = ReviewService::new(&shop.storage);

    let review = reviews.create(&author, draft(&product, 4)).await.unwrap();

    let changes = ReviewChanges {
        rating: 1,
        title: None,
        comment: Some("Broke after a week".to_owned()),
    };
    let err = reviews
        .update(&stranger, &review.id, changes.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let updated = reviews.update(&author, &review.id, changes).await.unwrap();
    assert_eq!(updated.rating, 1);
    assert_eq!(updated.title.as_deref(), Some("Nice"));
    assert_eq!(updated.comment.as_deref(), Some("Broke after a week"));
    let stored = shop.catalog.product(&product).unwrap();
    assert!((stored.average_rating - 1.0).abs() < f64::EPSILON);

    let err = reviews.delete(&stranger, &review.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    reviews.delete(&admin, &review.id).await.unwrap();
    let stored = shop.catalog.product(&product).unwrap();
    assert_eq!(stored.review_count, 0);
    assert!(stored.average_rating.abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_helpful_votes() {
    let shop = TestShop::new();
    let product = shop.add_product("p-1", "100.00", 5);
    let author = shop.register("yan@example.com").await;
    let voter = shop.register("zoe@example.com").await;
    let demo = shop.demo_user().await;
    let reviews = ReviewService::new(&shop.storage);

    let review = reviews.create(&author, draft(&product, 5)).await.unwrap();

    let voted = reviews.mark_helpful(&voter, &review.id).await.unwrap();
    assert_eq!(voted.helpful_count, 1);

    // a demo vote is shown but not stored
    let demo_view = reviews.mark_helpful(&demo, &review.id).await.unwrap();
    assert_eq!(demo_view.helpful_count, 2);
    let stored = reviews.list_for_product(None, &product).await.unwrap();
    assert_eq!(stored[0].helpful_count, 1);
}
