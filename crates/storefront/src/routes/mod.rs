//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                - Liveness check
//! GET    /health/ready                          - Readiness check (database)
//!
//! # Account
//! POST   /api/auth/demo-login                   - Start a demo session
//! GET    /api/users/me                          - Caller's profile
//! PUT    /api/users/me                          - Edit caller's profile
//!
//! # Cart
//! GET    /api/cart                              - Current cart
//! DELETE /api/cart                              - Empty the cart
//! POST   /api/cart/items                        - Add a line
//! PUT    /api/cart/items/{product_id}           - Set a line's quantity
//! DELETE /api/cart/items/{product_id}           - Remove a line
//!
//! # Wishlist
//! GET    /api/wishlist                          - Saved products
//! DELETE /api/wishlist                          - Clear
//! GET    /api/wishlist/{product_id}             - Is the product saved?
//! POST   /api/wishlist/{product_id}             - Save a product
//! DELETE /api/wishlist/{product_id}             - Unsave a product
//! POST   /api/wishlist/{product_id}/move-to-cart
//!
//! # Orders
//! POST   /api/orders                            - Checkout
//! GET    /api/orders?status=                    - Caller's orders
//! GET    /api/orders/{id}                       - One order
//! POST   /api/orders/{id}/cancel                - Cancel
//!
//! # Reviews
//! GET    /api/products/{product_id}/reviews     - Reviews of a product (public)
//! POST   /api/reviews                           - Write a review
//! PUT    /api/reviews/{id}                      - Edit
//! DELETE /api/reviews/{id}                      - Delete
//! POST   /api/reviews/{id}/helpful              - Helpful vote
//!
//! # Admin (requires ADMIN role)
//! GET    /api/admin/orders?page=&size=&status=  - All persisted orders
//! GET    /api/admin/orders/{id}                 - One order
//! PUT    /api/admin/orders/{id}/status          - Move along the lifecycle
//! PUT    /api/admin/orders/{id}/tracking        - Set tracking number
//! GET    /api/admin/users?page=&size=           - Registered accounts
//! GET    /api/admin/users/{id}                  - One account
//! PUT    /api/admin/users/{id}/status           - Enable or disable
//! PUT    /api/admin/users/{id}/role             - Set role
//! ```

pub mod account;
pub mod admin;
pub mod cart;
pub mod orders;
pub mod reviews;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/demo-login", post(account::demo_login))
        .route("/users/me", get(account::me).put(account::update_me))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::list).delete(wishlist::clear))
        .route(
            "/{product_id}",
            get(wishlist::contains)
                .post(wishlist::add)
                .delete(wishlist::remove),
        )
        .route("/{product_id}/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the review routes router.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(reviews::create))
        .route("/{id}", put(reviews::update).delete(reviews::delete))
        .route("/{id}/helpful", post(reviews::helpful))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::list))
        .route("/orders/{id}", get(admin::show))
        .route("/orders/{id}/status", put(admin::update_status))
        .route("/orders/{id}/tracking", put(admin::update_tracking))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", get(admin::show_user))
        .route("/users/{id}/status", put(admin::update_user_status))
        .route("/users/{id}/role", put(admin::update_user_role))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(account_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/orders", order_routes())
        .nest("/reviews", review_routes())
        .route(
            "/products/{product_id}/reviews",
            get(reviews::for_product),
        )
        .nest("/admin", admin_routes());

    Router::new().nest("/api", api)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::middleware::AUTHENTICATED_EMAIL_HEADER;

    /// Router over a lazily connected pool. Demo-path requests never touch it.
    fn app() -> Router {
        let config = StorefrontConfig::from_source(&|key| {
            (key == "BAZAAR_DATABASE_URL").then(|| "postgres://localhost/bazaar_test".to_owned())
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bazaar_test")
            .unwrap();
        routes().with_state(AppState::new(config, pool))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_as(uri: &str, email: &str) -> Request<Body> {
        Request::get(uri)
            .header(AUTHENTICATED_EMAIL_HEADER, email)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = app();
        let request = Request::get("/api/cart").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].as_str().unwrap().contains("authentication"));
    }

    #[tokio::test]
    async fn test_demo_login_then_empty_cart() {
        let app = app();
        let request = Request::post("/api/auth/demo-login")
            .body(Body::empty())
            .unwrap();
        let (status, user) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        let email = user["email"].as_str().unwrap();
        assert!(user["id"].as_str().unwrap().starts_with("demo-"));

        let (status, cart) = send(&app, get_as("/api/cart", email)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totalItems"], 0);
        assert_eq!(cart["items"], Value::Array(Vec::new()));

        let (status, me) = send(&app, get_as("/api/users/me", email)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user["id"]);
    }

    #[tokio::test]
    async fn test_demo_shopper_is_not_admin() {
        let app = app();
        let (status, _) = send(&app, get_as("/api/admin/orders", "demo@bazaar.local")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, get_as("/api/admin/users", "demo@bazaar.local")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_demo_lookalike_address_is_a_client_error() {
        let app = app();
        let (status, body) = send(&app, get_as("/api/users/me", "demo+a b@bazaar.local")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid email"));
    }

    #[tokio::test]
    async fn test_unknown_status_filter_is_bad_request() {
        let app = app();
        let (status, body) = send(
            &app,
            get_as("/api/orders?status=LOST", "demo+routes@bazaar.local"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("LOST"));
    }

    #[tokio::test]
    async fn test_demo_orders_start_empty() {
        let app = app();
        let (status, body) = send(&app, get_as("/api/orders", "demo+fresh@bazaar.local")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(Vec::new()));
    }
}
