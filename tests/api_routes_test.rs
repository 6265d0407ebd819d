mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cantina_api::{api_v1_routes, auth, entities::user::Role};
use common::TestApp;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Full HTTP router as main.rs assembles it, minus the network listener.
fn router(app: &TestApp) -> Router {
    let auth_service = app.state.services.auth.clone();
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .nest("/auth", auth::auth_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            auth::auth_middleware,
        ))
        .with_state(app.state.clone())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn menu_is_public_but_the_cart_requires_a_student_token() {
    let app = TestApp::new().await;
    let router = router(&app);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/menu")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/cart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn register_login_and_use_the_cart_end_to_end() {
    let app = TestApp::new().await;
    let router = router(&app);

    // Register; self-registration is always a student account.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "username": "petya",
                        "email": "petya@school.example",
                        "password": "correct horse battery"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Login and keep the token.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "username": "petya",
                        "password": "correct horse battery"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tokens = body_json(response).await;
    let token = tokens["access_token"].as_str().unwrap().to_string();

    // The cart opens empty for the fresh student.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/cart")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    // Wrong role is rejected by the route guard, not by the handler.
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/stats")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn staff_routes_accept_chef_tokens() {
    let app = TestApp::new().await;
    let chef = app.seed_user(Role::Chef, dec!(0)).await;
    let token = app
        .state
        .services
        .auth
        .generate_token(&chef)
        .unwrap()
        .access_token;

    let response = router(&app)
        .oneshot(
            Request::builder()
                .uri("/api/v1/kitchen/orders")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
