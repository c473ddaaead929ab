use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use roster::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = roster::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    roster::api::router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Register an admin account and return its bearer token.
async fn admin_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "admin_boss",
                        "password": "adminpassword",
                        "firstName": "Admin",
                        "lastName": "Boss"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

async fn create_user(
    app: &Router,
    token: &str,
    payload: serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_users(app: &Router, token: &str, query: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users{query}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn put_user(
    app: &Router,
    token: &str,
    id: &str,
    payload: serde_json::Value,
) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{id}"))
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn seed_users(app: &Router, token: &str, count: usize) {
    for i in 0..count {
        let response = create_user(
            app,
            token,
            serde_json::json!({
                "username": format!("seed_user_{i:02}"),
                "password": "password123",
                "firstName": format!("First{i}"),
                "lastName": format!("Last{i}")
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_pagination_pages_are_disjoint() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;
    seed_users(&app, &token, 15).await;

    let response = get_users(&app, &token, "?limit=5").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page1 = body_json(response).await;

    assert_eq!(page1["data"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(page1["data"]["currentPage"], 1);
    // 15 seeded + the admin
    assert_eq!(page1["data"]["totalCount"], 16);
    assert_eq!(page1["data"]["lastPage"], 4);

    let response = get_users(&app, &token, "?limit=5&page=2").await;
    let page2 = body_json(response).await;
    assert_eq!(page2["data"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(page2["data"]["currentPage"], 2);

    let ids1: Vec<String> = page1["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    for user in page2["data"]["items"].as_array().unwrap() {
        assert!(!ids1.contains(&user["id"].as_str().unwrap().to_string()));
    }
}

#[tokio::test]
async fn test_sorting() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;
    seed_users(&app, &token, 15).await;

    // Username ascending is non-decreasing
    let response = get_users(&app, &token, "?sortField=username&sortDirection=ASC&limit=20").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let usernames: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert!(usernames.windows(2).all(|w| w[0] <= w[1]));

    // createdAt descending is non-increasing
    let response =
        get_users(&app, &token, "?sortField=createdAt&sortDirection=DESC&limit=20").await;
    let body = body_json(response).await;
    let created: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["createdAt"].as_str().unwrap())
        .collect();
    assert!(created.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = get_users(&app, &token, "?sortField=passwordHash").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_users(&app, &token, "?sortDirection=sideways").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_users(&app, &token, "?page=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_inactive_user() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = create_user(
        &app,
        &token,
        serde_json::json!({
            "username": "dash_user",
            "password": "password123",
            "firstName": "F",
            "lastName": "L",
            "status": "inactive"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "inactive");
    // Administrative create mints no session and counts no login
    assert_eq!(body["data"]["loginsCounter"], 0);
}

#[tokio::test]
async fn test_inactive_user_name_freeze() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = create_user(
        &app,
        &token,
        serde_json::json!({
            "username": "frozen_profile",
            "password": "password123",
            "firstName": "Lazy",
            "lastName": "User",
            "status": "inactive"
        }),
    )
    .await;
    let body = body_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Renaming an inactive user is a policy violation
    let response = put_user(&app, &token, &id, serde_json::json!({"firstName": "Eager"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Cannot update names for inactive users");

    // Reactivating and renaming in the same request is still rejected
    let response = put_user(
        &app,
        &token,
        &id,
        serde_json::json!({"status": "active", "firstName": "Eager"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Status alone succeeds, and the rename works afterwards
    let response = put_user(&app, &token, &id, serde_json::json!({"status": "active"})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_user(&app, &token, &id, serde_json::json!({"firstName": "Eager"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["firstName"], "Eager");
}

#[tokio::test]
async fn test_password_reset_allows_login() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = create_user(
        &app,
        &token,
        serde_json::json!({
            "username": "reset_user",
            "password": "password123",
            "firstName": "Re",
            "lastName": "Set"
        }),
    )
    .await;
    let body = body_json(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = put_user(
        &app,
        &token,
        &id,
        serde_json::json!({"password": "newpassword123"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "reset_user", "password": "newpassword123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old password is gone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({"username": "reset_user", "password": "password123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    let response = put_user(
        &app,
        &token,
        "00000000-0000-0000-0000-000000000000",
        serde_json::json!({"firstName": "Nobody"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_and_cascade() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;

    // Register a second account so it owns a live session
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "username": "doomed_user",
                        "password": "password123",
                        "firstName": "Doo",
                        "lastName": "Med"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    let doomed_id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    let doomed_token = body["data"]["sessionId"].as_str().unwrap().to_string();

    let delete = |id: String| {
        let app = app.clone();
        let token = token.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/users/{id}"))
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = delete(doomed_id.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Gone: a second delete is 404
    let response = delete(doomed_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The deleted user's session died with it
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("Authorization", format!("Bearer {doomed_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_never_exposes_digest() {
    let app = spawn_app().await;
    let token = admin_token(&app).await;
    seed_users(&app, &token, 3).await;

    let response = get_users(&app, &token, "").await;
    let body = body_json(response).await;

    for user in body["data"]["items"].as_array().unwrap() {
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
    }
}
