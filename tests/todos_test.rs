mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

async fn setup() -> (axum::Router, String, logbook::db::DbPool) {
    let pool = common::setup_test_db();
    let user = common::create_test_user(&pool, "U1").await;
    let cookie = common::create_session_cookie(&pool, &user).await;
    (common::create_test_app(pool.clone()), cookie, pool)
}

#[tokio::test]
async fn test_create_and_list_todos() {
    let (app, cookie, _) = setup().await;

    for content in ["first", "  second  "] {
        let response = app
            .clone()
            .oneshot(common::json(
                Method::POST,
                "/api/todos",
                &cookie,
                json!({ "content": content }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(common::get("/api/todos", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = common::body_json(response).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["limit"], 20);
    assert_eq!(page["offset"], 0);
    assert_eq!(page["items"][0]["content"], "second");
    assert_eq!(page["items"][1]["content"], "first");
}

#[tokio::test]
async fn test_blank_content_rejected() {
    let (app, cookie, _) = setup().await;

    let response = app
        .oneshot(common::json(
            Method::POST,
            "/api/todos",
            &cookie,
            json!({ "content": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_string(response).await, "content is required");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let (app, cookie, _) = setup().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/todos")
        .header("cookie", &cookie)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_string(response).await, "invalid body");
}

#[tokio::test]
async fn test_update_todo() {
    let (app, cookie, _) = setup().await;
    let response = app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/todos",
            &cookie,
            json!({ "content": "draft" }),
        ))
        .await
        .unwrap();
    let id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .oneshot(common::json(
            Method::PUT,
            &format!("/api/todos/{}", id),
            &cookie,
            json!({ "content": "final" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["content"], "final");
}

#[tokio::test]
async fn test_invalid_and_missing_ids() {
    let (app, cookie, _) = setup().await;

    let response = app
        .clone()
        .oneshot(common::delete("/api/todos/abc", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(common::body_string(response).await, "invalid id");

    let response = app
        .oneshot(common::delete("/api/todos/999", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_todo_is_not_found() {
    let (app, cookie, pool) = setup().await;
    let other = common::create_test_user(&pool, "U2").await;
    let other_cookie = common::create_session_cookie(&pool, &other).await;
    let response = app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/todos",
            &other_cookie,
            json!({ "content": "private" }),
        ))
        .await
        .unwrap();
    let id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(common::delete(&format!("/api/todos/{}", id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::get("/api/todos", &cookie))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await["total"], 0);
}

#[tokio::test]
async fn test_delete_todo() {
    let (app, cookie, _) = setup().await;
    let response = app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/todos",
            &cookie,
            json!({ "content": "done" }),
        ))
        .await
        .unwrap();
    let id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .oneshot(common::delete(&format!("/api/todos/{}", id), &cookie))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_pagination_bounds() {
    let (app, cookie, _) = setup().await;

    for query in ["limit=0", "limit=201", "offset=-1"] {
        let response = app
            .clone()
            .oneshot(common::get(&format!("/api/todos?{}", query), &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", query);
    }

    let response = app
        .oneshot(common::get("/api/todos?limit=200&offset=5", &cookie))
        .await
        .unwrap();
    let page = common::body_json(response).await;
    assert_eq!(page["limit"], 200);
    assert_eq!(page["offset"], 5);
}
