mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::IntoResponse,
};
use tower::ServiceExt;

use logbook::error::AppError;

#[tokio::test]
async fn test_app_error_status_codes() {
    let cases = [
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
        (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
        (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (AppError::Conflict("x".into()), StatusCode::CONFLICT),
        (AppError::BadGateway("x".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Internal("x".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.into_response().status(), expected);
    }
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let response = AppError::Internal("secret path /var/db".into()).into_response();

    assert_eq!(common::body_string(response).await, "Internal error");
}

#[tokio::test]
async fn test_client_errors_return_plain_text_message() {
    let response = AppError::Conflict("exercise is in use".into()).into_response();

    assert_eq!(common::body_string(response).await, "exercise is in use");
}

#[tokio::test]
async fn test_healthz() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = common::body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["gitVersion"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn test_unknown_api_path_is_not_found() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_string(response).await, "not found");
}

#[tokio::test]
async fn test_other_paths_redirect_to_frontend() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(Request::get("/workouts/42").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        common::FRONTEND_ORIGIN
    );
}

#[tokio::test]
async fn test_request_id_is_set() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(
            Request::get("/healthz")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend_with_credentials() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/todos")
                .header(header::ORIGIN, common::FRONTEND_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        common::FRONTEND_ORIGIN
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let app = common::create_test_app(common::setup_test_db());

    let response = app
        .oneshot(
            Request::get("/healthz")
                .header(header::ORIGIN, "http://evil.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
