mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

const SHARED_ID: &str = "de1ed478-9973-4c7c-b623-f4562f11e29e";

struct Fixture {
    app: axum::Router,
    alice: String,
    bob: String,
}

async fn setup() -> Fixture {
    let pool = common::setup_test_db();
    common::seed_shared_exercise(&pool, SHARED_ID, "Back Squat").await;
    let alice = common::create_test_user(&pool, "alice").await;
    let bob = common::create_test_user(&pool, "bob").await;
    Fixture {
        alice: common::create_session_cookie(&pool, &alice).await,
        bob: common::create_session_cookie(&pool, &bob).await,
        app: common::create_test_app(pool),
    }
}

async fn create_exercise(f: &Fixture, cookie: &str, name: &str) -> serde_json::Value {
    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/exercises",
            cookie,
            json!({ "name": name, "type": "strength", "primaryMuscle": "back" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    common::body_json(response).await
}

#[tokio::test]
async fn test_list_shows_shared_and_own() {
    let f = setup().await;
    create_exercise(&f, &f.alice, "Barbell Row").await;
    create_exercise(&f, &f.bob, "Bob's Curl").await;

    let response = f
        .app
        .clone()
        .oneshot(common::get("/api/exercises", &f.alice))
        .await
        .unwrap();

    let page = common::body_json(response).await;
    assert_eq!(page["total"], 2);
    let names: Vec<_> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Back Squat", "Barbell Row"]);
}

#[tokio::test]
async fn test_only_mine_returns_owned_entries() {
    let f = setup().await;
    let created = create_exercise(&f, &f.alice, "Barbell Row").await;

    let response = f
        .app
        .clone()
        .oneshot(common::get("/api/exercises?onlyMine=true", &f.alice))
        .await
        .unwrap();

    let page = common::body_json(response).await;
    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["ownerUserId"], created["ownerUserId"]);
}

#[tokio::test]
async fn test_search_and_type_filter() {
    let f = setup().await;
    create_exercise(&f, &f.alice, "Front Squat").await;

    let response = f
        .app
        .clone()
        .oneshot(common::get("/api/exercises?q=SQUAT&limit=1", &f.alice))
        .await
        .unwrap();
    let page = common::body_json(response).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let response = f
        .app
        .clone()
        .oneshot(common::get("/api/exercises?type=cardio", &f.alice))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await["total"], 0);

    let response = f
        .app
        .clone()
        .oneshot(common::get("/api/exercises?type=yoga", &f.alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_name_conflicts() {
    let f = setup().await;
    create_exercise(&f, &f.alice, "Pull Up").await;

    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/exercises",
            &f.alice,
            json!({ "name": " Pull Up ", "type": "strength" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_shared_exercise_is_read_only() {
    let f = setup().await;
    let uri = format!("/api/exercises/{}", SHARED_ID);

    let response = f
        .app
        .clone()
        .oneshot(common::get(&uri, &f.alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::PATCH,
            &uri,
            &f.alice,
            json!({ "name": "Squat" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = f
        .app
        .clone()
        .oneshot(common::delete(&uri, &f.alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_users_exercise_is_hidden() {
    let f = setup().await;
    let created = create_exercise(&f, &f.bob, "Secret Press").await;
    let uri = format!("/api/exercises/{}", created["id"].as_str().unwrap());

    for request in [
        common::get(&uri, &f.alice),
        common::json(Method::PATCH, &uri, &f.alice, json!({ "name": "Mine" })),
        common::delete(&uri, &f.alice),
    ] {
        let response = f.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_owner_can_update_and_delete() {
    let f = setup().await;
    let created = create_exercise(&f, &f.alice, "Dip").await;
    let uri = format!("/api/exercises/{}", created["id"].as_str().unwrap());

    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::PATCH,
            &uri,
            &f.alice,
            json!({ "name": "Weighted Dip", "primaryMuscle": null, "isActive": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = common::body_json(response).await;
    assert_eq!(updated["name"], "Weighted Dip");
    assert!(updated["primaryMuscle"].is_null());
    assert_eq!(updated["isActive"], false);

    let response = f
        .app
        .clone()
        .oneshot(common::delete(&uri, &f.alice))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_exercise_in_use_cannot_be_deleted() {
    let f = setup().await;
    let created = create_exercise(&f, &f.alice, "Lunge").await;
    let exercise_id = created["id"].as_str().unwrap();

    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::POST,
            "/api/workouts",
            &f.alice,
            json!({ "startedAt": "2024-05-01T07:00:00Z" }),
        ))
        .await
        .unwrap();
    let workout = common::body_json(response).await;
    let response = f
        .app
        .clone()
        .oneshot(common::json(
            Method::POST,
            &format!("/api/workouts/{}/sets", workout["id"].as_str().unwrap()),
            &f.alice,
            json!({ "exerciseId": exercise_id, "reps": 10 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = f
        .app
        .clone()
        .oneshot(common::delete(
            &format!("/api/exercises/{}", exercise_id),
            &f.alice,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
