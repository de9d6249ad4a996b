#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use url::Url;

use logbook::db::{create_memory_pool, DbPool};
use logbook::migrations::run_migrations_for_tests;
use logbook::models::{ExerciseType, Profile, User};
use logbook::oauth::{IdentityProvider, ProviderError};
use logbook::repositories::{ExerciseRepository, SessionRepository, SharedExercise, UserRepository};
use logbook::routes::{create_router, RouterStates};
use logbook::session::CookieSettings;

pub const FRONTEND_ORIGIN: &str = "http://frontend.test";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

/// Identity provider that accepts any code except `"bad"` and remembers the
/// PKCE verifier and nonce it was given.
#[derive(Default)]
pub struct FakeProvider {
    pub last_verifier: Mutex<Option<String>>,
    pub last_nonce: Mutex<Option<String>>,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn name(&self) -> &str {
        "line"
    }

    fn authorize_url(
        &self,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError> {
        Ok(Url::parse_with_params(
            "https://idp.test/authorize",
            &[
                ("state", state),
                ("nonce", nonce),
                ("code_challenge", code_challenge),
            ],
        )?)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        nonce: &str,
    ) -> Result<String, ProviderError> {
        *self.last_verifier.lock().unwrap() = Some(code_verifier.to_string());
        *self.last_nonce.lock().unwrap() = Some(nonce.to_string());
        if code == "bad" {
            return Err(ProviderError::Status {
                status: 400,
                body: "invalid_grant".to_string(),
            });
        }
        if code == "replayed" {
            return Err(ProviderError::IdToken("nonce mismatch".to_string()));
        }
        Ok(format!("access-{}", code))
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Profile, ProviderError> {
        Ok(Profile {
            subject: "U-fake".to_string(),
            display_name: Some("Fake User".to_string()),
            picture_url: Some("https://idp.test/fake.png".to_string()),
            email: None,
            status_message: Some("lifting".to_string()),
        })
    }
}

pub fn cookie_settings() -> CookieSettings {
    CookieSettings {
        secure: false,
        session_ttl: chrono::Duration::hours(24),
    }
}

pub fn create_test_app(pool: DbPool) -> Router {
    create_test_app_with_provider(pool, Arc::new(FakeProvider::default()))
}

pub fn create_test_app_with_provider(pool: DbPool, provider: Arc<FakeProvider>) -> Router {
    let states = RouterStates::new(pool, provider, cookie_settings(), FRONTEND_ORIGIN);
    create_router(states)
}

pub async fn create_test_user(pool: &DbPool, subject: &str) -> User {
    let user_repo = UserRepository::new(pool.clone());
    let profile = Profile {
        subject: subject.to_string(),
        display_name: Some(format!("User {}", subject)),
        ..Default::default()
    };
    user_repo.upsert_from_profile("line", &profile).await.unwrap()
}

pub async fn create_session_token(pool: &DbPool, user: &User) -> String {
    let session_repo = SessionRepository::new(pool.clone());
    session_repo
        .create(&user.id, chrono::Duration::hours(1))
        .await
        .unwrap()
}

pub async fn create_session_cookie(pool: &DbPool, user: &User) -> String {
    format!("session={}", create_session_token(pool, user).await)
}

pub fn extract_cookie_header(set_cookie: &str) -> String {
    // Extract just the cookie name=value part for use in Cookie header
    set_cookie.split(';').next().unwrap_or("").to_string()
}

pub async fn seed_shared_exercise(pool: &DbPool, id: &'static str, name: &'static str) {
    let exercise_repo = ExerciseRepository::new(pool.clone());
    exercise_repo
        .seed_shared(&[SharedExercise {
            id,
            name,
            exercise_type: ExerciseType::Strength,
            primary_muscle: "legs",
        }])
        .await
        .unwrap();
}

pub fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: Method, uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("cookie", cookie)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
