use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{get, patch, post, put},
    Extension, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use std::sync::Arc;

use crate::db::DbPool;
use crate::handlers::{auth, body_metrics, exercises, health, todos, workouts};
use crate::oauth::IdentityProvider;
use crate::repositories::{
    BodyMetricRepository, ExerciseRepository, PendingLoginRepository, SessionRepository,
    TodoRepository, UserRepository, WorkoutRepository,
};
use crate::session::CookieSettings;

pub struct RouterStates {
    pub auth: auth::AuthState,
    pub todos: todos::TodosState,
    pub exercises: exercises::ExercisesState,
    pub workouts: workouts::WorkoutsState,
    pub body_metrics: body_metrics::BodyMetricsState,
}

impl RouterStates {
    /// Wire every handler state to repositories over the same pool.
    pub fn new(
        pool: DbPool,
        provider: Arc<dyn IdentityProvider>,
        cookies: CookieSettings,
        frontend_origin: &str,
    ) -> Self {
        let exercise_repo = ExerciseRepository::new(pool.clone());
        Self {
            auth: auth::AuthState {
                user_repo: UserRepository::new(pool.clone()),
                session_repo: SessionRepository::new(pool.clone()),
                pending_login_repo: PendingLoginRepository::new(pool.clone()),
                provider,
                cookies,
                frontend_origin: frontend_origin.to_string(),
            },
            todos: todos::TodosState {
                todo_repo: TodoRepository::new(pool.clone()),
            },
            exercises: exercises::ExercisesState {
                exercise_repo: exercise_repo.clone(),
            },
            workouts: workouts::WorkoutsState {
                workout_repo: WorkoutRepository::new(pool.clone()),
                exercise_repo,
            },
            body_metrics: body_metrics::BodyMetricsState {
                body_metric_repo: BodyMetricRepository::new(pool),
            },
        }
    }
}

pub fn create_router(states: RouterStates) -> Router {
    let frontend_origin = states.auth.frontend_origin.clone();
    let session_repo = states.auth.session_repo.clone();
    let request_id_header = HeaderName::from_static("x-request-id");

    let auth_routes = Router::new()
        .route("/api/auth/line/login", get(auth::login))
        .route("/api/auth/line/callback", get(auth::callback))
        .route("/api/logout", get(auth::logout).post(auth::logout))
        .route("/api/me", get(auth::me))
        .with_state(states.auth);

    let todo_routes = Router::new()
        .route("/api/todos", get(todos::list).post(todos::create))
        .route("/api/todos/{id}", put(todos::update).delete(todos::delete))
        .with_state(states.todos);

    let exercise_routes = Router::new()
        .route("/api/exercises", get(exercises::list).post(exercises::create))
        .route(
            "/api/exercises/{id}",
            get(exercises::show)
                .patch(exercises::update)
                .delete(exercises::delete),
        )
        .with_state(states.exercises);

    let workout_routes = Router::new()
        .route("/api/workouts", get(workouts::list).post(workouts::create))
        .route(
            "/api/workouts/{id}",
            get(workouts::show)
                .patch(workouts::update)
                .delete(workouts::delete),
        )
        .route("/api/workouts/{id}/detail", get(workouts::detail))
        .route("/api/workouts/{id}/end", patch(workouts::end))
        .route("/api/workouts/{id}/sets", post(workouts::create_set))
        .route(
            "/api/workout_sets/{id}",
            patch(workouts::update_set).delete(workouts::delete_set),
        )
        .with_state(states.workouts);

    let body_metric_routes = Router::new()
        .route(
            "/api/body_metrics",
            get(body_metrics::list).post(body_metrics::create),
        )
        .route(
            "/api/body_metrics/{id}",
            patch(body_metrics::update).delete(body_metrics::delete),
        )
        .with_state(states.body_metrics);

    Router::new()
        .route("/healthz", get(health::health_check))
        .merge(auth_routes)
        .merge(todo_routes)
        .merge(exercise_routes)
        .merge(workout_routes)
        .merge(body_metric_routes)
        .fallback({
            let frontend_origin = frontend_origin.clone();
            move |uri: Uri| {
                let frontend_origin = frontend_origin.clone();
                async move { fallback(uri, &frontend_origin) }
            }
        })
        // Session repository for the AuthUser extractor
        .layer(Extension(session_repo))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(build_cors_layer(&frontend_origin))
}

/// Unknown API paths are 404; everything else belongs to the frontend.
fn fallback(uri: Uri, frontend_origin: &str) -> Response {
    if uri.path() == "/api" || uri.path().starts_with("/api/") {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    }
    Redirect::to(frontend_origin).into_response()
}

/// CORS for the browser frontend, which sends the session cookie.
pub fn build_cors_layer(frontend_origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(frontend_origin) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!("Invalid FRONTEND_ORIGIN {:?}: {}", frontend_origin, e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}
