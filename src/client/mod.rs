//! Typed client for the REST API and the view-model stores built on it.
//!
//! Each store owns an [`ApiClient`] and follows the same cycle: load a list,
//! mutate through the API, then refresh or patch local state. Store methods
//! take `&mut self`, so a store never has two requests in flight.

pub mod body_metrics;
pub mod exercises;
pub mod forms;
pub mod state;
pub mod todos;
pub mod workouts;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::cookie::Jar;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::models::{
    BodyMetric, CreateBodyMetric, CreateExercise, CreateWorkout, CreateWorkoutSet, EndWorkout,
    Exercise, ExerciseFilter, Me, Page, PageParams, RangeQuery, Todo, TodoInput, UpdateBodyMetric,
    UpdateExercise, UpdateWorkout, UpdateWorkoutSet, Workout, WorkoutDetail, WorkoutSet,
};
use crate::session::SESSION_COOKIE_NAME;

pub use body_metrics::BodyMetricStore;
pub use exercises::ExerciseStore;
pub use state::ResourceState;
pub use todos::TodoStore;
pub use workouts::WorkoutStore;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// HTTP client bound to one server, carrying the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self {
            http,
            base_url,
            jar,
        })
    }

    /// Seed the cookie jar with an existing session token.
    pub fn with_session_token(self, token: &str) -> Self {
        self.jar.add_cookie_str(
            &format!("{}={}; Path=/", SESSION_COOKIE_NAME, token),
            &self.base_url,
        );
        self
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => format!("HTTP {}", status.as_u16()),
            text => text.to_string(),
        };
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(&self, request: RequestBuilder) -> ClientResult<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.http.get(self.url(path)?)).await
    }

    async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.http.get(self.url(path)?).query(query)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.http.post(self.url(path)?).json(body)).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.http.patch(self.url(path)?).json(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send_empty(self.http.delete(self.url(path)?)).await
    }

    pub async fn me(&self) -> ClientResult<Me> {
        self.get("/api/me").await
    }

    pub async fn list_todos(&self, page: &PageParams) -> ClientResult<Page<Todo>> {
        self.get_with("/api/todos", page).await
    }

    pub async fn create_todo(&self, input: &TodoInput) -> ClientResult<Todo> {
        self.post("/api/todos", input).await
    }

    pub async fn update_todo(&self, id: i64, input: &TodoInput) -> ClientResult<Todo> {
        let url = self.url(&format!("/api/todos/{}", id))?;
        self.send(self.http.put(url).json(input)).await
    }

    pub async fn delete_todo(&self, id: i64) -> ClientResult<()> {
        self.delete(&format!("/api/todos/{}", id)).await
    }

    pub async fn list_workouts(&self, query: &RangeQuery) -> ClientResult<Page<Workout>> {
        self.get_with("/api/workouts", query).await
    }

    pub async fn create_workout(&self, input: &CreateWorkout) -> ClientResult<Workout> {
        self.post("/api/workouts", input).await
    }

    pub async fn get_workout(&self, id: &str) -> ClientResult<Workout> {
        self.get(&format!("/api/workouts/{}", id)).await
    }

    pub async fn workout_detail(&self, id: &str) -> ClientResult<WorkoutDetail> {
        self.get(&format!("/api/workouts/{}/detail", id)).await
    }

    pub async fn update_workout(&self, id: &str, patch: &UpdateWorkout) -> ClientResult<Workout> {
        self.patch(&format!("/api/workouts/{}", id), patch).await
    }

    /// End a workout; `None` lets the server use the current time.
    pub async fn end_workout(
        &self,
        id: &str,
        ended_at: Option<DateTime<Utc>>,
    ) -> ClientResult<Workout> {
        self.patch(&format!("/api/workouts/{}/end", id), &EndWorkout { ended_at })
            .await
    }

    pub async fn delete_workout(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/workouts/{}", id)).await
    }

    pub async fn create_set(
        &self,
        workout_id: &str,
        input: &CreateWorkoutSet,
    ) -> ClientResult<WorkoutSet> {
        self.post(&format!("/api/workouts/{}/sets", workout_id), input)
            .await
    }

    pub async fn update_set(&self, id: &str, patch: &UpdateWorkoutSet) -> ClientResult<WorkoutSet> {
        self.patch(&format!("/api/workout_sets/{}", id), patch).await
    }

    pub async fn delete_set(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/workout_sets/{}", id)).await
    }

    pub async fn list_exercises(&self, filter: &ExerciseFilter) -> ClientResult<Page<Exercise>> {
        self.get_with("/api/exercises", filter).await
    }

    pub async fn get_exercise(&self, id: &str) -> ClientResult<Exercise> {
        self.get(&format!("/api/exercises/{}", id)).await
    }

    pub async fn create_exercise(&self, input: &CreateExercise) -> ClientResult<Exercise> {
        self.post("/api/exercises", input).await
    }

    pub async fn update_exercise(&self, id: &str, patch: &UpdateExercise) -> ClientResult<Exercise> {
        self.patch(&format!("/api/exercises/{}", id), patch).await
    }

    pub async fn delete_exercise(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/exercises/{}", id)).await
    }

    pub async fn list_body_metrics(&self, query: &RangeQuery) -> ClientResult<Page<BodyMetric>> {
        self.get_with("/api/body_metrics", query).await
    }

    pub async fn create_body_metric(&self, input: &CreateBodyMetric) -> ClientResult<BodyMetric> {
        self.post("/api/body_metrics", input).await
    }

    pub async fn update_body_metric(
        &self,
        id: &str,
        patch: &UpdateBodyMetric,
    ) -> ClientResult<BodyMetric> {
        self.patch(&format!("/api/body_metrics/{}", id), patch).await
    }

    pub async fn delete_body_metric(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/body_metrics/{}", id)).await
    }
}
