use super::forms::ExerciseForm;
use super::{ApiClient, ClientResult, ResourceState};
use crate::models::{Exercise, ExerciseFilter, UpdateExercise};

pub struct ExerciseStore {
    client: ApiClient,
    current_user_id: String,
    pub exercises: ResourceState<Vec<Exercise>>,
    pub total: i64,
    pub filter: ExerciseFilter,
}

impl ExerciseStore {
    /// `current_user_id` is the `userId` reported by `/api/me`.
    pub fn new(client: ApiClient, current_user_id: impl Into<String>) -> Self {
        Self {
            client,
            current_user_id: current_user_id.into(),
            exercises: ResourceState::Idle,
            total: 0,
            filter: ExerciseFilter::default(),
        }
    }

    /// Only the owner may edit or delete; shared entries are read-only.
    pub fn can_edit(&self, exercise: &Exercise) -> bool {
        exercise.is_owned_by(&self.current_user_id)
    }

    pub async fn load(&mut self) {
        self.exercises = ResourceState::Loading;
        match self.client.list_exercises(&self.filter).await {
            Ok(page) => {
                self.total = page.total;
                self.exercises = ResourceState::Loaded(page.items);
            }
            Err(e) => self.exercises = ResourceState::Error(e.to_string()),
        }
    }

    pub async fn set_filter(&mut self, filter: ExerciseFilter) {
        self.filter = filter;
        self.load().await;
    }

    pub async fn create(&mut self, form: &ExerciseForm) -> ClientResult<Exercise> {
        let input = form.to_input()?;
        let exercise = self.client.create_exercise(&input).await?;
        self.load().await;
        Ok(exercise)
    }

    pub async fn update(&mut self, id: &str, patch: &UpdateExercise) -> ClientResult<Exercise> {
        let exercise = self.client.update_exercise(id, patch).await?;
        self.load().await;
        Ok(exercise)
    }

    pub async fn delete(&mut self, id: &str) -> ClientResult<()> {
        self.client.delete_exercise(id).await?;
        self.load().await;
        Ok(())
    }
}
