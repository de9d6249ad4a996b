use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::forms::{SetForm, WorkoutForm};
use super::{ApiClient, ClientResult, ResourceState};
use crate::models::{RangeQuery, UpdateWorkout, UpdateWorkoutSet, Workout, WorkoutDetail, WorkoutSet};

/// Workout list plus per-workout detail, fetched lazily when a workout is
/// first expanded and cached until refreshed or deleted.
pub struct WorkoutStore {
    client: ApiClient,
    pub workouts: ResourceState<Vec<Workout>>,
    pub total: i64,
    pub query: RangeQuery,
    details: HashMap<String, WorkoutDetail>,
    expanded: HashSet<String>,
}

impl WorkoutStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            workouts: ResourceState::Idle,
            total: 0,
            query: RangeQuery::default(),
            details: HashMap::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn detail(&self, id: &str) -> Option<&WorkoutDetail> {
        self.details.get(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub async fn load(&mut self) {
        self.workouts = ResourceState::Loading;
        match self.client.list_workouts(&self.query).await {
            Ok(page) => {
                self.total = page.total;
                self.workouts = ResourceState::Loaded(page.items);
            }
            Err(e) => self.workouts = ResourceState::Error(e.to_string()),
        }
    }

    pub async fn set_range(&mut self, query: RangeQuery) {
        self.query = query;
        self.load().await;
    }

    pub async fn create(&mut self, form: &WorkoutForm) -> ClientResult<Workout> {
        let input = form.to_input()?;
        let workout = self.client.create_workout(&input).await?;
        self.load().await;
        Ok(workout)
    }

    /// End a workout; `None` lets the server stamp the current time.
    pub async fn end(&mut self, id: &str, ended_at: Option<DateTime<Utc>>) -> ClientResult<Workout> {
        let workout = self.client.end_workout(id, ended_at).await?;
        self.replace(&workout);
        Ok(workout)
    }

    pub async fn update(&mut self, id: &str, patch: &UpdateWorkout) -> ClientResult<Workout> {
        let workout = self.client.update_workout(id, patch).await?;
        self.replace(&workout);
        Ok(workout)
    }

    /// Delete a workout and forget everything cached about it.
    pub async fn delete(&mut self, id: &str) -> ClientResult<()> {
        self.client.delete_workout(id).await?;
        if let Some(workouts) = self.workouts.data_mut() {
            let before = workouts.len();
            workouts.retain(|w| w.id != id);
            self.total -= (before - workouts.len()) as i64;
        }
        self.details.remove(id);
        self.expanded.remove(id);
        Ok(())
    }

    /// Expand or collapse a workout. The first expansion fetches its detail;
    /// later ones reuse the cache. Returns whether the workout is now expanded.
    pub async fn toggle(&mut self, id: &str) -> ClientResult<bool> {
        if self.expanded.remove(id) {
            return Ok(false);
        }
        if !self.details.contains_key(id) {
            self.refresh_detail(id).await?;
        }
        self.expanded.insert(id.to_string());
        Ok(true)
    }

    /// Re-fetch a workout's detail, replacing any cached copy.
    pub async fn refresh_detail(&mut self, id: &str) -> ClientResult<()> {
        let detail = self.client.workout_detail(id).await?;
        self.details.insert(id.to_string(), detail);
        Ok(())
    }

    pub async fn add_set(&mut self, workout_id: &str, form: &SetForm) -> ClientResult<WorkoutSet> {
        let input = form.to_input()?;
        let set = self.client.create_set(workout_id, &input).await?;
        self.refresh_detail(workout_id).await?;
        Ok(set)
    }

    pub async fn update_set(
        &mut self,
        workout_id: &str,
        set_id: &str,
        patch: &UpdateWorkoutSet,
    ) -> ClientResult<WorkoutSet> {
        let set = self.client.update_set(set_id, patch).await?;
        self.refresh_detail(workout_id).await?;
        Ok(set)
    }

    pub async fn delete_set(&mut self, workout_id: &str, set_id: &str) -> ClientResult<()> {
        self.client.delete_set(set_id).await?;
        self.refresh_detail(workout_id).await
    }

    fn replace(&mut self, workout: &Workout) {
        if let Some(entry) = self
            .workouts
            .data_mut()
            .and_then(|workouts| workouts.iter_mut().find(|w| w.id == workout.id))
        {
            *entry = workout.clone();
        }
        if let Some(detail) = self.details.get_mut(&workout.id) {
            detail.workout = workout.clone();
        }
    }
}
