pub mod auth;
pub mod body_metrics;
pub mod exercises;
pub mod health;
pub mod todos;
pub mod workouts;
