//! Install the shared exercise catalog. Safe to run repeatedly.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logbook::config::Config;
use logbook::db;
use logbook::migrations::run_migrations;
use logbook::models::ExerciseType;
use logbook::repositories::{ExerciseRepository, SharedExercise};

const SHARED_EXERCISES: &[SharedExercise] = &[
    SharedExercise {
        id: "5638ccdd-71da-4977-a53b-bc21afa04b6c",
        name: "Deadlift",
        exercise_type: ExerciseType::Strength,
        primary_muscle: "back",
    },
    SharedExercise {
        id: "6e1ee985-7bbe-45d6-b4c6-d2f7892ded8d",
        name: "Bench Press",
        exercise_type: ExerciseType::Strength,
        primary_muscle: "chest",
    },
    SharedExercise {
        id: "b9d17a4f-20ba-4983-88fb-2fefe713e132",
        name: "Lat Pulldown",
        exercise_type: ExerciseType::Strength,
        primary_muscle: "back",
    },
    SharedExercise {
        id: "d2aa8df7-d422-4f87-b103-dd10ef9b1838",
        name: "Shoulder Press",
        exercise_type: ExerciseType::Strength,
        primary_muscle: "shoulders",
    },
    SharedExercise {
        id: "de1ed478-9973-4c7c-b623-f4562f11e29e",
        name: "Back Squat",
        exercise_type: ExerciseType::Strength,
        primary_muscle: "legs",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logbook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let inserted = ExerciseRepository::new(pool)
        .seed_shared(SHARED_EXERCISES)
        .await?;
    tracing::info!(
        "Seeded {} of {} shared exercises",
        inserted,
        SHARED_EXERCISES.len()
    );
    Ok(())
}
