/// Habit repository behavior against an initialized on-disk store
use std::time::Duration;

use chrono::NaiveDate;
use habity::*;
use tempfile::{tempdir, TempDir};

async fn setup() -> (TempDir, Habity) {
    let dir = tempdir().expect("Failed to create temp dir");
    let app = Habity::new(DatabaseConfig::new(dir.path()));
    app.initialize().await.expect("Failed to initialize");
    (dir, app)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_added_habit_has_store_defaults() {
    let (_dir, app) = setup().await;

    let id = app
        .habits()
        .add_habit(NewHabit::named("Drink water"))
        .await
        .unwrap();
    assert!(id > 0);

    let habit = app.habits().get_habit_by_id(id).await.unwrap().unwrap();
    assert_eq!(habit.color, "#007AFF");
    assert_eq!(habit.frequency, Frequency::Daily);
    assert_eq!(habit.target_days, 1);
    assert!(habit.is_active);
}

#[tokio::test]
async fn test_update_changes_only_supplied_fields() {
    let (_dir, app) = setup().await;
    let habits = app.habits();

    let id = habits
        .add_habit(NewHabit {
            name: "Drink water".to_string(),
            description: Some("Eight glasses".to_string()),
            icon: Some("💧".to_string()),
            ..NewHabit::default()
        })
        .await
        .unwrap();
    let before = habits.get_habit_by_id(id).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let changes = HabitChanges {
        name: Some("Drink more water".to_string()),
        ..HabitChanges::default()
    };
    assert!(habits.update_habit(id, changes).await.unwrap());

    let after = habits.get_habit_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.name, "Drink more water");
    assert_eq!(after.description, before.description);
    assert_eq!(after.color, before.color);
    assert_eq!(after.icon, before.icon);
    assert_eq!(after.frequency, before.frequency);
    assert_eq!(after.target_days, before.target_days);
    assert_eq!(after.is_active, before.is_active);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_every_mutation_advances_updated_at() {
    let app = Habity::from_database(std::sync::Arc::new(Database::in_memory()));
    app.initialize().await.unwrap();
    let habits = app.habits();

    // No pauses: several writes routinely land in the same millisecond
    for round in 0..100 {
        let id = habits
            .add_habit(NewHabit::named(format!("Habit {}", round)))
            .await
            .unwrap();
        let added = habits.get_habit_by_id(id).await.unwrap().unwrap();

        let changes = HabitChanges {
            name: Some(format!("Renamed {}", round)),
            ..HabitChanges::default()
        };
        assert!(habits.update_habit(id, changes).await.unwrap());
        let renamed = habits.get_habit_by_id(id).await.unwrap().unwrap();

        assert!(habits.deactivate_habit(id).await.unwrap());
        let archived = habits.get_habit_by_id(id).await.unwrap().unwrap();

        assert!(renamed.updated_at > added.updated_at);
        assert!(archived.updated_at > renamed.updated_at);
        assert_eq!(archived.created_at, added.created_at);
    }
}

#[tokio::test]
async fn test_update_can_clear_nullable_fields() {
    let (_dir, app) = setup().await;
    let habits = app.habits();

    let id = habits
        .add_habit(NewHabit {
            name: "Sketch".to_string(),
            description: Some("One page".to_string()),
            ..NewHabit::default()
        })
        .await
        .unwrap();

    let changes = HabitChanges {
        description: Some(None),
        frequency: Some(Frequency::Monthly),
        ..HabitChanges::default()
    };
    assert!(habits.update_habit(id, changes).await.unwrap());

    let habit = habits.get_habit_by_id(id).await.unwrap().unwrap();
    assert!(habit.description.is_none());
    assert_eq!(habit.frequency, Frequency::Monthly);
}

#[tokio::test]
async fn test_deactivated_habit_leaves_active_list() {
    let (_dir, app) = setup().await;
    let habits = app.habits();

    let keep = habits.add_habit(NewHabit::named("Walk")).await.unwrap();
    let archived_id = habits.add_habit(NewHabit::named("Smoke less")).await.unwrap();

    assert!(habits.deactivate_habit(archived_id).await.unwrap());

    let active: Vec<HabitId> = habits
        .get_active_habits()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(active, vec![keep]);

    let archived = habits.get_habit_by_id(archived_id).await.unwrap().unwrap();
    assert!(!archived.is_active);
}

#[tokio::test]
async fn test_active_habits_are_newest_first() {
    let (_dir, app) = setup().await;
    let habits = app.habits();

    let mut ids = Vec::new();
    for name in ["One", "Two", "Three"] {
        ids.push(habits.add_habit(NewHabit::named(name)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    ids.reverse();

    let listed: Vec<HabitId> = habits
        .get_active_habits()
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_one_log_per_habit_per_day() {
    let (_dir, app) = setup().await;
    let habits = app.habits();
    let id = habits.add_habit(NewHabit::named("Run")).await.unwrap();

    habits
        .log_completion(NewHabitLog::new(id, date(2026, 6, 1)))
        .await
        .unwrap();
    let err = habits
        .log_completion(NewHabitLog::new(id, date(2026, 6, 1)))
        .await
        .unwrap_err();

    assert_eq!(err.action(), "log completion");
    assert_eq!(
        err.storage_error().sqlite_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );

    // A different day is fine
    habits
        .log_completion(NewHabitLog::new(id, date(2026, 6, 2)))
        .await
        .unwrap();
    assert_eq!(habits.get_logs_for_habit(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_log_requires_existing_habit() {
    let (_dir, app) = setup().await;

    let err = app
        .habits()
        .log_completion(NewHabitLog::new(4242, date(2026, 6, 1)))
        .await
        .unwrap_err();
    assert_eq!(
        err.storage_error().sqlite_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    );
    assert_eq!(app.database().transaction_depth().await, 0);
}

#[tokio::test]
async fn test_deleting_habit_cascades_to_logs() {
    let (_dir, app) = setup().await;
    let habits = app.habits();
    let id = habits.add_habit(NewHabit::named("Run")).await.unwrap();
    habits
        .log_completion(NewHabitLog::new(id, date(2026, 6, 1)).with_notes("easy pace"))
        .await
        .unwrap();

    // Hard deletes are not part of the service; go through the store directly
    let db = app.database();
    db.execute(
        "DELETE FROM habits WHERE id = ?1",
        &[rusqlite::types::Value::from(id)],
    )
    .await
    .unwrap();

    assert!(habits.get_logs_for_habit(id).await.unwrap().is_empty());
}
