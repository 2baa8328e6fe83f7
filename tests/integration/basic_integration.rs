/// Basic integration tests
use habity::*;
use tempfile::tempdir;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_app_basic_workflow() {
        let dir = tempdir().expect("Failed to create temp dir");
        let app = Habity::new(DatabaseConfig::new(dir.path()));
        app.initialize().await.expect("Failed to initialize");

        let id = app
            .habits()
            .add_habit(NewHabit::named("Drink water"))
            .await
            .unwrap();
        let active = app.habits().get_active_habits().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, id);

        app.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let dir = tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig::new(dir.path().join("store"));

        let first = Habity::new(config.clone());
        first.initialize().await.unwrap();
        let id = first
            .habits()
            .add_habit(NewHabit::named("Journal"))
            .await
            .unwrap();
        first.shutdown().await.unwrap();

        // Second instance over the same file sees the committed habit
        let second = Habity::new(config);
        second.initialize().await.unwrap();
        let habit = second.habits().get_habit_by_id(id).await.unwrap();
        assert_eq!(habit.map(|h| h.name), Some("Journal".to_string()));
        second.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_service_interface() {
        let app = Habity::from_database(std::sync::Arc::new(Database::in_memory()));
        app.initialize().await.unwrap();

        // Test that the repository implements the service boundary
        let service: &dyn HabitService = app.habits();
        let id = service.add_habit(NewHabit::named("Floss")).await.unwrap();
        assert!(service.get_habit_by_id(id).await.unwrap().is_some());
    }
}
