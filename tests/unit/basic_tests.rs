/// Basic unit tests to verify core functionality
use habity::*;
use rusqlite::types::Value;
use std::path::Path;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_new_habit_defaults_are_empty() {
        let habit = NewHabit::named("Drink water");
        assert_eq!(habit.name, "Drink water");
        assert!(habit.color.is_none());
        assert!(habit.frequency.is_none());
        assert!(habit.target_days.is_none());
        assert!(habit.is_active.is_none());
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("Meditate").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn test_store_path_resolution() {
        let config = DatabaseConfig::new("/var/mobile/Library");
        assert_eq!(config.file_name, "habity.db");
        assert_eq!(config.path(), Path::new("/var/mobile/Library/habity.db"));
        assert_eq!(config.path(), resolve_path(Path::new("/var/mobile/Library"), "habity.db"));
    }

    #[test]
    fn test_static_key_provider() {
        assert_eq!(StaticKeyProvider::default().database_key(), "testkey");
        assert_eq!(StaticKeyProvider::new("s3cret").database_key(), "s3cret");
    }

    #[test]
    fn test_update_builder_touches_timestamp_only_once() {
        let changes = HabitChanges {
            target_days: Some(4),
            is_active: Some(false),
            ..HabitChanges::default()
        };

        let (sql, params) = habit_update(&changes).build("id", 10i64);
        assert!(sql.starts_with("UPDATE habits SET target_days = ?1, is_active = ?2, updated_at = "));
        assert!(sql.ends_with("WHERE id = ?3"));
        assert_eq!(sql.matches("updated_at = ").count(), 1);
        assert_eq!(
            params,
            vec![Value::Integer(4), Value::Integer(0), Value::Integer(10)]
        );
    }

    #[test]
    fn test_record_json_view() {
        let mut record = Record::new();
        record.insert("id", Value::Integer(1));
        record.insert("name", Value::Text("Read".to_string()));

        let json = record.to_json();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Read");
    }
}
