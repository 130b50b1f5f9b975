/*!
 * Configuration Loading Tests
 * JSON files and SCHED_* environment overrides
 */

use pretty_assertions::assert_eq;
use process_scheduler::{Config, SchedulerError};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

const OVERRIDES: [&str; 5] = [
    "SCHED_ADMISSION_INTERVAL_MS",
    "SCHED_DISPATCH_INTERVAL_MS",
    "SCHED_MONITOR_BACKOFF_MS",
    "SCHED_MEMORY_CAPACITY",
    "SCHED_PROCESSOR_CAPACITY_MS",
];

fn clear_env() {
    for key in OVERRIDES {
        std::env::remove_var(key);
    }
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "system": {{ "memory_slots": [4096], "processors": [60000], "monitor_backoff": 500 }},
            "scheduler": {{ "dispatch_interval": 250, "external_wait": {{ "min": 10, "max": 20 }} }}
        }}"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.system.memory_slots, vec![4096]);
    assert_eq!(config.system.processors, vec![Duration::from_secs(60)]);
    assert_eq!(config.system.monitor_backoff, Duration::from_millis(500));
    assert_eq!(config.scheduler.dispatch_interval, Duration::from_millis(250));
    assert_eq!(config.scheduler.external_wait.max, Duration::from_millis(20));
    assert_eq!(config.scheduler.admission_interval, Duration::from_millis(100));
}

#[test]
fn test_invalid_file_is_a_configuration_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "scheduler": {{ "admission_interval": 0 }} }}"#).unwrap();
    assert!(matches!(
        Config::from_file(file.path()),
        Err(SchedulerError::Configuration(_))
    ));

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    write!(garbage, "not json").unwrap();
    assert!(matches!(
        Config::from_file(garbage.path()),
        Err(SchedulerError::Configuration(_))
    ));
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(SchedulerError::Configuration(_))));
}

#[test]
#[serial]
fn test_env_overrides_take_precedence() {
    clear_env();
    std::env::set_var("SCHED_ADMISSION_INTERVAL_MS", "25");
    std::env::set_var("SCHED_MEMORY_CAPACITY", "4096");
    std::env::set_var("SCHED_PROCESSOR_CAPACITY_MS", "1000");

    let config = Config::default().with_env_overrides().unwrap();
    clear_env();

    assert_eq!(config.scheduler.admission_interval, Duration::from_millis(25));
    assert_eq!(config.system.memory_slots, vec![4096]);
    assert_eq!(config.system.processors, vec![Duration::from_secs(1)]);
}

#[test]
#[serial]
fn test_malformed_env_override_is_rejected() {
    clear_env();
    std::env::set_var("SCHED_DISPATCH_INTERVAL_MS", "soon");

    let result = Config::default().with_env_overrides();
    clear_env();

    assert!(matches!(result, Err(SchedulerError::Configuration(_))));
}

#[test]
#[serial]
fn test_zero_env_override_fails_validation() {
    clear_env();
    std::env::set_var("SCHED_MONITOR_BACKOFF_MS", "0");

    let result = Config::default().with_env_overrides();
    clear_env();

    assert!(matches!(result, Err(SchedulerError::Configuration(_))));
}
