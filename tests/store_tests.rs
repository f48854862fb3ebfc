use rattendance::config::Config;
use rattendance::db::migrate::run_pending_migrations;
use rattendance::db::ttl_store::{MemoryTtlStore, SqliteTtlStore, TtlStore};
use rattendance::errors::AppError;
use rattendance::utils::table::{Table, visible_width};
use rattendance::utils::time::{format_local, format_minutes, parse_local, parse_local_end_of_day};
use rusqlite::Connection;

#[test]
fn migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    let first = run_pending_migrations(&conn).unwrap();
    assert!(!first.is_empty());

    let second = run_pending_migrations(&conn).unwrap();
    assert!(second.is_empty());

    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(n, first.len() as i64);
}

fn expiry_contract(store: &dyn TtlStore) {
    store.set("scan:abc", "42", 300, 1_000).unwrap();
    assert_eq!(store.get("scan:abc", 1_299).unwrap().as_deref(), Some("42"));
    // expired reads look exactly like missing keys
    assert_eq!(store.get("scan:abc", 1_300).unwrap(), None);
    assert_eq!(store.get("scan:never", 1_000).unwrap(), None);
    // and the entry stays gone
    assert_eq!(store.get("scan:abc", 1_000).unwrap(), None);
}

#[test]
fn memory_store_expires_entries() {
    expiry_contract(&MemoryTtlStore::new());
}

#[test]
fn sqlite_store_expires_entries() {
    let store = SqliteTtlStore::from_connection(Connection::open_in_memory().unwrap()).unwrap();
    expiry_contract(&store);
}

#[test]
fn missing_config_fields_fall_back_to_defaults() {
    let cfg = Config::from_yaml("database: /tmp/a.sqlite\nlate_after_minutes: 10\n").unwrap();
    assert_eq!(cfg.database, "/tmp/a.sqlite");
    assert_eq!(cfg.scan_code_ttl_secs, 300);
    assert_eq!(cfg.join_code_length, 10);
    assert_eq!(cfg.join_code_retries, 5);
    assert_eq!(cfg.max_occurrences, 366);
    assert_eq!(cfg.late_after_minutes, Some(10));
}

#[test]
fn nonsense_config_values_are_rejected() {
    let err = Config::from_yaml("join_code_length: 2\n").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn config_yaml_keeps_join_code_policy() {
    let cfg = Config {
        join_code_length: 12,
        ..Config::default()
    };
    let back = Config::from_yaml(&cfg.to_yaml().unwrap()).unwrap();
    assert_eq!(back.join_code_policy().length, 12);
}

#[test]
fn colors_do_not_count_towards_width() {
    assert_eq!(visible_width("\x1b[32mPRESENT\x1b[0m"), 7);
    assert_eq!(visible_width("café"), 4);
}

#[test]
fn table_columns_are_aligned() {
    let mut t = Table::new(&["ID", "Name"]);
    t.add_row(vec!["1".into(), "Practice".into()]);
    t.add_row(vec!["12".into(), "\x1b[31mX\x1b[0m".into()]);
    let out = t.render();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID | Name");
    assert_eq!(lines[1], "---+---------");
    assert_eq!(lines[2], "1  | Practice");
}

#[test]
fn local_input_respects_offset() {
    // 2025-09-01 09:00 at UTC+02:00 is 07:00 UTC
    let utc = parse_local("2025-09-01 07:00", 0).unwrap();
    assert_eq!(parse_local("2025-09-01 09:00", 7_200).unwrap(), utc);
    assert_eq!(format_local(utc, 7_200), "2025-09-01 09:00");
}

#[test]
fn accepted_time_shapes() {
    let base = parse_local("2025-09-01", 0).unwrap();
    assert_eq!(parse_local("2025-09-01T00:00", 0).unwrap(), base);
    assert_eq!(parse_local(&format!("@{base}"), 0).unwrap(), base);
    assert_eq!(parse_local_end_of_day("2025-09-01", 0).unwrap(), base + 86_399);
    assert!(parse_local("01/09/2025", 0).unwrap_err().is_validation());
}

#[test]
fn minutes_format() {
    assert_eq!(format_minutes(90), "01:30");
    assert_eq!(format_minutes(-5), "-00:05");
}
