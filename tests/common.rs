#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{TimeZone, Utc};
use rattendance::core::business::{add_member, create_business, upsert_user};
use rattendance::core::join_code::JoinCodePolicy;
use rattendance::db::pool::DbPool;
use rattendance::models::member::{Role, User};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rat() -> Command {
    cargo_bin_cmd!("rattendance")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Write `content` to a temp file and return its path
pub fn temp_file(name: &str, content: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(name);
    fs::write(&path, content).expect("write temp file");
    path.to_string_lossy().to_string()
}

/// Epoch seconds of a UTC wall-clock time
pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .timestamp()
}

/// In-memory store with one business and the given members (role `user`).
/// User ids double as names; emails are `<id>@example.org`.
pub fn business_with_members(members: &[&str]) -> (DbPool, i64) {
    let mut pool = DbPool::in_memory().expect("in-memory db");
    let b = create_business(&mut pool, "Chess Club", false, None, &JoinCodePolicy::default())
        .expect("create business");
    for id in members {
        upsert_user(
            &pool.conn,
            &User::new(id, &format!("{id}@example.org"), id),
        )
        .expect("upsert user");
        add_member(&mut pool, b.id, id, Role::User).expect("add member");
    }
    (pool, b.id)
}

/// Pull the value printed after `label` on some stdout line.
pub fn value_after(stdout: &str, label: &str) -> String {
    stdout
        .lines()
        .find_map(|l| l.split_once(label).map(|(_, v)| v.trim().to_string()))
        .unwrap_or_else(|| panic!("'{label}' not found in output:\n{stdout}"))
}
