use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{rat, setup_test_db, temp_file, value_after};

fn init(db: &str) {
    rat()
        .args(["--db", db, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));
}

/// Business #1 with users ann and bob as members.
fn init_club(db: &str) {
    init(db);
    rat()
        .args(["--db", db, "user", "ann", "--email", "ann@example.org", "--name", "Ann"])
        .assert()
        .success();
    rat()
        .args(["--db", db, "user", "bob", "--email", "bob@example.org", "--name", "Bob"])
        .assert()
        .success();
    rat()
        .args(["--db", db, "business", "Chess Club", "--owner", "ann"])
        .assert()
        .success()
        .stdout(contains("Business #1 'Chess Club' created."))
        .stdout(contains("Join code:"));
    rat()
        .args(["--db", db, "member", "-b", "1", "bob"])
        .assert()
        .success()
        .stdout(contains("bob is now user of business #1."));
}

#[test]
fn recurring_event_is_listed_and_deleted_by_scope() {
    let db = setup_test_db("cli_recurring");
    init_club(&db);

    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Practice",
            "--start",
            "2025-09-01 18:00",
            "--end",
            "2025-09-01 19:00",
            "--repeat",
            "weekly",
            "--days",
            "mon,wed",
            "--until",
            "2025-09-14",
        ])
        .assert()
        .success()
        .stdout(contains("Created 4 occurrence(s) of 'Practice'"));

    rat()
        .args(["--db", &db, "list", "-b", "1"])
        .assert()
        .success()
        .stdout(contains("2025-09-01 18:00"))
        .stdout(contains("2025-09-10 18:00"));

    rat()
        .args(["--db", &db, "del", "2", "--effect", "2", "--yes"])
        .assert()
        .success()
        .stdout(contains("3 event(s) deleted."));

    rat()
        .args(["--db", &db, "list", "-b", "1"])
        .assert()
        .success()
        .stdout(contains("2025-09-01 18:00").and(contains("2025-09-03").not()));
}

#[test]
fn recurring_event_without_bound_is_rejected() {
    let db = setup_test_db("cli_unbounded");
    init_club(&db);

    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Forever",
            "--start",
            "2025-09-01 18:00",
            "--end",
            "2025-09-01 19:00",
            "--repeat",
            "daily",
        ])
        .assert()
        .failure()
        .stderr(contains("needs an end date or an occurrence count"));
}

#[test]
fn scan_absent_and_status() {
    let db = setup_test_db("cli_scan");
    init_club(&db);

    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Standup",
            "--start",
            "2025-09-01 09:00",
            "--end",
            "2025-09-01 10:00",
        ])
        .assert()
        .success()
        .stdout(contains("Event #1 'Standup' created."));

    rat()
        .args(["--db", &db, "scan", "1", "bob", "--at", "2025-09-01 09:45"])
        .assert()
        .success()
        .stdout(contains("bob checked in to event #1"));

    rat()
        .args(["--db", &db, "scan", "1", "mallory", "--at", "2025-09-01 09:45"])
        .assert()
        .failure()
        .stderr(contains("member not found"));

    rat()
        .args([
            "--db", &db, "status", "-b", "1", "ann", "--at", "2025-09-01 09:30",
        ])
        .assert()
        .success()
        .stdout(contains("N/A"));

    rat()
        .args([
            "--db", &db, "status", "-b", "1", "ann", "--at", "2025-09-01 10:01",
        ])
        .assert()
        .success()
        .stdout(contains("ABSENT"));

    rat()
        .args([
            "--db", &db, "status", "-b", "1", "bob", "--at", "2025-09-01 10:01",
        ])
        .assert()
        .success()
        .stdout(contains("PRESENT"));

    rat()
        .args(["--db", &db, "absent", "1", "ann"])
        .assert()
        .success()
        .stdout(contains("Notify business 1: ann will miss 'Standup'"));

    rat()
        .args([
            "--db", &db, "stats", "-b", "1", "--json", "--at", "2025-09-02 00:00",
        ])
        .assert()
        .success()
        .stdout(contains("\"user_id\": \"bob\""))
        .stdout(contains("\"present\": 1"));
}

#[test]
fn alter_reports_failures_per_item() {
    let db = setup_test_db("cli_alter");
    init_club(&db);

    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Meet",
            "--start",
            "2025-09-01 09:00",
            "--end",
            "2025-09-01 10:00",
        ])
        .assert()
        .success();

    rat()
        .args([
            "--db",
            &db,
            "alter",
            "--events",
            "1,99",
            "--users",
            "ann,bob",
            "--status",
            "excused",
        ])
        .assert()
        .success()
        .stdout(contains("2 record(s) set to"))
        .stdout(contains("2 failed."));

    rat()
        .args([
            "--db", &db, "alter", "--events", "1", "--users", "ann", "--status", "n/a",
        ])
        .assert()
        .failure()
        .stderr(contains("cannot be stored"));
}

#[test]
fn join_code_rotation_and_join() {
    let db = setup_test_db("cli_join");
    init_club(&db);
    rat()
        .args(["--db", &db, "user", "zoe", "--email", "zoe@example.org", "--name", "Zoe"])
        .assert()
        .success();

    let out = rat()
        .args(["--db", &db, "join-code", "-b", "1"])
        .output()
        .unwrap();
    let old = value_after(&String::from_utf8_lossy(&out.stdout), "business #1:");

    let out = rat()
        .args(["--db", &db, "join-code", "-b", "1", "--rotate"])
        .output()
        .unwrap();
    let new = value_after(&String::from_utf8_lossy(&out.stdout), "business #1:");
    assert_ne!(old, new);

    rat()
        .args(["--db", &db, "join", &old, "zoe"])
        .assert()
        .failure()
        .stderr(contains("join code not found"));

    rat()
        .args(["--db", &db, "join", &new, "zoe"])
        .assert()
        .success()
        .stdout(contains("zoe joined business #1."));

    rat()
        .args(["--db", &db, "join", &new, "zoe"])
        .assert()
        .success()
        .stdout(contains("already a member"));
}

#[test]
fn scan_code_gates_scans() {
    let db = setup_test_db("cli_scan_code");
    init_club(&db);
    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Class",
            "--start",
            "2025-09-01 09:00",
            "--end",
            "2025-09-01 10:00",
        ])
        .assert()
        .success();

    let out = rat()
        .args(["--db", &db, "scan-code", "-b", "1", "--at", "2025-09-01 08:58"])
        .output()
        .unwrap();
    let code = value_after(&String::from_utf8_lossy(&out.stdout), "Scan code:");
    assert_eq!(code.len(), 64);

    rat()
        .args([
            "--db", &db, "scan", "1", "bob", "--code", &code, "--at", "2025-09-01 09:01",
        ])
        .assert()
        .success()
        .stdout(contains("PRESENT"));

    rat()
        .args([
            "--db", &db, "scan", "1", "ann", "--code", &code, "--at", "2025-09-01 09:10",
        ])
        .assert()
        .failure()
        .stderr(contains("scan code not found"));
}

#[test]
fn import_from_file() {
    let db = setup_test_db("cli_import");
    init_club(&db);
    let csv = temp_file(
        "cli_import_members.csv",
        "email,phone\nann@example.org,555\nnobody@example.org,1\n",
    );

    rat()
        .args(["--db", &db, "import", "-b", "1", &csv, "--by", "email"])
        .assert()
        .success()
        .stdout(contains("1 row(s) updated"))
        .stdout(contains("1 error(s)"))
        .stderr(contains("no such member"));
}

#[test]
fn log_records_operations() {
    let db = setup_test_db("cli_log");
    init_club(&db);

    rat()
        .args(["--db", &db, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("migration_applied"))
        .stdout(contains("business_add"))
        .stdout(contains("member_add"));
}

#[test]
fn del_asks_before_deleting() {
    let db = setup_test_db("cli_del_prompt");
    init_club(&db);
    rat()
        .args([
            "--db",
            &db,
            "event",
            "-b",
            "1",
            "Meet",
            "--start",
            "2025-09-01 09:00",
            "--end",
            "2025-09-01 10:00",
        ])
        .assert()
        .success();

    rat()
        .args(["--db", &db, "del", "1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Operation cancelled."));

    rat()
        .args(["--db", &db, "del", "1"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(contains("1 event(s) deleted."));

    rat()
        .args(["--db", &db, "list", "-b", "1"])
        .assert()
        .success()
        .stdout(contains("No events for business #1."));
}
