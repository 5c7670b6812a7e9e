//! Seeder CLI tests — flows that need no running database.

use assert_cmd::Command;
use predicates::prelude::*;

const USERS_HEADER: &str = "user_id,name,phone,preferred_language,city,postal_code,signup_date,last_active,device_type,opt_in_notifications,timezone";

fn seeder() -> Command {
    let mut cmd = Command::cargo_bin("sheba_seeder").expect("binary");
    // Keep ambient configuration out of the tests.
    cmd.env_remove("DATABASE_URL");
    cmd
}

#[test]
fn dry_run_reports_counts_and_touches_no_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("users.csv"),
        format!(
            "{USERS_HEADER}\n\
             b9c7d1a0-0000-4000-8000-000000000001,Karim,+8801712345678,bn,Dhaka,12345,2025-01-01T00:00:00.000Z,2025-06-01T00:00:00.000Z,mobile,true,Asia/Dhaka\n\
             b9c7d1a0-0000-4000-8000-000000000002,Rahima,+8801712345679,en,Khulna,54321,2025-02-01T00:00:00.000Z,2025-07-01T00:00:00.000Z,web,false,Asia/Dhaka\n"
        ),
    )
    .expect("write csv");

    seeder()
        .arg("--dry-run")
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("users.csv: rows=2"))
        .stdout(predicate::str::contains("workers.csv: not found"))
        .stdout(predicate::str::contains("Dry-run complete. No DB changes made."));
}

#[test]
fn missing_data_dir_exits_2() {
    seeder()
        .arg("--dir")
        .arg("/definitely/not/a/real/dir")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Data directory not found"));
}

#[test]
fn missing_connection_url_exits_3() {
    let dir = tempfile::tempdir().expect("tempdir");
    seeder()
        .arg("--dir")
        .arg(dir.path())
        .assert()
        .code(3)
        .stdout(predicate::str::contains("No connection URL provided"));
}

#[test]
fn mismatched_database_name_exits_4() {
    let dir = tempfile::tempdir().expect("tempdir");
    seeder()
        .arg("--dir")
        .arg(dir.path())
        .args(["--database-url", "postgres://localhost:5432/production"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("Refusing to seed"));
}
