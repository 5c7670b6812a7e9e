//! CSV seeding pipeline.
//!
//! Bulk-loads `users.csv`, `workers.csv`, `bookings.csv`, and `events.csv`
//! from a directory into the marketplace tables. Inserts go in fixed-size
//! batches with `ON CONFLICT DO NOTHING`; a failing batch statement is
//! retried row-at-a-time so one bad row cannot abort the rest of its batch.
//! Per-collection inserted/error counts are reported, and failures never
//! abort the pipeline.

pub mod rows;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use self::rows::{BookingDoc, EventDoc, UserDoc, WorkerDoc};

/// Seeding errors (fatal for the run; batch-level failures are counted, not raised).
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

/// Collections the pipeline knows about, in load order.
pub const COLLECTIONS: [&str; 4] = ["users", "workers", "bookings", "events"];

/// Default number of documents per insert statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Source files, paired with their collection names.
const TARGETS: [(&str, &str); 4] = [
    ("users.csv", "users"),
    ("workers.csv", "workers"),
    ("bookings.csv", "bookings"),
    ("events.csv", "events"),
];

/// Options for a seeding run.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Directory containing the CSV files.
    pub data_dir: PathBuf,
    /// Documents per insert statement.
    pub batch_size: usize,
    /// Collection allow-list (lowercase names); `None` loads everything.
    pub only: Option<Vec<String>>,
    /// Truncate the target tables before inserting.
    pub drop: bool,
}

/// Outcome of loading one collection.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub collection: String,
    /// Rows parsed from the CSV.
    pub rows: usize,
    pub inserted: u64,
    /// Mapping failures plus insert failures.
    pub errors: u64,
}

/// Outcome of a dry-run scan of one CSV file.
#[derive(Debug, Clone)]
pub struct DryRunReport {
    pub file: String,
    pub found: bool,
    pub rows: usize,
    /// Up to `sample_size` raw rows, comma-joined for display.
    pub sample: Vec<String>,
}

/// Run the pipeline: optional truncate, per-collection load, index creation.
pub async fn run(pool: &PgPool, opts: &SeedOptions) -> Result<Vec<CollectionReport>, SeedError> {
    if opts.drop {
        log::info!("Truncating collections: {}", COLLECTIONS.join(", "));
        truncate_collections(pool).await?;
    }

    let mut reports = Vec::new();
    for (file, name) in TARGETS {
        if let Some(only) = &opts.only
            && !only.iter().any(|o| o == name)
        {
            log::info!("Skipping {name} (not in allow-list)");
            continue;
        }

        let path = opts.data_dir.join(file);
        if !path.exists() {
            log::warn!("Skipping {file} - not found at {}", path.display());
            continue;
        }

        log::info!("Inserting {name} from {file}...");
        let report = match name {
            "users" => load_users(pool, &path, opts.batch_size).await?,
            "workers" => load_workers(pool, &path, opts.batch_size).await?,
            "bookings" => load_bookings(pool, &path, opts.batch_size).await?,
            _ => load_events(pool, &path, opts.batch_size).await?,
        };
        log::info!(
            "[{}] rows={} inserted={} errors={}",
            report.collection,
            report.rows,
            report.inserted,
            report.errors
        );
        reports.push(report);
    }

    log::info!("Creating indexes...");
    create_indexes(pool).await;

    Ok(reports)
}

/// Parse every CSV and report counts plus sample rows, touching no store.
pub fn dry_run(data_dir: &Path, sample_size: usize) -> Result<Vec<DryRunReport>, SeedError> {
    let mut reports = Vec::new();
    for (file, _) in TARGETS {
        let path = data_dir.join(file);
        if !path.exists() {
            reports.push(DryRunReport {
                file: file.to_string(),
                found: false,
                rows: 0,
                sample: Vec::new(),
            });
            continue;
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut count = 0usize;
        let mut sample = Vec::new();
        for record in reader.records() {
            let record = record?;
            count += 1;
            if sample.len() < sample_size {
                sample.push(record.iter().collect::<Vec<_>>().join(","));
            }
        }
        reports.push(DryRunReport {
            file: file.to_string(),
            found: true,
            rows: count,
            sample,
        });
    }
    Ok(reports)
}

/// Empty the seeded tables. `otp_codes` is never touched.
pub async fn truncate_collections(pool: &PgPool) -> Result<(), SeedError> {
    sqlx::query("TRUNCATE TABLE users, workers, bookings, events")
        .execute(pool)
        .await?;
    Ok(())
}

/// Create the supporting indexes. Failures are logged, not fatal.
pub async fn create_indexes(pool: &PgPool) {
    const INDEXES: [&str; 7] = [
        "CREATE INDEX IF NOT EXISTS users_phone_idx ON users (phone)",
        "CREATE INDEX IF NOT EXISTS bookings_user_id_idx ON bookings (user_id)",
        "CREATE INDEX IF NOT EXISTS bookings_worker_id_idx ON bookings (worker_id)",
        "CREATE INDEX IF NOT EXISTS bookings_created_time_idx ON bookings (created_time DESC)",
        "CREATE INDEX IF NOT EXISTS events_user_id_idx ON events (user_id)",
        "CREATE INDEX IF NOT EXISTS events_timestamp_idx ON events (\"timestamp\" DESC)",
        "CREATE INDEX IF NOT EXISTS events_status_idx ON events (status)",
    ];

    for sql in INDEXES {
        if let Err(e) = sqlx::query(sql).execute(pool).await {
            log::warn!("Index creation issue: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Per-collection loaders
// ---------------------------------------------------------------------------

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SeedError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for result in reader.deserialize() {
        out.push(result?);
    }
    Ok(out)
}

fn map_all<R, D>(
    raw: Vec<R>,
    table: &str,
    map: impl Fn(R) -> Result<D, rows::RowError>,
) -> (Vec<D>, u64) {
    let mut docs = Vec::with_capacity(raw.len());
    let mut errors = 0u64;
    for row in raw {
        match map(row) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                errors += 1;
                log::warn!("[{table}] dropping row: {e}");
            }
        }
    }
    (docs, errors)
}

/// Insert `docs` in `batch_size` chunks. A failing batch statement falls back
/// to row-at-a-time inserts so the rest of the batch still lands.
async fn insert_in_batches<D>(
    pool: &PgPool,
    table: &str,
    docs: &[D],
    batch_size: usize,
    insert: impl AsyncFn(&PgPool, &[D]) -> Result<u64, sqlx::Error>,
) -> (u64, u64) {
    let mut inserted = 0u64;
    let mut errors = 0u64;
    for batch in docs.chunks(batch_size.max(1)) {
        match insert(pool, batch).await {
            Ok(n) => inserted += n,
            Err(e) => {
                log::warn!("[{table}] batch insert failed ({e}); retrying rows individually");
                for doc in batch {
                    match insert(pool, std::slice::from_ref(doc)).await {
                        Ok(n) => inserted += n,
                        Err(e) => {
                            errors += 1;
                            log::warn!("[{table}] row insert failed: {e}");
                        }
                    }
                }
            }
        }
    }
    (inserted, errors)
}

async fn load_users(
    pool: &PgPool,
    path: &Path,
    batch_size: usize,
) -> Result<CollectionReport, SeedError> {
    let raw: Vec<rows::RawUserRow> = read_rows(path)?;
    let total = raw.len();
    let (docs, map_errors) = map_all(raw, "users", rows::map_user);
    let (inserted, insert_errors) =
        insert_in_batches(pool, "users", &docs, batch_size, insert_users).await;
    Ok(CollectionReport {
        collection: "users".into(),
        rows: total,
        inserted,
        errors: map_errors + insert_errors,
    })
}

async fn load_workers(
    pool: &PgPool,
    path: &Path,
    batch_size: usize,
) -> Result<CollectionReport, SeedError> {
    let raw: Vec<rows::RawWorkerRow> = read_rows(path)?;
    let total = raw.len();
    let (docs, map_errors) = map_all(raw, "workers", rows::map_worker);
    let (inserted, insert_errors) =
        insert_in_batches(pool, "workers", &docs, batch_size, insert_workers).await;
    Ok(CollectionReport {
        collection: "workers".into(),
        rows: total,
        inserted,
        errors: map_errors + insert_errors,
    })
}

async fn load_bookings(
    pool: &PgPool,
    path: &Path,
    batch_size: usize,
) -> Result<CollectionReport, SeedError> {
    let raw: Vec<rows::RawBookingRow> = read_rows(path)?;
    let total = raw.len();
    let (docs, map_errors) = map_all(raw, "bookings", rows::map_booking);
    let (inserted, insert_errors) =
        insert_in_batches(pool, "bookings", &docs, batch_size, insert_bookings).await;
    Ok(CollectionReport {
        collection: "bookings".into(),
        rows: total,
        inserted,
        errors: map_errors + insert_errors,
    })
}

async fn load_events(
    pool: &PgPool,
    path: &Path,
    batch_size: usize,
) -> Result<CollectionReport, SeedError> {
    let raw: Vec<rows::RawEventRow> = read_rows(path)?;
    let total = raw.len();
    let (docs, map_errors) = map_all(raw, "events", rows::map_event);
    let (inserted, insert_errors) =
        insert_in_batches(pool, "events", &docs, batch_size, insert_events).await;
    Ok(CollectionReport {
        collection: "events".into(),
        rows: total,
        inserted,
        errors: map_errors + insert_errors,
    })
}

// ---------------------------------------------------------------------------
// Multi-row inserts
// ---------------------------------------------------------------------------

async fn insert_users(pool: &PgPool, docs: &[UserDoc]) -> Result<u64, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO users (id, name, phone, preferred_language, city, postal_code, \
         signup_date, last_active, device_type, opt_in_notifications, timezone) ",
    );
    qb.push_values(docs, |mut b, d| {
        b.push_bind(d.id)
            .push_bind(&d.name)
            .push_bind(&d.phone)
            .push_bind(&d.preferred_language)
            .push_bind(&d.city)
            .push_bind(&d.postal_code)
            .push_bind(d.signup_date)
            .push_bind(d.last_active)
            .push_bind(&d.device_type)
            .push_bind(d.opt_in_notifications)
            .push_bind(&d.timezone);
    });
    qb.push(" ON CONFLICT DO NOTHING");
    Ok(qb.build().execute(pool).await?.rows_affected())
}

async fn insert_workers(pool: &PgPool, docs: &[WorkerDoc]) -> Result<u64, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO workers (id, name, phone, city, categories, primary_language, \
         literacy_level, certifications, rating, total_tasks, avg_task_time, last_active, \
         preferred_contact_method) ",
    );
    qb.push_values(docs, |mut b, d| {
        b.push_bind(d.id)
            .push_bind(&d.name)
            .push_bind(&d.phone)
            .push_bind(&d.city)
            .push_bind(&d.categories)
            .push_bind(&d.primary_language)
            .push_bind(&d.literacy_level)
            .push_bind(&d.certifications)
            .push_bind(d.rating)
            .push_bind(d.total_tasks)
            .push_bind(d.avg_task_time)
            .push_bind(d.last_active)
            .push_bind(&d.preferred_contact_method);
    });
    qb.push(" ON CONFLICT DO NOTHING");
    Ok(qb.build().execute(pool).await?.rows_affected())
}

async fn insert_bookings(pool: &PgPool, docs: &[BookingDoc]) -> Result<u64, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO bookings (id, user_id, worker_id, category, subcategory, \
         scheduled_time, created_time, status, price, tip, feedback_rating, feedback_text, \
         rework_required) ",
    );
    qb.push_values(docs, |mut b, d| {
        b.push_bind(d.id)
            .push_bind(d.user_id)
            .push_bind(d.worker_id)
            .push_bind(&d.category)
            .push_bind(&d.subcategory)
            .push_bind(d.scheduled_time)
            .push_bind(d.created_time)
            .push_bind(&d.status)
            .push_bind(d.price)
            .push_bind(d.tip)
            .push_bind(d.feedback_rating)
            .push_bind(&d.feedback_text)
            .push_bind(d.rework_required);
    });
    qb.push(" ON CONFLICT DO NOTHING");
    Ok(qb.build().execute(pool).await?.rows_affected())
}

async fn insert_events(pool: &PgPool, docs: &[EventDoc]) -> Result<u64, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO events (id, user_id, page, time_spent, \"timestamp\", metadata) ",
    );
    qb.push_values(docs, |mut b, d| {
        b.push_bind(d.id)
            .push_bind(d.user_id)
            .push_bind(&d.page)
            .push_bind(d.time_spent)
            .push_bind(d.timestamp)
            .push_bind(&d.metadata);
    });
    qb.push(" ON CONFLICT DO NOTHING");
    Ok(qb.build().execute(pool).await?.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(name)).expect("create csv");
        f.write_all(contents.as_bytes()).expect("write csv");
    }

    #[test]
    fn dry_run_counts_rows_and_flags_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "users.csv",
            "user_id,name,phone,preferred_language,city,postal_code,signup_date,last_active,device_type,opt_in_notifications,timezone\n\
             b9c7d1a0-0000-4000-8000-000000000001,Karim,+8801712345678,bn,Dhaka,12345,2025-01-01T00:00:00.000Z,2025-06-01T00:00:00.000Z,mobile,true,Asia/Dhaka\n\
             b9c7d1a0-0000-4000-8000-000000000002,Rahima,+8801712345679,en,Khulna,54321,2025-02-01T00:00:00.000Z,2025-07-01T00:00:00.000Z,web,false,Asia/Dhaka\n",
        );

        let reports = dry_run(dir.path(), 3).expect("dry run");
        assert_eq!(reports.len(), 4);

        let users = &reports[0];
        assert_eq!(users.file, "users.csv");
        assert!(users.found);
        assert_eq!(users.rows, 2);
        assert_eq!(users.sample.len(), 2);
        assert!(users.sample[0].contains("Karim"));

        // the other three files are absent
        assert!(reports[1..].iter().all(|r| !r.found && r.rows == 0));
    }

    #[test]
    fn read_rows_maps_csv_into_typed_docs() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "workers.csv",
            "worker_id,name,phone,city,categories,primary_language,literacy_level,certifications,rating,total_tasks,avg_task_time,last_active,preferred_contact_method\n\
             b9c7d1a0-0000-4000-8000-000000000009,Salma,+8801812345678,Dhaka,cleaning|beauty,bn,high,,4.8,210,1800,2025-10-30T00:00:00.000Z,whatsapp\n",
        );

        let raw: Vec<rows::RawWorkerRow> =
            read_rows(&dir.path().join("workers.csv")).expect("read");
        let (docs, errors) = map_all(raw, "workers", rows::map_worker);
        assert_eq!(errors, 0);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].categories, ["cleaning", "beauty"]);
        assert!(docs[0].certifications.is_empty());
    }
}
