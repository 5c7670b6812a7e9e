//! CSV row shapes and their document mappers.
//!
//! Rows come off the CSV reader as loosely-typed strings. Mappers re-type
//! them: the source identifier column becomes the primary `id`, delimited
//! lists become ordered string sequences, and optional metrics parse
//! leniently (an unparseable optional value becomes NULL rather than a row
//! error). A present-but-unparseable identifier is a row error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// A row that could not be mapped to a document.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RowError(String);

// ---------------------------------------------------------------------------
// Raw CSV rows (all strings, headers as produced by the data generator)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawUserRow {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub preferred_language: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub signup_date: Option<String>,
    pub last_active: Option<String>,
    pub device_type: Option<String>,
    pub opt_in_notifications: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawWorkerRow {
    pub worker_id: String,
    pub name: String,
    pub phone: String,
    pub city: Option<String>,
    pub categories: Option<String>,
    pub primary_language: Option<String>,
    pub literacy_level: Option<String>,
    pub certifications: Option<String>,
    pub rating: Option<String>,
    pub total_tasks: Option<String>,
    pub avg_task_time: Option<String>,
    pub last_active: Option<String>,
    pub preferred_contact_method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawBookingRow {
    pub booking_id: String,
    pub user_id: Option<String>,
    pub worker_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub scheduled_time: Option<String>,
    pub created_time: Option<String>,
    pub status: Option<String>,
    pub price: Option<String>,
    pub tip: Option<String>,
    pub feedback_rating: Option<String>,
    pub feedback_text: Option<String>,
    pub rework_required: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEventRow {
    pub event_id: String,
    pub user_id: Option<String>,
    pub page: Option<String>,
    pub time_spent: Option<String>,
    pub timestamp: Option<String>,
    pub metadata: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed documents ready for insertion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UserDoc {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub preferred_language: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub signup_date: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
    pub device_type: Option<String>,
    pub opt_in_notifications: Option<bool>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkerDoc {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub city: Option<String>,
    pub categories: Vec<String>,
    pub primary_language: Option<String>,
    pub literacy_level: Option<String>,
    pub certifications: Vec<String>,
    pub rating: Option<f32>,
    pub total_tasks: Option<i32>,
    pub avg_task_time: Option<i32>,
    pub last_active: Option<DateTime<Utc>>,
    pub preferred_contact_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingDoc {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub worker_id: Option<Uuid>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub created_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub price: Option<i32>,
    pub tip: Option<i32>,
    pub feedback_rating: Option<i32>,
    pub feedback_text: Option<String>,
    pub rework_required: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct EventDoc {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub page: Option<String>,
    pub time_spent: Option<i32>,
    pub timestamp: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Mappers
// ---------------------------------------------------------------------------

pub fn map_user(raw: RawUserRow) -> Result<UserDoc, RowError> {
    Ok(UserDoc {
        id: parse_id(&raw.user_id, "user_id")?,
        name: raw.name,
        phone: raw.phone,
        preferred_language: non_empty(raw.preferred_language),
        city: non_empty(raw.city),
        postal_code: non_empty(raw.postal_code),
        signup_date: opt_timestamp(raw.signup_date.as_deref()),
        last_active: opt_timestamp(raw.last_active.as_deref()),
        device_type: non_empty(raw.device_type),
        opt_in_notifications: opt_bool(raw.opt_in_notifications.as_deref()),
        timezone: non_empty(raw.timezone),
    })
}

pub fn map_worker(raw: RawWorkerRow) -> Result<WorkerDoc, RowError> {
    Ok(WorkerDoc {
        id: parse_id(&raw.worker_id, "worker_id")?,
        name: raw.name,
        phone: raw.phone,
        city: non_empty(raw.city),
        categories: raw.categories.as_deref().map(split_list).unwrap_or_default(),
        primary_language: non_empty(raw.primary_language),
        literacy_level: non_empty(raw.literacy_level),
        certifications: raw
            .certifications
            .as_deref()
            .map(split_list)
            .unwrap_or_default(),
        rating: opt_parse(raw.rating.as_deref()),
        total_tasks: opt_parse(raw.total_tasks.as_deref()),
        avg_task_time: opt_parse(raw.avg_task_time.as_deref()),
        last_active: opt_timestamp(raw.last_active.as_deref()),
        preferred_contact_method: non_empty(raw.preferred_contact_method),
    })
}

pub fn map_booking(raw: RawBookingRow) -> Result<BookingDoc, RowError> {
    Ok(BookingDoc {
        id: parse_id(&raw.booking_id, "booking_id")?,
        user_id: opt_id(raw.user_id.as_deref(), "user_id")?,
        worker_id: opt_id(raw.worker_id.as_deref(), "worker_id")?,
        category: non_empty(raw.category),
        subcategory: non_empty(raw.subcategory),
        scheduled_time: opt_timestamp(raw.scheduled_time.as_deref()),
        created_time: opt_timestamp(raw.created_time.as_deref()),
        status: non_empty(raw.status),
        price: opt_parse(raw.price.as_deref()),
        tip: opt_parse(raw.tip.as_deref()),
        feedback_rating: opt_parse(raw.feedback_rating.as_deref()),
        feedback_text: non_empty(raw.feedback_text),
        rework_required: opt_bool(raw.rework_required.as_deref()),
    })
}

pub fn map_event(raw: RawEventRow) -> Result<EventDoc, RowError> {
    Ok(EventDoc {
        id: parse_id(&raw.event_id, "event_id")?,
        user_id: opt_id(raw.user_id.as_deref(), "user_id")?,
        page: non_empty(raw.page),
        time_spent: opt_parse(raw.time_spent.as_deref()),
        timestamp: opt_timestamp(raw.timestamp.as_deref()),
        metadata: raw.metadata.as_deref().and_then(parse_metadata),
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Split a pipe- or comma-delimited list into trimmed, non-empty entries,
/// preserving order.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(['|', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_id(value: &str, field: &str) -> Result<Uuid, RowError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| RowError(format!("{field}: not a UUID: {value:?}")))
}

fn opt_id(value: Option<&str>, field: &str) -> Result<Option<Uuid>, RowError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_id(v, field).map(Some),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn opt_parse<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

fn opt_bool(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

fn opt_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.and_then(|v| {
        DateTime::parse_from_rfc3339(v.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Metadata cells hold JSON documents; anything unparseable is kept verbatim
/// as a JSON string so nothing is silently discarded.
fn parse_metadata(value: &str) -> Option<serde_json::Value> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(trimmed)
            .unwrap_or_else(|_| serde_json::Value::String(trimmed.to_string())),
    )
}
