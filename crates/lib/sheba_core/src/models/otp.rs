//! One-time code domain models.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One-time code record stored in the database.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: Uuid,
    pub phone: String,
    pub code: String,
    pub used: bool,
    pub attempts: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Whether the code is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
