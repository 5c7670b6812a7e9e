//! Authentication domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles a user can hold. The HTTP layer restricts registration to this set;
/// the store enforces it via the `user_role` enum.
pub const ALLOWED_ROLES: &[&str] = &["admin", "worker", "user"];

/// Default role for auto-provisioned and unspecified users.
pub const DEFAULT_ROLE: &str = "user";

/// Domain user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Always present on auth-created users; seeded analytics rows may lack one.
    pub email: Option<String>,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: Option<String>,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// Single role string (`admin` | `worker` | `user`).
    pub role: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}
