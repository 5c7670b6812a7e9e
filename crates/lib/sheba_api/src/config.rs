//! API server configuration.

use sheba_core::auth::jwt::resolve_jwt_secret;

/// Configuration for the API server, built once at startup and passed by
/// reference to the services that need it.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// One-time code lifetime in seconds.
    pub otp_ttl_secs: i64,
    /// Maximum OTP requests per phone per trailing hour.
    pub otp_max_per_hour: i64,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                |
    /// |--------------------|----------------------------------------|
    /// | `PORT`             | `3000`                                 |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/sheba`      |
    /// | `JWT_SECRET`       | generated & persisted to file          |
    /// | `OTP_TTL_SECS`     | `300`                                  |
    /// | `OTP_MAX_PER_HOUR` | `10`                                   |
    pub fn from_env() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", env_i64("PORT", 3000)),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/sheba".into()),
            jwt_secret: resolve_jwt_secret(),
            otp_ttl_secs: env_i64("OTP_TTL_SECS", 300),
            otp_max_per_hour: env_i64("OTP_MAX_PER_HOUR", 10),
        }
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_i64_falls_back_on_missing_or_garbage() {
        assert_eq!(env_i64("SHEBA_TEST_UNSET_VAR", 42), 42);
        // SAFETY: test-only, no concurrent env readers for this key
        unsafe { std::env::set_var("SHEBA_TEST_GARBAGE_VAR", "not-a-number") };
        assert_eq!(env_i64("SHEBA_TEST_GARBAGE_VAR", 7), 7);
    }
}
