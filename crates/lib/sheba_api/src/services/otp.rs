//! OTP service — code issuance and verification.

use chrono::{Duration, Utc};
use rand::{Rng, rng};
use tracing::{info, warn};

use sheba_core::auth::{jwt, password, queries as auth_queries};
use sheba_core::models::auth::DEFAULT_ROLE;
use sheba_core::otp::queries;
use sheba_core::sms::SmsSender as _;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, OtpRequestedResponse};
use crate::services::auth::build_auth_response;

/// Rate-limit window for code issuance.
const RATE_LIMIT_WINDOW_MINS: i64 = 60;

/// Generate a uniformly random 6-digit numeric code.
fn generate_code() -> String {
    rng().random_range(100_000..=999_999).to_string()
}

/// Issue a new code for `phone` and hand it to the SMS gateway.
///
/// The rate-limit check and the insert are separate statements; two
/// concurrent requests can both pass the check, overshooting the cap by at
/// most the concurrency degree.
pub async fn request_otp(state: &AppState, phone: &str) -> AppResult<OtpRequestedResponse> {
    let window_start = Utc::now() - Duration::minutes(RATE_LIMIT_WINDOW_MINS);
    let recent = queries::count_created_since(&state.pool, phone, window_start).await?;
    if recent >= state.config.otp_max_per_hour {
        return Err(AppError::RateLimited("Too many OTP requests, try later".into()));
    }

    let code = generate_code();
    let expires_at = Utc::now() + Duration::seconds(state.config.otp_ttl_secs);
    queries::create(&state.pool, phone, &code, expires_at).await?;

    // Best-effort delivery: the code counts as issued even if the gateway
    // reports a failure.
    let message = format!("Your verification code is: {code}");
    if let Err(e) = state.sms.send(phone, &message).await {
        warn!(%phone, error = %e, "SMS delivery failed");
    }

    Ok(OtpRequestedResponse {
        message: "OTP sent".into(),
        phone: phone.to_string(),
        ttl: state.config.otp_ttl_secs,
    })
}

/// Verify a code and resolve (or auto-provision) the user behind the phone.
pub async fn verify_otp(state: &AppState, phone: &str, code: &str) -> AppResult<AuthResponse> {
    let record = queries::find_latest_unused(&state.pool, phone, code)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired OTP".into()))?;

    if record.is_expired(Utc::now()) {
        // The row stays unused; cleanup of expired codes happens out-of-band.
        return Err(AppError::Unauthorized("OTP expired".into()));
    }

    queries::mark_used(&state.pool, record.id).await?;

    let user = match auth_queries::find_user_by_phone(&state.pool, phone).await? {
        Some(user) => user,
        None => {
            // First-time phone login: provision a lightweight user. The
            // password only satisfies the credential invariant and is never
            // surfaced.
            let password_hash = password::hash_password(&password::generate_password())?;
            let email = format!("{phone}@noemail.local");
            let user = auth_queries::create_user(
                &state.pool,
                phone,
                &email,
                &password_hash,
                DEFAULT_ROLE,
                phone,
            )
            .await?;
            info!(%phone, user_id = %user.id, "auto-provisioned user from OTP login");
            user
        }
    };

    let token = jwt::generate_token(
        &user.id.to_string(),
        &user.role,
        state.config.jwt_secret.as_bytes(),
    )?;
    Ok(build_auth_response(user, token))
}
