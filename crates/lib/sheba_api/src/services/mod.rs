//! Service layer — orchestration between handlers and `sheba_core`.

pub mod auth;
pub mod otp;
