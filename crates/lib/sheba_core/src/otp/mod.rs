//! One-time code persistence.
//!
//! Issuance/verification policy (rate limiting, expiry handling, user
//! auto-provisioning) lives in the HTTP layer's OTP service; this module
//! owns the row-level queries.

pub mod queries;
