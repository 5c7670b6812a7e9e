//! # sheba_core
//!
//! Core domain logic for the Sheba marketplace backend: authentication,
//! one-time codes, SMS delivery, admin stats, and the CSV seeding pipeline.

pub mod auth;
pub mod db;
pub mod migrate;
pub mod models;
pub mod otp;
pub mod seed;
pub mod sms;
pub mod stats;
pub mod uuid;
