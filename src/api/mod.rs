//! # API Module
//!
//! Request handling logic kept apart from the HTTP layer in [`crate::front`].
//!
//! ## Modules
//!
//! - [`health`] - Service status report
//! - [`otp`] - OTP request validation and delivery

pub mod health;
pub mod otp;
