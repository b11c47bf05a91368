//! mackerel-plugin-aws-ri-expiration crate
//!
//! This crate is an implementation detail of the `mackerel-plugin-aws-ri-expiration` tool. This crate's API is fluid
//! and may change without warning and in a semver-incompatible way.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod plugin;

#[doc(hidden)]
pub mod reservation;

#[doc(hidden)]
pub mod sources;
