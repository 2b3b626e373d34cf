//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`session`] -- the authentication-token cookie.
//! - [`client`] -- third-party credential checks.

pub mod client;
pub mod password;
pub mod session;
