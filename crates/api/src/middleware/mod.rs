//! Request extractors for the two kinds of callers.
//!
//! - [`auth::AuthUser`] -- a resource owner identified by an authentication
//!   token (cookie or query parameter).
//! - [`auth::bearer_token`] -- a third party's authorization token from the
//!   `Authorization` header.

pub mod auth;
