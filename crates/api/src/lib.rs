//! DSU API server library.
//!
//! Exposes configuration, state, error handling, the router and the registry
//! seeding so integration tests and the binary entrypoint share them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod registry;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
