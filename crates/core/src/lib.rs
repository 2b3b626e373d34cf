//! Domain core of the data storage unit (DSU).
//!
//! Pure logic only: entity types, field validators, the schema validation
//! engine, authorization protocol rules, paging and column projection.
//! Nothing in this crate performs I/O; storage lives in `dsu_db` and the
//! HTTP surface in `dsu_api`.

pub mod authentication;
pub mod authorization;
pub mod data;
pub mod error;
pub mod paging;
pub mod projection;
pub mod schema;
pub mod third_party;
pub mod types;
pub mod user;
pub mod validation;
