pub mod auth;
pub mod data;
pub mod oauth;
pub mod schemas;
pub mod third_parties;
pub mod users;
