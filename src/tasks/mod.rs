//! # Tasks Module
//!
//! Per-user task records: create, list, get, partial update, delete. Every
//! operation takes the caller's validated identity as an explicit AuthedUser
//! parameter and scopes the query to records owned by that identity.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::tasks_routes;
