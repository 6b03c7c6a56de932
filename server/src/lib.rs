// Life of a request:
// 1. CORS and tracing layers
// 2. For protected routes, `require_auth` verifies the bearer token and
//    attaches the caller's identity
// 3. The handler validates input and calls the database
//    - Reads share the collections lock
//    - Updates and deletes are conditioned on id AND owner under one write lock
//    - Committed writes are flushed to the JSON snapshot
// 4. Errors render as `{"error", "code"}` with a fixed status per kind
//
// System components:
//  - Token codec and password digests
//  - In-memory document store with snapshot persistence
//  - Local image store

pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod routes;
pub mod storage;
pub mod time;
pub mod types;

#[cfg(test)]
mod e2e_tests;

pub use routes::{AppState, router};
