//! API Module
//!
//! HTTP handlers and routing for the cache JSON API.
//!
//! # Endpoints
//! - `PUT /cache` - Store a JSON value
//! - `GET /cache/:key` - Retrieve a value by key
//! - `DELETE /cache/:key` - Remove a key
//! - `DELETE /cache` - Clear the cache
//! - `POST /cache/cleanup` - Sweep expired entries now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
