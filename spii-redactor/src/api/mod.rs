//! API layer for HTTP request handling.
//!
//! - **[`handlers`]**: Axum route handlers for the upload gateway
//!
//! # HTTP Surface
//!
//! - `GET /` - landing page with the upload form
//! - `POST /upload` - multipart upload, dispatch to the processing engine
//! - `GET /uploads/{filename}` - stored originals referenced by the results page
//! - `GET /static/{path}` - embedded assets
//! - `GET /healthz` - liveness check

pub mod handlers;
