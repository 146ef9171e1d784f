//! API layer for HTTP request handling and data models.
//!
//! This module contains the HTTP surface of the service, organized into:
//!
//! - **[`extract`]**: Axum extractors for the client session and request metadata
//! - **[`handlers`]**: Axum route handlers for the scope endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Every authentication scope gets the same endpoint family under its own
//! path segment:
//!
//! - `GET /{scope}/sign_in` - resolve and report the sign-in view
//! - `POST /{scope}/sign_in` - authenticate a principal into the scope
//! - `ANY /{scope}/sign_out` - sign out, gated by the scope's method set
//! - `GET /{scope}/session` - session status for the scope
//! - `GET /{scope}/account` - example scope-protected resource

pub mod extract;
pub mod handlers;
pub mod models;
