//! OneLead CRM API Library
//!
//! CRUD endpoints over two document collections, leads and activities, backed
//! by MongoDB.
//!
//! # Modules
//!
//! - `app`: Router, middleware and OpenAPI document.
//! - `config`: Configuration management.
//! - `db`: MongoDB client setup.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Lead and activity models.
//! - `serialize`: Stored document to wire JSON conversion.
//! - `storage`: Document store trait with MongoDB and in-memory backends.
//! - `validation`: Request-boundary field validation.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod serialize;
pub mod storage;
pub mod validation;
