//! # duewatch-backend
//!
//! HTTP plumbing for the duewatch dashboard: the spreadsheet-script task
//! store (list, lookup, create, update, delete) and the sensor endpoint.
//!
//! The crate knows nothing about reminders. It converts the backend's loose
//! JSON into [`TaskRecord`] and [`SensorPayload`] and reports failures as
//! [`BackendError`]; retry and scheduling policy belong to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::{BackendError, Result};
pub use types::{SensorPayload, TaskRecord};
