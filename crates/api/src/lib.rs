//! HTTP API: panel fleet views, prediction history, and the human validation
//! workflow, served over the external panel backend.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
