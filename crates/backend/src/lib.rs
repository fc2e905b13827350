//! `solarwatch-backend`
//!
//! **Responsibility:** everything that talks to the external panel backend.
//!
//! - `payload`: the single adapter from loosely-shaped backend JSON to
//!   [`PanelSnapshot`](solarwatch_status::PanelSnapshot) and
//!   [`PredictionRecord`](solarwatch_status::PredictionRecord).
//! - `client`: the [`PanelBackend`] trait, its error type and command shapes.
//! - `http`: reqwest implementation against the real backend.
//! - `in_memory`: demo fleet for local runs and tests.
//!
//! Credentials travel in an explicit [`SessionContext`]; nothing here caches
//! tokens.

pub mod client;
pub mod http;
pub mod in_memory;
pub mod payload;
pub mod session;

pub use client::{BackendError, CleaningCommand, PanelBackend};
pub use http::HttpPanelBackend;
pub use in_memory::InMemoryPanelBackend;
pub use payload::{AdapterError, RawPanelPayload, RawPrediction, merge_latest_prediction};
pub use session::SessionContext;
