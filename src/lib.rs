//! EWA Engine library crate.
//!
//! This crate computes how much of an employee's pay can be drawn
//! before payday (earned wage access).  Callers may use
//! [`engine::calculate`] directly with a [`country::CountryConfig`],
//! resolve countries through a [`country::CountryRegistry`] with
//! [`engine::quote`], or embed the HTTP API via [`api::build_router`].

pub mod api;
pub mod country;
pub mod engine;
pub mod error;
pub mod models;
pub mod settings;
pub mod tax;
pub mod telemetry;

pub use country::{CountryConfig, CountryRegistry};
pub use engine::{calculate, quote, quote_batch};
pub use error::{CalcError, ConfigError};
pub use models::{CalculationRequest, CalculationResult};
