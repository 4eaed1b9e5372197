//! coursebook-core: domain model, registry, and grade reporting.
//!
//! This crate owns every user, course, and assessment and enforces the
//! cross-entity rules (unique emails, consistent enrollment, score ranges).
//! The `coursebook` CLI is a thin caller of [`registry::Registry`].

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod report;
pub mod statistics;
pub mod traits;

pub use error::{RegistryError, RegistryResult};
pub use registry::Registry;
