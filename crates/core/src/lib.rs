//! Core business logic for tutorhub.
//!
//! Services sit between the HTTP layer and the repositories: they validate
//! input, generate IDs, orchestrate thumbnail uploads and shape rows into
//! response types. Authorization is always enforced again by the
//! repositories they call.

pub mod services;
pub mod validation;

pub use services::*;
