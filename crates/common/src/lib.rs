//! Common utilities and shared types for tutorhub.
//!
//! This crate provides foundational components used across all tutorhub crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Session**: The explicit per-request caller identity via [`AuthContext`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Object storage backends for uploaded thumbnails
//!
//! # Example
//!
//! ```no_run
//! use tutorhub_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use auth::AuthContext;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, StorageBackend, UploadedFile, object_owner, owner_scoped_key,
};
