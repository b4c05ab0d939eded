//! Domain layer - core types, configuration model and errors.
//!
//! This layer contains plain data types without any I/O.

pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, ApplyConfig};
pub use error::{AppError, HandlerError, Result};
pub use models::{CloudConfig, JobMode, TransientUnitRequest, Unit, User};
