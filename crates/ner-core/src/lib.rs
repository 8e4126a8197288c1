//! Core building blocks for the NER service.
//!
//! This crate holds everything the model and server crates share:
//!
//! - **Settings**: layered configuration (TOML files + environment) with
//!   fail-fast validation
//! - **CoreError**: the error taxonomy surfaced at the service boundary
//! - **Entity**: the extracted-span record returned by predictions
//! - **EntityPredictor**: the trait seam between HTTP handlers and the
//!   model implementation

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::Settings;
pub use error::{CoreError, CoreResult};
pub use traits::EntityPredictor;
pub use types::Entity;
