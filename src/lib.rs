pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use config::settings::Settings;
pub use core::reconcile::Reconciler;
pub use utils::error::{Result, YnaError};
