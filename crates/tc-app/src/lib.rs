//! Tank registry and session layer for tankcal.
//!
//! This crate owns the tanks, keeps each tank's dataset, model and the on-disk
//! registry document in step, and exposes the small verb surface front ends
//! call into through [`Session`].

pub mod config;
pub mod error;
pub mod input;
pub mod registry;
pub mod session;
pub mod tank;

// Re-export key types for convenience
pub use config::SessionConfig;
pub use error::{AppError, AppResult};
pub use input::IntoValues;
pub use registry::TankRegistry;
pub use session::Session;
pub use tank::{Dataset, Tank, TankInfo, TankSummary};
pub use tc_calib::{FitMetrics, ModelKind, ModelPreference, TrainerConfig};
pub use tc_store::DEFAULT_TANK_ID;
