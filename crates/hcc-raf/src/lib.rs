//! Risk adjustment factor scoring: maps diagnosis codes to condition
//! categories, applies hierarchy exclusions and sums model coefficients.

pub mod config;
pub mod error;
pub mod model;
pub mod reference;
pub mod telemetry;
