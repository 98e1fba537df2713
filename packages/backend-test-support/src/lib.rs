//! Backend test support utilities
//!
//! Helpers shared by the backend's unit and integration tests: logging
//! initialization, Problem Details assertions and unique fixture values.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
