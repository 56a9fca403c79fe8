//! Foundation utilities shared by every scene module
//!
//! Math types and logging setup.

pub mod math;
pub mod logging;
