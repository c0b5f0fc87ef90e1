//! Fixtures shared by the Protolink test suites.

pub mod error;
pub mod fixtures;
pub mod sandbox;

pub use error::{Result, TestInfraError};
pub use sandbox::Sandbox;
