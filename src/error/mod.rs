//! The unified error handling system for the gate.

pub use auth::{AuthError, StrategyError};
pub use types::GateError;

/// A unified `Result` type for the entire application.
pub type Result<T> = std::result::Result<T, GateError>;

pub mod auth;
pub mod macros;
pub mod types;
